//! # Dialog Host
//!
//! Holds at most one confirmation dialog and draws it above everything
//! else. While a dialog is open it takes every key: Enter or `y`
//! confirms, Esc or `n` cancels, anything else is swallowed.

use crossterm::event::KeyCode;
use log::debug;
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::Modifier;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph};

use crate::core::theme::Theme;
use crate::tui::component::EventHandler;
use crate::tui::event::TuiEvent;

use super::centered_rect_abs;

/// What a dialog asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    ConfirmQuit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub kind: DialogKind,
    pub title: String,
    pub message: String,
}

impl Dialog {
    pub fn confirm_quit() -> Self {
        Self {
            kind: DialogKind::ConfirmQuit,
            title: "Quit Jotter?".to_string(),
            message: "Your notes are already on disk. Any sync still running is dropped \
                      and picked up again on the next start."
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogEvent {
    Confirmed(DialogKind),
    Cancelled,
}

#[derive(Debug, Default)]
pub struct DialogHost {
    current: Option<Dialog>,
}

impl DialogHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&Dialog> {
        self.current.as_ref()
    }

    /// Show `dialog` unless one is already up. Returns whether it opened.
    pub fn open(&mut self, dialog: Dialog) -> bool {
        if let Some(current) = &self.current {
            debug!("Dialog '{}' already open; dropping '{}'", current.title, dialog.title);
            return false;
        }
        self.current = Some(dialog);
        true
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let Some(dialog) = &self.current else {
            return;
        };

        let width = area.width.min(56);
        let inner_width = width.saturating_sub(4).max(1) as usize;
        let wrapped = textwrap::wrap(&dialog.message, inner_width);
        // borders + padding row + message + blank + hint
        let height = (wrapped.len() as u16 + 5).min(area.height);
        let overlay = centered_rect_abs(width, height, area);

        frame.render_widget(Clear, overlay);

        let mut lines: Vec<Line> = wrapped
            .into_iter()
            .map(|l| Line::styled(l.into_owned(), theme.surface_style()))
            .collect();
        lines.push(Line::default());
        lines.push(
            Line::styled("Enter Confirm  Esc Cancel", theme.border_style(false))
                .alignment(Alignment::Center),
        );

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style(true))
            .title(format!(" {} ", dialog.title))
            .title_style(theme.surface_style().add_modifier(Modifier::BOLD))
            .style(theme.surface_style())
            .padding(Padding::horizontal(1));

        frame.render_widget(Paragraph::new(lines).block(block), overlay);
    }
}

impl EventHandler for DialogHost {
    type Event = DialogEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<DialogEvent> {
        let TuiEvent::Key(key) = event else {
            return None;
        };
        let dialog = self.current.as_ref()?;
        let outcome = match key.code {
            KeyCode::Enter | KeyCode::Char('y') => DialogEvent::Confirmed(dialog.kind),
            KeyCode::Esc | KeyCode::Char('n') => DialogEvent::Cancelled,
            _ => return None,
        };
        self.current = None;
        Some(outcome)
    }
}

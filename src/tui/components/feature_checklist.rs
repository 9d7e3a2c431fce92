//! # Feature Checklist
//!
//! First-run cheat sheet of the shell's shortcuts. Shown on startup unless
//! `show_feature_checklist = false`; Enter or Esc dismisses it for the
//! rest of the session.

use crossterm::event::KeyCode;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph};

use crate::core::theme::Theme;
use crate::tui::component::EventHandler;
use crate::tui::event::TuiEvent;
use crate::tui::keyboard::Platform;

use super::centered_rect_abs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecklistEvent {
    Dismissed,
}

#[derive(Debug)]
pub struct FeatureChecklist {
    visible: bool,
    items: Vec<(String, &'static str)>,
}

impl FeatureChecklist {
    pub fn new(visible: bool, platform: Platform) -> Self {
        let m = platform.general_ctrl_label();
        let items = vec![
            (format!("{m}+,"), "Open or close preferences"),
            (format!("{m}+A"), "Select all (just the preview when focused)"),
            ("Tab".to_string(), "Move focus between panes"),
            ("Up/Down".to_string(), "Pick a note or scroll the preview"),
            ("Esc".to_string(), "Clear the selection"),
            (format!("{m}+Q"), "Quit"),
        ];
        Self { visible, items }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        if !self.visible {
            return;
        }

        let height = (self.items.len() as u16 + 4).min(area.height);
        let overlay = centered_rect_abs(area.width.min(58), height, area);
        frame.render_widget(Clear, overlay);

        let key_style = theme
            .surface_style()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD);
        let lines: Vec<Line> = self
            .items
            .iter()
            .map(|(keys, what)| {
                Line::from(vec![
                    Span::styled(format!("{keys:<10}"), key_style),
                    Span::styled(*what, theme.surface_style()),
                ])
            })
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style(true))
            .title(" Getting started ")
            .title_bottom(Line::from(" Enter/Esc Dismiss ").centered())
            .style(theme.surface_style())
            .padding(Padding::horizontal(1));

        frame.render_widget(Paragraph::new(lines).block(block), overlay);
    }
}

impl EventHandler for FeatureChecklist {
    type Event = ChecklistEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<ChecklistEvent> {
        let TuiEvent::Key(key) = event else {
            return None;
        };
        if !self.visible {
            return None;
        }
        match key.code {
            KeyCode::Enter | KeyCode::Esc => {
                self.visible = false;
                Some(ChecklistEvent::Dismissed)
            }
            _ => None,
        }
    }
}

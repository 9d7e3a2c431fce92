//! # Preferences Modal
//!
//! Centered panel listing the runtime preferences. Open and close it with
//! the general control key plus `,`; inside, `t` cycles the theme, `n`
//! shows or hides the navigator and Esc closes it.
//!
//! The panel is stateless: it renders the current snapshot and maps keys
//! to [`PreferencesEvent`]s for the shell to apply to the store.

use crossterm::event::KeyCode;
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph};

use crate::core::preferences::Preferences;
use crate::core::theme::{self, THEME_IDS, Theme};
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

use super::centered_rect_abs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferencesEvent {
    CycleTheme,
    ToggleNavigator,
    Close,
}

/// Key mapping for the open panel.
#[derive(Debug, Default)]
pub struct PreferencesKeys;

impl EventHandler for PreferencesKeys {
    type Event = PreferencesEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<PreferencesEvent> {
        let TuiEvent::Key(key) = event else {
            return None;
        };
        match key.code {
            KeyCode::Char('t') => Some(PreferencesEvent::CycleTheme),
            KeyCode::Char('n') => Some(PreferencesEvent::ToggleNavigator),
            KeyCode::Esc => Some(PreferencesEvent::Close),
            _ => None,
        }
    }
}

pub struct PreferencesModal<'a> {
    pub preferences: &'a Preferences,
    pub theme: &'static Theme,
    pub toggle_hint: String,
}

impl Component for PreferencesModal<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_rect_abs(area.width.min(48), area.height.min(12), area);
        frame.render_widget(Clear, overlay);

        let label = self.theme.surface_style();
        let value = self.theme.surface_style().fg(self.theme.accent);
        let muted = self.theme.surface_style().fg(self.theme.muted);

        let themes: Vec<Span> = THEME_IDS
            .iter()
            .map(|id| {
                let t = theme::resolve(id);
                if t.id == self.theme.id {
                    Span::styled(format!("[{}] ", t.label), value.add_modifier(Modifier::BOLD))
                } else {
                    Span::styled(format!("{} ", t.label), muted)
                }
            })
            .collect();

        let navigator = if self.preferences.show_top_level_navigator {
            "shown"
        } else {
            "hidden"
        };

        let lines = vec![
            Line::from(vec![
                Span::styled("Theme      ", label),
                Span::styled(self.theme.label, value),
            ]),
            Line::from(themes),
            Line::default(),
            Line::from(vec![
                Span::styled("Navigator  ", label),
                Span::styled(navigator, value),
            ]),
        ];

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(true))
            .title(" Preferences ")
            .title_alignment(Alignment::Left)
            .title_bottom(
                Line::from(format!(" t Theme  n Navigator  Esc/{} Close ", self.toggle_hint))
                    .centered(),
            )
            .style(self.theme.surface_style())
            .padding(Padding::uniform(1));

        frame.render_widget(Paragraph::new(lines).block(block), overlay);
    }
}

//! # Navigator Component
//!
//! One-line bar across the top of the main view: app name, storage
//! backend, note count and when the last full sync finished.
//!
//! Purely presentational; the shell hides it when
//! `general.showTopLevelNavigator` is off.

use chrono::{DateTime, Local, Utc};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};

use crate::core::theme::Theme;
use crate::tui::component::Component;

pub struct Navigator<'a> {
    pub storage_name: &'a str,
    pub note_count: usize,
    pub last_synced: Option<DateTime<Utc>>,
    pub theme: &'static Theme,
}

impl Navigator<'_> {
    fn sync_label(&self) -> String {
        match self.last_synced {
            Some(ts) => format!("synced {}", ts.with_timezone(&Local).format("%H:%M:%S")),
            None => "syncing…".to_string(),
        }
    }
}

impl Component for Navigator<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let muted = self.theme.base_style().fg(self.theme.muted);
        let notes = match self.note_count {
            1 => "1 note".to_string(),
            n => format!("{n} notes"),
        };
        let line = Line::from(vec![
            Span::styled(
                " Jotter ",
                self.theme
                    .base_style()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("│ ", muted),
            Span::styled(self.storage_name.to_string(), self.theme.base_style()),
            Span::styled(format!(" · {notes} · {}", self.sync_label()), muted),
        ]);
        frame.render_widget(line, area);
    }
}

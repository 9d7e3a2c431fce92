//! # Loading View
//!
//! Placeholder shown in place of the main content until storage has
//! finished initializing. Stays up indefinitely if initialization fails.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::widgets::Paragraph;

use crate::core::theme::Theme;
use crate::tui::component::Component;

pub const LOADING_TEXT: &str = "Loading Data...";

pub struct LoadingView {
    pub theme: &'static Theme,
}

impl Component for LoadingView {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [_, row, _] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Fill(1),
        ])
        .areas(area);
        let text = Paragraph::new(LOADING_TEXT)
            .style(self.theme.base_style().fg(self.theme.muted))
            .alignment(Alignment::Center);
        frame.render_widget(text, row);
    }
}

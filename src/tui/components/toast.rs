//! # Toast List
//!
//! Short-lived notices stacked in the bottom-right corner. Each toast
//! expires [`TOAST_TTL`] after it was pushed; the run loop calls
//! [`ToastList::prune`] on every tick.

use std::time::{Duration, Instant};

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::core::theme::Theme;

pub const TOAST_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
struct Toast {
    message: String,
    expires_at: Instant,
}

#[derive(Debug, Default)]
pub struct ToastList {
    toasts: Vec<Toast>,
}

impl ToastList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.push_at(message, Instant::now());
    }

    pub fn push_at(&mut self, message: impl Into<String>, now: Instant) {
        self.toasts.push(Toast {
            message: message.into(),
            expires_at: now + TOAST_TTL,
        });
    }

    /// Drop expired toasts. Returns whether anything was removed.
    pub fn prune(&mut self, now: Instant) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.expires_at > now);
        self.toasts.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.toasts.iter().map(|t| t.message.as_str())
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        // Newest at the bottom, stacking upwards.
        let mut bottom = area.y + area.height;
        for toast in self.toasts.iter().rev() {
            let height = 3;
            if bottom < area.y + height {
                break;
            }
            let width = (toast.message.width() as u16 + 4).min(area.width);
            let rect = Rect::new(
                area.x + area.width - width,
                bottom - height,
                width,
                height,
            );
            frame.render_widget(Clear, rect);
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style(true))
                .style(theme.surface_style());
            frame.render_widget(
                Paragraph::new(format!(" {}", toast.message)).block(block),
                rect,
            );
            bottom -= height;
        }
    }
}

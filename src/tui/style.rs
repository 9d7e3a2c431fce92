//! # Style Registry
//!
//! Stylesheets injected by surfaces during a render pass. They are painted
//! after the whole tree has rendered and only touch colors nothing else
//! set, so explicit widget styles always win.
//!
//! ```text
//! 1. element-scoped rules   (fill unset cells inside the element's area)
//! 2. global rules           (fill whatever is still unset)
//! ```

use log::debug;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};

use crate::tui::document::{Document, ElementId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleScope {
    Global,
    Element(ElementId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    pub scope: StyleScope,
    pub style: Style,
    /// Which surface injected the rule.
    pub source: &'static str,
}

#[derive(Debug, Default)]
pub struct StyleRegistry {
    rules: Vec<StyleRule>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    pub fn inject(&mut self, scope: StyleScope, style: Style, source: &'static str) {
        self.rules.push(StyleRule {
            scope,
            style,
            source,
        });
    }

    pub fn paint(&self, buf: &mut Buffer, document: &Document) {
        for rule in &self.rules {
            if let StyleScope::Element(id) = rule.scope {
                match document.element(id) {
                    Some(element) if element.mounted => fill_unset(buf, element.area, rule.style),
                    _ => debug!("Skipping '{}' rule for detached '{}'", rule.source, id),
                }
            }
        }
        for rule in &self.rules {
            if rule.scope == StyleScope::Global {
                let area = buf.area;
                fill_unset(buf, area, rule.style);
            }
        }
    }
}

fn fill_unset(buf: &mut Buffer, area: Rect, style: Style) {
    let area = area.intersection(buf.area);
    for position in area.positions() {
        let Some(cell) = buf.cell_mut(position) else {
            continue;
        };
        if let Some(fg) = style.fg
            && cell.fg == Color::Reset
        {
            cell.fg = fg;
        }
        if let Some(bg) = style.bg
            && cell.bg == Color::Reset
        {
            cell.bg = bg;
        }
    }
}

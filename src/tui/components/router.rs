//! # Router
//!
//! The main content area: note list on the left, markdown preview on the
//! right. Follows the persistent state + transient wrapper pattern:
//! - `RouterState` lives in the shell
//! - `Router` is created each frame with borrowed state, storage and
//!   document, and mounts its two panes while rendering

use log::warn;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect, Size};
use ratatui::style::Modifier;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Padding, Paragraph, Wrap};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::theme::Theme;
use crate::storage::{NoteMeta, Storage};
use crate::tui::component::Component;
use crate::tui::document::{Document, ElementId};
use crate::tui::keyboard::MARKDOWN_PREVIEWER_CLASS;
use crate::tui::markdown;

pub const NOTE_LIST: ElementId = ElementId("note-list");
pub const PREVIEW: ElementId = ElementId("preview");

pub const NOTE_LIST_CLASSES: &[&str] = &["NoteList"];
pub const PREVIEW_CLASSES: &[&str] = &[MARKDOWN_PREVIEWER_CLASS, "EditorSurface"];

struct OpenNote {
    id: String,
    body: String,
}

/// Persistent state for the router panes.
pub struct RouterState {
    notes: Vec<NoteMeta>,
    selected: usize,
    list_state: ListState,
    open: Option<OpenNote>,
    pub scroll_state: ScrollViewState,
}

impl Default for RouterState {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterState {
    pub fn new() -> Self {
        Self {
            notes: Vec::new(),
            selected: 0,
            list_state: ListState::default(),
            open: None,
            scroll_state: ScrollViewState::default(),
        }
    }

    pub fn notes(&self) -> &[NoteMeta] {
        &self.notes
    }

    pub fn selected_note(&self) -> Option<&NoteMeta> {
        self.notes.get(self.selected)
    }

    /// Replace the list, keeping the cursor on the same note if it survived.
    pub fn sync_notes(&mut self, notes: Vec<NoteMeta>) {
        let keep = self.selected_note().map(|n| n.id.clone());
        self.notes = notes;
        self.selected = keep
            .and_then(|id| self.notes.iter().position(|n| n.id == id))
            .unwrap_or(0)
            .min(self.notes.len().saturating_sub(1));
        self.list_state
            .select((!self.notes.is_empty()).then_some(self.selected));
    }

    pub fn select_next(&mut self) {
        if !self.notes.is_empty() {
            self.selected = (self.selected + 1).min(self.notes.len() - 1);
            self.list_state.select(Some(self.selected));
        }
    }

    pub fn select_previous(&mut self) {
        if !self.notes.is_empty() {
            self.selected = self.selected.saturating_sub(1);
            self.list_state.select(Some(self.selected));
        }
    }

    pub fn scroll_down(&mut self) {
        self.scroll_state.scroll_down();
    }

    pub fn scroll_up(&mut self) {
        self.scroll_state.scroll_up();
    }

    /// Body of the open note, if any.
    pub fn open_body(&self) -> Option<&str> {
        self.open.as_ref().map(|o| o.body.as_str())
    }

    /// Load the selected note if it is not the one already open.
    fn ensure_open(&mut self, storage: &dyn Storage) {
        let Some(note) = self.notes.get(self.selected) else {
            self.open = None;
            return;
        };
        if self.open.as_ref().is_some_and(|o| o.id == note.id) {
            return;
        }
        let body = match storage.load_note(&note.id) {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to load note {}: {}", note.id, e);
                format!("*Could not load this note: {e}*")
            }
        };
        self.open = Some(OpenNote {
            id: note.id.clone(),
            body,
        });
        self.scroll_state.scroll_to_top();
    }
}

/// Rows for the preview canvas. Notes taller than the canvas can hold are
/// cut off at the bottom rather than wrapping the height around.
fn canvas_height(line_count: usize) -> u16 {
    u16::try_from(line_count).unwrap_or(u16::MAX).max(1)
}

/// Transient render wrapper for the router.
pub struct Router<'a> {
    pub state: &'a mut RouterState,
    pub storage: &'a dyn Storage,
    pub document: &'a mut Document,
    pub theme: &'static Theme,
}

impl Router<'_> {
    fn render_list(&mut self, frame: &mut Frame, area: Rect) {
        let theme = self.theme;
        let focused = self.document.focused() == Some(NOTE_LIST);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style(focused))
            .title(" Notes ");
        let inner = block.inner(area);

        let items: Vec<ListItem> = self
            .state
            .notes
            .iter()
            .map(|n| ListItem::new(Line::styled(n.title.clone(), theme.base_style())))
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_symbol("› ")
            .highlight_style(
                theme
                    .base_style()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_stateful_widget(list, area, &mut self.state.list_state);

        if self.document.is_selected(NOTE_LIST) {
            frame.buffer_mut().set_style(inner, theme.selection_style());
        }
        self.document
            .mount(NOTE_LIST, area, self.state.notes.len());
    }

    fn render_preview(&mut self, frame: &mut Frame, area: Rect) {
        let theme = self.theme;
        let focused = self.document.focused() == Some(PREVIEW);
        let title = self
            .state
            .selected_note()
            .map(|n| format!(" {} ", n.title))
            .unwrap_or_else(|| " Preview ".to_string());
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style(focused))
            .title(title)
            .padding(Padding::horizontal(1));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let text = match self.state.open_body() {
            Some(body) => markdown::render(body, theme),
            None => markdown::render("_No notes yet._", theme),
        };
        let child_count = text.lines.len();

        // One column for the scrollbar.
        let content_width = inner.width.saturating_sub(1).max(1);
        let paragraph = Paragraph::new(text).wrap(Wrap { trim: false });
        let content_height = canvas_height(paragraph.line_count(content_width));

        let mut scroll_view = ScrollView::new(Size::new(content_width, content_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Automatic)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);
        scroll_view.render_widget(paragraph, Rect::new(0, 0, content_width, content_height));
        frame.render_stateful_widget(scroll_view, inner, &mut self.state.scroll_state);

        if self.document.is_selected(PREVIEW) {
            frame.buffer_mut().set_style(inner, theme.selection_style());
        }
        self.document.mount(PREVIEW, area, child_count);
    }
}

impl Component for Router<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.state.sync_notes(self.storage.notes());
        self.state.ensure_open(self.storage);

        let [list_area, preview_area] =
            Layout::horizontal([Constraint::Percentage(30), Constraint::Min(0)]).areas(area);
        self.render_list(frame, list_area);
        self.render_preview(frame, preview_area);
    }
}

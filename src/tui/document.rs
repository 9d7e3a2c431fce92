//! # Document
//!
//! A small retained model of what is on screen, enough for keyboard
//! shortcuts to reason about "the element under focus" and "the current
//! text selection" the way a browser page would.
//!
//! ```text
//! Document
//! ├── elements: Vec<Element>      // registration order = Tab order
//! │   ├── root        (always mounted, covers the viewport)
//! │   ├── navigator   ["TopLevelNavigator"]
//! │   ├── note-list   ["NoteList"]
//! │   └── preview     ["MarkdownPreviewer", "EditorSurface"]
//! ├── focused: Option<ElementId>  // the key event target
//! └── selection: Option<Selection>
//! ```
//!
//! Components call [`Document::mount`] while rendering; anything not
//! mounted during a frame is detached and cannot be focused or selected.
//! The selection context only exists while the document is attached to a
//! terminal.

use std::fmt;

use log::debug;
use ratatui::layout::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub &'static str);

impl ElementId {
    pub const ROOT: ElementId = ElementId("root");
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Element {
    pub id: ElementId,
    pub classes: Vec<&'static str>,
    pub area: Rect,
    /// Number of rendered children (lines) from the last mount.
    pub child_count: usize,
    pub mounted: bool,
    pub focusable: bool,
}

impl Element {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| *c == class)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    UnknownElement(ElementId),
    Detached(ElementId),
    NoSelection,
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomError::UnknownElement(id) => write!(f, "unknown element '{id}'"),
            DomError::Detached(id) => write!(f, "element '{id}' is not mounted"),
            DomError::NoSelection => write!(f, "no selection context"),
        }
    }
}

impl std::error::Error for DomError {}

/// A span of children inside one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub container: ElementId,
    pub start: usize,
    pub end: usize,
}

impl Range {
    /// A range covering the whole subtree of `id`.
    pub fn select_node(document: &Document, id: ElementId) -> Result<Range, DomError> {
        let element = document
            .element(id)
            .ok_or(DomError::UnknownElement(id))?;
        if !element.mounted {
            return Err(DomError::Detached(id));
        }
        Ok(Range {
            container: id,
            start: 0,
            end: element.child_count,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ranges: Vec<Range>,
}

impl Selection {
    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn add_range(&mut self, range: Range) {
        self.ranges.push(range);
    }

    pub fn remove_all_ranges(&mut self) {
        self.ranges.clear();
    }
}

pub struct Document {
    elements: Vec<Element>,
    focused: Option<ElementId>,
    selection: Option<Selection>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            elements: vec![Element {
                id: ElementId::ROOT,
                classes: vec!["AppContainer"],
                area: Rect::default(),
                child_count: 0,
                mounted: true,
                focusable: false,
            }],
            focused: None,
            selection: None,
        }
    }

    /// Register an element. Re-defining an id replaces its classes.
    pub fn define(&mut self, id: ElementId, classes: &[&'static str], focusable: bool) {
        if let Some(existing) = self.elements.iter_mut().find(|e| e.id == id) {
            existing.classes = classes.to_vec();
            existing.focusable = focusable;
            return;
        }
        self.elements.push(Element {
            id,
            classes: classes.to_vec(),
            area: Rect::default(),
            child_count: 0,
            mounted: false,
            focusable,
        });
    }

    /// Make the selection context available.
    pub fn attach(&mut self) {
        if self.selection.is_none() {
            self.selection = Some(Selection::default());
        }
    }

    pub fn detach(&mut self) {
        self.selection = None;
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn is_mounted(&self, id: ElementId) -> bool {
        self.element(id).is_some_and(|e| e.mounted)
    }

    /// Start a render pass: everything but the root becomes detached until
    /// mounted again.
    pub fn begin_frame(&mut self, viewport: Rect) {
        for element in &mut self.elements {
            if element.id == ElementId::ROOT {
                element.area = viewport;
            } else {
                element.mounted = false;
            }
        }
    }

    pub fn mount(&mut self, id: ElementId, area: Rect, child_count: usize) {
        match self.elements.iter_mut().find(|e| e.id == id) {
            Some(element) => {
                element.mounted = true;
                element.area = area;
                element.child_count = child_count;
            }
            None => debug!("Mount of undefined element '{}' ignored", id),
        }
    }

    /// Finish a render pass: move focus off detached elements.
    pub fn end_frame(&mut self) {
        let root_children = self
            .elements
            .iter()
            .filter(|e| e.mounted && e.id != ElementId::ROOT)
            .count();
        if let Some(root) = self.elements.first_mut() {
            root.child_count = root_children;
        }

        if let Some(id) = self.focused
            && !self.is_mounted(id)
        {
            self.focused = None;
        }
        if self.focused.is_none() {
            let first = self.focusable().next();
            self.focused = first;
        }
    }

    fn focusable(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements
            .iter()
            .filter(|e| e.mounted && e.focusable)
            .map(|e| e.id)
    }

    pub fn focused(&self) -> Option<ElementId> {
        self.focused
    }

    pub fn focus(&mut self, id: ElementId) -> bool {
        let ok = self
            .element(id)
            .is_some_and(|e| e.mounted && e.focusable);
        if ok {
            self.focused = Some(id);
        }
        ok
    }

    /// Move focus to the next mounted focusable element, wrapping around.
    pub fn focus_next(&mut self) {
        let order: Vec<ElementId> = self.focusable().collect();
        if order.is_empty() {
            self.focused = None;
            return;
        }
        let next = match self.focused.and_then(|f| order.iter().position(|id| *id == f)) {
            Some(pos) => order[(pos + 1) % order.len()],
            None => order[0],
        };
        self.focused = Some(next);
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn selection_mut(&mut self) -> Option<&mut Selection> {
        self.selection.as_mut()
    }

    /// Replace the selection with a single range over `id`.
    pub fn select_node(&mut self, id: ElementId) -> Result<(), DomError> {
        if self.selection.is_none() {
            return Err(DomError::NoSelection);
        }
        let range = Range::select_node(self, id)?;
        let selection = self.selection.as_mut().ok_or(DomError::NoSelection)?;
        selection.remove_all_ranges();
        selection.add_range(range);
        Ok(())
    }

    /// Select the whole document.
    pub fn select_all(&mut self) -> Result<(), DomError> {
        self.select_node(ElementId::ROOT)
    }

    pub fn clear_selection(&mut self) {
        if let Some(selection) = self.selection.as_mut() {
            selection.remove_all_ranges();
        }
    }

    /// Whether `id` is covered by the selection (directly or via the root).
    pub fn is_selected(&self, id: ElementId) -> bool {
        self.selection.as_ref().is_some_and(|s| {
            s.ranges()
                .iter()
                .any(|r| r.container == id || r.container == ElementId::ROOT)
        })
    }
}

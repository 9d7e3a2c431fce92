//! # Global Keyboard Dispatch
//!
//! Every key-down reaching the shell goes through one process-wide handler
//! before any pane sees it. The handler lives in a single registration slot
//! owned by [`KeyDispatcher`]:
//!
//! ```text
//! crossterm key ─► KeyboardEvent ─► KeyDispatcher::dispatch ─► handler
//!                                                   │
//!                       default_prevented? ◄────────┘
//!                         no  → shell default handling (panes, overlays)
//!                         yes → stop
//! ```
//!
//! The handler is rebuilt only when the preferences toggle action changes
//! identity. Registration takes `&mut self` and dispatch borrows the slot,
//! so a swap can never land in the middle of an event and no event ever
//! reaches a superseded handler.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{debug, warn};

use crate::core::preferences::ToggleAction;
use crate::tui::document::{Document, ElementId, Range};

/// Class that opts a pane into the scoped Ctrl+A override.
pub const MARKDOWN_PREVIEWER_CLASS: &str = "MarkdownPreviewer";

/// Which modifier counts as the "general control" key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Command (reported as Super or Meta by the terminal).
    MacOs,
    /// Ctrl.
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Other
        }
    }

    /// Label for the general control key in help text.
    pub fn general_ctrl_label(self) -> &'static str {
        match self {
            Platform::MacOs => "Cmd",
            Platform::Other => "Ctrl",
        }
    }
}

pub fn is_with_general_ctrl_key(modifiers: KeyModifiers, platform: Platform) -> bool {
    match platform {
        Platform::MacOs => modifiers.intersects(KeyModifiers::SUPER | KeyModifiers::META),
        Platform::Other => modifiers.contains(KeyModifiers::CONTROL),
    }
}

/// One key-down, as seen by the global handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardEvent {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
    /// The focused element, if any.
    pub target: Option<ElementId>,
    default_prevented: bool,
}

impl KeyboardEvent {
    pub fn new(code: KeyCode, modifiers: KeyModifiers, target: Option<ElementId>) -> Self {
        Self {
            code,
            modifiers,
            target,
            default_prevented: false,
        }
    }

    pub fn from_key(key: KeyEvent, target: Option<ElementId>) -> Self {
        Self::new(key.code, key.modifiers, target)
    }

    /// Stop the shell's default handling for this event.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

pub type KeyHandler = Box<dyn Fn(&mut KeyboardEvent, &mut Document)>;

struct Registration {
    identity: ToggleAction,
    handler: KeyHandler,
}

/// Single-slot holder for the global key-down handler.
#[derive(Default)]
pub struct KeyDispatcher {
    slot: Option<Registration>,
    registrations: usize,
}

impl KeyDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the handler derived from `identity`.
    ///
    /// If the current handler was built from the same action this is a
    /// no-op and `build` is never called. Returns whether the slot changed.
    pub fn register(&mut self, identity: &ToggleAction, build: impl FnOnce() -> KeyHandler) -> bool {
        if self
            .slot
            .as_ref()
            .is_some_and(|r| r.identity.same_as(identity))
        {
            return false;
        }
        self.slot = Some(Registration {
            identity: identity.clone(),
            handler: build(),
        });
        self.registrations += 1;
        debug!("Global key handler registered (#{})", self.registrations);
        true
    }

    pub fn dispatch(&self, event: &mut KeyboardEvent, document: &mut Document) {
        if let Some(registration) = &self.slot {
            (registration.handler)(event, document);
        }
    }

    pub fn is_registered(&self) -> bool {
        self.slot.is_some()
    }

    /// How many times a handler has been installed.
    pub fn registrations(&self) -> usize {
        self.registrations
    }
}

/// The shell's global shortcuts.
///
/// - general-ctrl `,` toggles the preferences panel
/// - general-ctrl `a` on a markdown preview selects only that preview
pub fn shell_key_handler(toggle: ToggleAction, platform: Platform) -> KeyHandler {
    Box::new(move |event: &mut KeyboardEvent, document: &mut Document| match event.code {
        KeyCode::Char(',') => {
            if is_with_general_ctrl_key(event.modifiers, platform) {
                toggle.invoke();
            }
        }
        KeyCode::Char('a') => {
            if !is_with_general_ctrl_key(event.modifiers, platform) {
                return;
            }
            if let Some(target) = event.target {
                select_previewer(event, document, target);
            }
        }
        _ => {}
    })
}

/// Replace the selection with the whole preview pane, suppressing the
/// default whole-document select. Any failure leaves both untouched.
fn select_previewer(event: &mut KeyboardEvent, document: &mut Document, target: ElementId) {
    let is_previewer = document
        .element(target)
        .is_some_and(|e| e.has_class(MARKDOWN_PREVIEWER_CLASS));
    if !is_previewer || document.selection().is_none() {
        return;
    }

    let range = match Range::select_node(document, target) {
        Ok(range) => range,
        Err(e) => {
            warn!("Ignoring select-all on '{}': {}", target, e);
            return;
        }
    };

    event.prevent_default();
    if let Some(selection) = document.selection_mut() {
        selection.remove_all_ranges();
        selection.add_range(range);
    }
}

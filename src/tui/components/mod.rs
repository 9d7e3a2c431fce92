//! # TUI Components
//!
//! Everything the shell draws, split into the gated main content and the
//! always-mounted overlay hosts.
//!
//! ## Component Architecture
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Receive all data as struct fields and render it:
//! - `Navigator`: top bar with storage name, note count and sync time
//! - `LoadingView`: placeholder until storage is ready
//! - `PreferencesModal`: current preferences and their shortcuts
//!
//! ### Stateful Components (Event-Driven)
//!
//! Own state that survives frames and react to `TuiEvent`s:
//! - `RouterState` / `Router`: note list and markdown preview
//! - `DialogHost`: at most one confirmation dialog
//! - `ToastList`: expiring notices
//! - `FeatureChecklist`: dismissable cheat sheet
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs                (this file)
//! ├── navigator.rs
//! ├── loading.rs
//! ├── router.rs             (note list + preview pane)
//! ├── dialog.rs
//! ├── preferences_modal.rs
//! ├── toast.rs
//! └── feature_checklist.rs
//! ```

pub mod dialog;
pub mod feature_checklist;
pub mod loading;
pub mod navigator;
pub mod preferences_modal;
pub mod router;
pub mod toast;

pub use dialog::{Dialog, DialogEvent, DialogHost, DialogKind};
pub use feature_checklist::FeatureChecklist;
pub use loading::LoadingView;
pub use navigator::Navigator;
pub use preferences_modal::{PreferencesEvent, PreferencesKeys, PreferencesModal};
pub use router::{Router, RouterState};
pub use toast::ToastList;

use ratatui::layout::{Constraint, Flex, Layout, Rect};

/// A `width` x `height` rect centered in `outer` (clamped to it).
pub(crate) fn centered_rect_abs(width: u16, height: u16, outer: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(outer.height))])
        .flex(Flex::Center)
        .areas(outer);
    let [center] = Layout::horizontal([Constraint::Length(width.min(outer.width))])
        .flex(Flex::Center)
        .areas(row);
    center
}

//! # Preferences
//!
//! User-facing settings that can change while Jotter runs (theme, whether
//! the navigator is shown) plus the open/closed state of the preferences
//! panel.
//!
//! ```text
//! PreferencesStore
//! ├── snapshot: Rc<Preferences>   // immutable, replaced on every change
//! ├── closed: Rc<Cell<bool>>      // preferences panel state
//! ├── toggle: ToggleAction        // re-minted with every snapshot
//! └── path: Option<PathBuf>       // ~/.jotter/preferences.json
//! ```
//!
//! Readers hold snapshots, never the store. The only way to flip the panel
//! from outside is the [`ToggleAction`]; its identity tells the keyboard
//! dispatcher when the handler built around it is stale.

use std::cell::Cell;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::core::theme;
use crate::storage::atomic_write_json;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preferences {
    #[serde(rename = "general.theme")]
    pub theme: String,
    #[serde(rename = "general.showTopLevelNavigator")]
    pub show_top_level_navigator: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            show_top_level_navigator: true,
        }
    }
}

/// On-disk form: every key optional so a sparse file keeps the defaults.
#[derive(Debug, Default, Deserialize)]
struct StoredPreferences {
    #[serde(rename = "general.theme")]
    theme: Option<String>,
    #[serde(rename = "general.showTopLevelNavigator")]
    show_top_level_navigator: Option<bool>,
}

pub type PreferenceSnapshot = Rc<Preferences>;

/// Handle to the "toggle preferences panel" action.
///
/// Clones share identity; [`PreferencesStore`] mints a new one whenever it
/// publishes a snapshot.
#[derive(Clone)]
pub struct ToggleAction(Rc<dyn Fn()>);

impl ToggleAction {
    pub fn new(f: impl Fn() + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn invoke(&self) {
        (self.0)()
    }

    /// True when both handles refer to the same action.
    pub fn same_as(&self, other: &ToggleAction) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl fmt::Debug for ToggleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ToggleAction({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

pub struct PreferencesStore {
    snapshot: PreferenceSnapshot,
    closed: Rc<Cell<bool>>,
    toggle: ToggleAction,
    path: Option<PathBuf>,
}

impl PreferencesStore {
    /// In-memory store; changes are not persisted.
    pub fn new(preferences: Preferences) -> Self {
        let closed = Rc::new(Cell::new(true));
        let toggle = mint_toggle(&closed);
        Self {
            snapshot: Rc::new(preferences),
            closed,
            toggle,
            path: None,
        }
    }

    /// Load from `path`, filling missing keys from `defaults`.
    ///
    /// A missing file yields `defaults`; a malformed one is logged and also
    /// yields `defaults`. Later changes are written back to `path`.
    pub fn load(path: PathBuf, defaults: Preferences) -> Self {
        let stored = match fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str::<StoredPreferences>(&json) {
                Ok(stored) => {
                    info!("Loaded preferences from {}", path.display());
                    stored
                }
                Err(e) => {
                    warn!("Ignoring malformed preferences {}: {}", path.display(), e);
                    StoredPreferences::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No preferences file at {}", path.display());
                StoredPreferences::default()
            }
            Err(e) => {
                warn!("Failed to read preferences {}: {}", path.display(), e);
                StoredPreferences::default()
            }
        };

        let preferences = Preferences {
            theme: stored.theme.unwrap_or(defaults.theme),
            show_top_level_navigator: stored
                .show_top_level_navigator
                .unwrap_or(defaults.show_top_level_navigator),
        };
        let mut store = Self::new(preferences);
        store.path = Some(path);
        store
    }

    pub fn snapshot(&self) -> PreferenceSnapshot {
        Rc::clone(&self.snapshot)
    }

    pub fn toggle_closed_action(&self) -> ToggleAction {
        self.toggle.clone()
    }

    /// Whether the preferences panel is closed. Starts closed.
    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    pub fn set_theme(&mut self, id: &str) {
        let next = Preferences {
            theme: id.to_string(),
            ..(*self.snapshot).clone()
        };
        self.publish(next, true);
    }

    /// Advance to the next built-in theme and return its id.
    pub fn cycle_theme(&mut self) -> &'static str {
        let next = theme::next_id(&self.snapshot.theme);
        self.set_theme(next);
        next
    }

    pub fn set_show_top_level_navigator(&mut self, show: bool) {
        let next = Preferences {
            show_top_level_navigator: show,
            ..(*self.snapshot).clone()
        };
        self.publish(next, true);
    }

    /// Apply a theme for this run only (e.g. from `--theme`).
    pub fn override_theme(&mut self, id: &str) {
        let next = Preferences {
            theme: id.to_string(),
            ..(*self.snapshot).clone()
        };
        self.publish(next, false);
    }

    fn publish(&mut self, preferences: Preferences, persist: bool) {
        if *self.snapshot == preferences {
            return;
        }
        debug!("Publishing preferences: {:?}", preferences);
        self.snapshot = Rc::new(preferences);
        self.toggle = mint_toggle(&self.closed);
        if persist {
            self.save();
        }
    }

    fn save(&self) {
        let Some(path) = &self.path else {
            return;
        };
        if let Some(parent) = path.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warn!("Failed to create preferences directory: {}", e);
            return;
        }
        if let Err(e) = atomic_write_json(path, &*self.snapshot) {
            warn!("Failed to save preferences: {}", e);
        }
    }
}

fn mint_toggle(closed: &Rc<Cell<bool>>) -> ToggleAction {
    let closed = Rc::clone(closed);
    ToggleAction::new(move || closed.set(!closed.get()))
}

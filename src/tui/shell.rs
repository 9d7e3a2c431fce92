//! # App Shell
//!
//! The composition root. Owns everything the run loop drives:
//!
//! ```text
//! AppShell
//! ├── BootstrapSequencer   gates the main content on storage init
//! ├── PreferencesStore     theme + navigator, panel toggle action
//! ├── KeyDispatcher        global key-down handler (re-registered on toggle change)
//! ├── Document             mounted panes, focus, selection
//! ├── RouterState          note list + preview
//! └── overlay hosts        dialogs, preferences, toasts, checklist
//! ```
//!
//! Each frame renders either the loading placeholder or the main content,
//! then every overlay surface in a fixed order, then paints the injected
//! stylesheets.

use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Instant;

use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{debug, info, warn};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use tokio::task::JoinHandle;

use crate::core::action::Action;
use crate::core::bootstrap::{BootstrapSequencer, Diagnostics, InitializationState, LogDiagnostics};
use crate::core::preferences::PreferencesStore;
use crate::core::theme::{self, Theme};
use crate::storage::Storage;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::router::{NOTE_LIST, NOTE_LIST_CLASSES, PREVIEW, PREVIEW_CLASSES};
use crate::tui::components::{
    Dialog, DialogEvent, DialogHost, DialogKind, FeatureChecklist, LoadingView, Navigator,
    PreferencesEvent, PreferencesKeys, PreferencesModal, Router, RouterState, ToastList,
};
use crate::tui::document::{Document, ElementId};
use crate::tui::event::TuiEvent;
use crate::tui::keyboard::{
    KeyDispatcher, KeyboardEvent, Platform, is_with_general_ctrl_key, shell_key_handler,
};
use crate::tui::style::{StyleRegistry, StyleScope};

pub const NAVIGATOR: ElementId = ElementId("navigator");

/// What the content area shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellView {
    Loading,
    Main { navigator: bool },
}

/// Always-mounted surfaces, in render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    GlobalStyle,
    DialogHost,
    PreferencesModal,
    ToastList,
    EditorStyle,
    FeatureChecklist,
}

pub struct ShellOptions {
    pub show_feature_checklist: bool,
    pub platform: Platform,
    pub diagnostics: Box<dyn Diagnostics>,
}

impl Default for ShellOptions {
    fn default() -> Self {
        Self {
            show_feature_checklist: true,
            platform: Platform::current(),
            diagnostics: Box::new(LogDiagnostics),
        }
    }
}

pub struct AppShell {
    storage: Arc<dyn Storage>,
    preferences: PreferencesStore,
    bootstrap: BootstrapSequencer,
    dispatcher: KeyDispatcher,
    document: Document,
    router: RouterState,
    dialogs: DialogHost,
    toasts: ToastList,
    checklist: FeatureChecklist,
    styles: StyleRegistry,
    surfaces: Vec<Surface>,
    platform: Platform,
    last_seen_sync: Option<DateTime<Utc>>,
    should_quit: bool,
}

impl AppShell {
    pub fn new(storage: Arc<dyn Storage>, preferences: PreferencesStore, options: ShellOptions) -> Self {
        let mut document = Document::new();
        document.define(NAVIGATOR, &["TopLevelNavigator"], false);
        document.define(NOTE_LIST, NOTE_LIST_CLASSES, true);
        document.define(PREVIEW, PREVIEW_CLASSES, true);

        Self {
            storage,
            preferences,
            bootstrap: BootstrapSequencer::new(options.diagnostics),
            dispatcher: KeyDispatcher::new(),
            document,
            router: RouterState::new(),
            dialogs: DialogHost::new(),
            toasts: ToastList::new(),
            checklist: FeatureChecklist::new(options.show_feature_checklist, options.platform),
            styles: StyleRegistry::new(),
            surfaces: Vec::new(),
            platform: options.platform,
            last_seen_sync: None,
            should_quit: false,
        }
    }

    /// Start bootstrapping storage. Only the first call has an effect.
    pub fn mount(&mut self, tx: Sender<Action>) -> Option<JoinHandle<()>> {
        self.bootstrap.mount(Arc::clone(&self.storage), tx)
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::BootstrapFinished(outcome) => self.bootstrap.finish(outcome),
        }
    }

    /// Keep the global key handler bound to the current toggle action.
    /// Returns whether the handler was replaced.
    pub fn sync_key_handler(&mut self) -> bool {
        let toggle = self.preferences.toggle_closed_action();
        let platform = self.platform;
        self.dispatcher
            .register(&toggle, || shell_key_handler(toggle.clone(), platform))
    }

    pub fn state(&self) -> InitializationState {
        self.bootstrap.state()
    }

    pub fn view(&self) -> ShellView {
        match self.bootstrap.state() {
            InitializationState::Uninitialized => ShellView::Loading,
            InitializationState::Initialized => ShellView::Main {
                navigator: self.preferences.snapshot().show_top_level_navigator,
            },
        }
    }

    /// Surfaces mounted by the last render.
    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn preferences(&self) -> &PreferencesStore {
        &self.preferences
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn dispatcher(&self) -> &KeyDispatcher {
        &self.dispatcher
    }

    pub fn dialogs(&self) -> &DialogHost {
        &self.dialogs
    }

    pub fn toasts(&self) -> &ToastList {
        &self.toasts
    }

    /// Whether something on screen is time-driven (toasts counting down).
    pub fn is_animating(&self) -> bool {
        !self.toasts.is_empty()
    }

    /// Time-based housekeeping. Returns whether a redraw is needed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let expired = self.toasts.prune(now);
        let synced = self.storage.last_synced();
        let sync_changed = synced != self.last_seen_sync;
        if sync_changed {
            debug!("Storage sync observed at {:?}", synced);
            self.last_seen_sync = synced;
        }
        expired || sync_changed
    }

    // ── Events ──────────────────────────────────────────────────────────

    pub fn handle_event(&mut self, event: TuiEvent) {
        match event {
            TuiEvent::Key(key) => self.handle_key(key),
            TuiEvent::Drop(payload) => {
                debug!("Swallowed drop of {} bytes", payload.len());
            }
            TuiEvent::Resize => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let mut event = KeyboardEvent::from_key(key, self.document.focused());
        self.dispatcher.dispatch(&mut event, &mut self.document);
        if event.default_prevented() {
            return;
        }
        self.default_key_action(key);
    }

    /// The shell's own handling, run only when the global handler left
    /// the event alone.
    fn default_key_action(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            info!("Ctrl+C, quitting");
            self.should_quit = true;
            return;
        }

        let event = TuiEvent::Key(key);
        if self.dialogs.is_open() {
            if let Some(DialogEvent::Confirmed(DialogKind::ConfirmQuit)) =
                self.dialogs.handle_event(&event)
            {
                info!("Quit confirmed");
                self.should_quit = true;
            }
            return;
        }
        if !self.preferences.is_closed() {
            if let Some(pref_event) = PreferencesKeys.handle_event(&event) {
                self.apply_preferences_event(pref_event);
            }
            return;
        }
        if self.checklist.is_visible() {
            self.checklist.handle_event(&event);
            return;
        }

        let general_ctrl = is_with_general_ctrl_key(key.modifiers, self.platform);
        match key.code {
            KeyCode::Char('a') if general_ctrl => {
                if let Err(e) = self.document.select_all() {
                    warn!("Select all ignored: {}", e);
                }
            }
            KeyCode::Char('q') if general_ctrl => {
                self.dialogs.open(Dialog::confirm_quit());
            }
            KeyCode::Tab => self.document.focus_next(),
            KeyCode::Esc => self.document.clear_selection(),
            KeyCode::Up | KeyCode::Down if matches!(self.view(), ShellView::Main { .. }) => {
                let down = key.code == KeyCode::Down;
                match self.document.focused() {
                    Some(id) if id == NOTE_LIST && down => self.router.select_next(),
                    Some(id) if id == NOTE_LIST => self.router.select_previous(),
                    Some(id) if id == PREVIEW && down => self.router.scroll_down(),
                    Some(id) if id == PREVIEW => self.router.scroll_up(),
                    _ => {}
                }
            }
            _ => {}
        }
    }

    fn apply_preferences_event(&mut self, event: PreferencesEvent) {
        match event {
            PreferencesEvent::CycleTheme => {
                let id = self.preferences.cycle_theme();
                self.toasts.push(format!("Theme: {}", theme::resolve(id).label));
            }
            PreferencesEvent::ToggleNavigator => {
                let show = !self.preferences.snapshot().show_top_level_navigator;
                self.preferences.set_show_top_level_navigator(show);
                self.toasts
                    .push(if show { "Navigator shown" } else { "Navigator hidden" });
            }
            PreferencesEvent::Close => self.preferences.toggle_closed_action().invoke(),
        }
    }

    // ── Rendering ───────────────────────────────────────────────────────

    pub fn render(&mut self, frame: &mut Frame) {
        let snapshot = self.preferences.snapshot();
        let theme = theme::resolve(&snapshot.theme);
        let area = frame.area();

        self.document.begin_frame(area);
        self.styles.clear();
        self.surfaces.clear();

        match self.view() {
            ShellView::Main { navigator } => self.render_main(frame, area, theme, navigator),
            ShellView::Loading => LoadingView { theme }.render(frame, area),
        }

        self.styles
            .inject(StyleScope::Global, theme.base_style(), "global");
        self.surfaces.push(Surface::GlobalStyle);

        self.dialogs.render(frame, area, theme);
        self.surfaces.push(Surface::DialogHost);

        if !self.preferences.is_closed() {
            PreferencesModal {
                preferences: &snapshot,
                theme,
                toggle_hint: format!("{}+,", self.platform.general_ctrl_label()),
            }
            .render(frame, area);
        }
        self.surfaces.push(Surface::PreferencesModal);

        self.toasts.render(frame, area, theme);
        self.surfaces.push(Surface::ToastList);

        self.styles
            .inject(StyleScope::Element(PREVIEW), theme.surface_style(), "editor");
        self.surfaces.push(Surface::EditorStyle);

        self.checklist.render(frame, area, theme);
        self.surfaces.push(Surface::FeatureChecklist);

        self.document.end_frame();
        self.styles.paint(frame.buffer_mut(), &self.document);
    }

    fn render_main(&mut self, frame: &mut Frame, area: Rect, theme: &'static Theme, navigator: bool) {
        let content = if navigator {
            let [bar, content] =
                Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(area);
            Navigator {
                storage_name: self.storage.name(),
                note_count: self.storage.notes().len(),
                last_synced: self.storage.last_synced(),
                theme,
            }
            .render(frame, bar);
            self.document.mount(NAVIGATOR, bar, 1);
            content
        } else {
            area
        };

        Router {
            state: &mut self.router,
            storage: self.storage.as_ref(),
            document: &mut self.document,
            theme,
        }
        .render(frame, content);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockStorage, RecordingDiagnostics, StorageCall, test_preferences};
    use crate::storage::StorageError;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::rc::Rc;
    use std::sync::mpsc;

    const ALL_SURFACES: [Surface; 6] = [
        Surface::GlobalStyle,
        Surface::DialogHost,
        Surface::PreferencesModal,
        Surface::ToastList,
        Surface::EditorStyle,
        Surface::FeatureChecklist,
    ];

    fn shell_with(storage: MockStorage, diagnostics: RecordingDiagnostics) -> AppShell {
        AppShell::new(
            Arc::new(storage),
            test_preferences(),
            ShellOptions {
                show_feature_checklist: false,
                platform: Platform::Other,
                diagnostics: Box::new(diagnostics),
            },
        )
    }

    fn shell() -> AppShell {
        shell_with(
            MockStorage::succeeding().with_note("groceries", "# Groceries\n\n- milk\n- eggs"),
            RecordingDiagnostics::default(),
        )
    }

    fn initialized_shell() -> AppShell {
        let mut shell = shell();
        shell.apply(Action::BootstrapFinished(Ok(())));
        shell.document_mut().attach();
        shell.sync_key_handler();
        draw(&mut shell);
        shell
    }

    fn draw(shell: &mut AppShell) -> String {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| shell.render(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn press(shell: &mut AppShell, code: KeyCode, modifiers: KeyModifiers) {
        shell.handle_event(TuiEvent::Key(KeyEvent::new(code, modifiers)));
    }

    #[test]
    fn test_uninitialized_renders_loading_and_overlays() {
        let mut shell = shell();
        let text = draw(&mut shell);

        assert_eq!(shell.view(), ShellView::Loading);
        assert!(text.contains("Loading Data..."));
        assert!(!text.contains("Groceries"));
        assert_eq!(shell.surfaces(), &ALL_SURFACES);
        assert!(!shell.document().is_mounted(PREVIEW));
    }

    #[test]
    fn test_initialized_renders_navigator_and_router() {
        let mut shell = shell();
        shell.apply(Action::BootstrapFinished(Ok(())));
        let text = draw(&mut shell);

        assert_eq!(shell.view(), ShellView::Main { navigator: true });
        assert!(!text.contains("Loading Data..."));
        assert!(text.contains("Jotter"));
        assert!(text.contains("Groceries"));
        assert!(text.contains("milk"));
        assert_eq!(shell.surfaces(), &ALL_SURFACES);
        assert!(shell.document().is_mounted(NAVIGATOR));
    }

    #[test]
    fn test_navigator_preference_hides_navigator() {
        let mut shell = shell();
        shell.preferences.set_show_top_level_navigator(false);
        shell.apply(Action::BootstrapFinished(Ok(())));
        let text = draw(&mut shell);

        assert_eq!(shell.view(), ShellView::Main { navigator: false });
        assert!(!text.contains("Jotter"));
        assert!(text.contains("Groceries"));
        assert!(!shell.document().is_mounted(NAVIGATOR));
    }

    #[test]
    fn test_bootstrap_failure_reports_once_and_keeps_loading() {
        let diagnostics = RecordingDiagnostics::default();
        let mut shell = shell_with(MockStorage::failing(), diagnostics.clone());
        shell.apply(Action::BootstrapFinished(Err(StorageError::NotFound(
            "index".to_string(),
        ))));

        assert_eq!(diagnostics.entries().len(), 1);
        assert_eq!(shell.view(), ShellView::Loading);
        assert!(draw(&mut shell).contains("Loading Data..."));
    }

    #[tokio::test]
    async fn test_mount_bootstraps_once() {
        let storage = Arc::new(MockStorage::succeeding());
        let mut shell = AppShell::new(
            storage.clone(),
            test_preferences(),
            ShellOptions {
                show_feature_checklist: false,
                platform: Platform::Other,
                diagnostics: Box::new(RecordingDiagnostics::default()),
            },
        );
        let (tx, rx) = mpsc::channel();

        let handle = shell.mount(tx.clone()).expect("first mount spawns");
        assert!(shell.mount(tx).is_none());
        handle.await.unwrap();

        shell.apply(rx.recv().unwrap());
        assert_eq!(shell.state(), InitializationState::Initialized);
        assert_eq!(
            storage.calls(),
            vec![StorageCall::Initialize, StorageCall::QueueFullSync(0)]
        );
    }

    #[test]
    fn test_key_handler_reregisters_only_on_toggle_change() {
        let mut shell = shell();
        assert!(shell.sync_key_handler());
        assert!(!shell.sync_key_handler());
        assert_eq!(shell.dispatcher().registrations(), 1);

        shell.preferences.set_theme("sepia");
        assert!(shell.sync_key_handler());
        assert!(!shell.sync_key_handler());
        assert_eq!(shell.dispatcher().registrations(), 2);
    }

    #[test]
    fn test_ctrl_a_on_preview_selects_only_preview() {
        let mut shell = initialized_shell();
        assert!(shell.document_mut().focus(PREVIEW));

        press(&mut shell, KeyCode::Char('a'), KeyModifiers::CONTROL);

        let selection = shell.document().selection().unwrap();
        assert_eq!(selection.ranges().len(), 1);
        assert_eq!(selection.ranges()[0].container, PREVIEW);
        assert!(!shell.document().is_selected(NOTE_LIST));
    }

    #[test]
    fn test_ctrl_a_elsewhere_selects_everything() {
        let mut shell = initialized_shell();
        assert!(shell.document_mut().focus(NOTE_LIST));

        press(&mut shell, KeyCode::Char('a'), KeyModifiers::CONTROL);

        let selection = shell.document().selection().unwrap();
        assert_eq!(selection.ranges()[0].container, ElementId::ROOT);
        assert!(shell.document().is_selected(NOTE_LIST));
        assert!(shell.document().is_selected(PREVIEW));

        press(&mut shell, KeyCode::Esc, KeyModifiers::NONE);
        assert!(shell.document().selection().unwrap().is_empty());
    }

    #[test]
    fn test_preferences_panel_flow() {
        let mut shell = initialized_shell();
        assert!(shell.preferences().is_closed());

        press(&mut shell, KeyCode::Char(','), KeyModifiers::CONTROL);
        assert!(!shell.preferences().is_closed());
        assert!(draw(&mut shell).contains("Preferences"));

        press(&mut shell, KeyCode::Char('t'), KeyModifiers::NONE);
        assert_eq!(shell.preferences().snapshot().theme, "light");
        assert!(shell.toasts().messages().any(|m| m == "Theme: Light"));

        // The old handler still toggles the same panel until re-registered.
        assert!(shell.sync_key_handler());
        press(&mut shell, KeyCode::Char('n'), KeyModifiers::NONE);
        assert!(!shell.preferences().snapshot().show_top_level_navigator);

        press(&mut shell, KeyCode::Esc, KeyModifiers::NONE);
        assert!(shell.preferences().is_closed());
    }

    #[test]
    fn test_quit_requires_confirmation() {
        let mut shell = initialized_shell();
        press(&mut shell, KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(shell.dialogs().is_open());
        assert!(!shell.should_quit());

        press(&mut shell, KeyCode::Esc, KeyModifiers::NONE);
        assert!(!shell.dialogs().is_open());
        assert!(!shell.should_quit());

        press(&mut shell, KeyCode::Char('q'), KeyModifiers::CONTROL);
        press(&mut shell, KeyCode::Enter, KeyModifiers::NONE);
        assert!(shell.should_quit());
    }

    #[test]
    fn test_ctrl_c_quits_immediately() {
        let mut shell = shell();
        press(&mut shell, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(shell.should_quit());
    }

    #[test]
    fn test_tab_cycles_focus_and_arrows_move_cursor() {
        let mut shell = shell_with(
            MockStorage::succeeding()
                .with_note("a", "# Alpha")
                .with_note("b", "# Beta"),
            RecordingDiagnostics::default(),
        );
        shell.apply(Action::BootstrapFinished(Ok(())));
        draw(&mut shell);
        assert_eq!(shell.document().focused(), Some(NOTE_LIST));

        press(&mut shell, KeyCode::Down, KeyModifiers::NONE);
        draw(&mut shell);
        assert_eq!(shell.router.selected_note().unwrap().id, "b");

        press(&mut shell, KeyCode::Tab, KeyModifiers::NONE);
        assert_eq!(shell.document().focused(), Some(PREVIEW));
        press(&mut shell, KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(shell.router.selected_note().unwrap().id, "b");
    }

    #[test]
    fn test_checklist_takes_keys_until_dismissed() {
        let mut shell = AppShell::new(
            Arc::new(MockStorage::succeeding()),
            test_preferences(),
            ShellOptions {
                show_feature_checklist: true,
                platform: Platform::Other,
                diagnostics: Box::new(RecordingDiagnostics::default()),
            },
        );
        assert!(draw(&mut shell).contains("Getting started"));

        press(&mut shell, KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(!shell.dialogs().is_open());

        press(&mut shell, KeyCode::Enter, KeyModifiers::NONE);
        assert!(!draw(&mut shell).contains("Getting started"));
    }

    #[test]
    fn test_drop_is_swallowed() {
        let mut shell = initialized_shell();
        let before = shell.preferences().snapshot();
        shell.handle_event(TuiEvent::Drop("/tmp/photo.png".to_string()));
        assert!(Rc::ptr_eq(&before, &shell.preferences().snapshot()));
        assert!(!shell.should_quit());
        assert!(shell.document().selection().unwrap().is_empty());
    }

    #[test]
    fn test_editor_surface_gets_surface_background() {
        let mut shell = shell();
        shell.apply(Action::BootstrapFinished(Ok(())));
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| shell.render(f)).unwrap();

        let preview = shell.document().element(PREVIEW).unwrap().area;
        let buffer = terminal.backend().buffer();
        let dark = theme::resolve("dark");
        // Bottom padding row of the preview is never drawn by the markdown.
        let cell = &buffer[(preview.x + 1, preview.y + preview.height - 2)];
        assert_eq!(cell.bg, dark.surface);
        // The note list only gets the global background.
        assert_eq!(buffer[(0, 23)].bg, dark.background);
    }

    #[test]
    fn test_tick_reports_toast_expiry() {
        let mut shell = initialized_shell();
        assert!(!shell.tick(Instant::now()));
        shell.toasts.push("hello");
        assert!(shell.is_animating());
        assert!(shell.tick(Instant::now() + std::time::Duration::from_secs(4)));
        assert!(!shell.is_animating());
    }
}

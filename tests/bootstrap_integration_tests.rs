use std::cell::RefCell;
use std::fs;
use std::rc::Rc;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use jotter::core::action::Action;
use jotter::core::bootstrap::{BootstrapSequencer, Diagnostics, InitializationState, run_bootstrap};
use jotter::core::preferences::{Preferences, PreferencesStore};
use jotter::storage::{LocalStorage, Storage, StorageError};
use jotter::tui::keyboard::Platform;
use jotter::tui::shell::{AppShell, ShellOptions, ShellView};
use ratatui::Terminal;
use ratatui::backend::TestBackend;

// ============================================================================
// Helper Functions
// ============================================================================

#[derive(Clone, Default)]
struct CollectingDiagnostics(Rc<RefCell<Vec<String>>>);

impl Diagnostics for CollectingDiagnostics {
    fn report(&self, error: &StorageError) {
        self.0.borrow_mut().push(error.to_string());
    }
}

/// Waits until the storage has completed at least one full sync.
async fn wait_for_sync(storage: &dyn Storage) {
    for _ in 0..100 {
        if storage.last_synced().is_some() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("full sync never completed");
}

// ============================================================================
// Bootstrap against local storage
// ============================================================================

#[tokio::test]
async fn test_bootstrap_seeds_and_syncs_empty_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let notes_dir = tmp.path().join("notes");
    let storage = LocalStorage::new(&notes_dir);

    run_bootstrap(&storage).await.unwrap();
    assert!(storage.is_initialized());
    wait_for_sync(&storage).await;

    let notes = storage.notes();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Welcome to Jotter");
    assert!(notes_dir.join("index.json").exists());
    assert!(storage.load_note(&notes[0].id).unwrap().contains("Shortcuts"));
}

#[tokio::test]
async fn test_second_initialize_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let storage = LocalStorage::new(tmp.path());

    run_bootstrap(&storage).await.unwrap();
    assert!(matches!(
        run_bootstrap(&storage).await,
        Err(StorageError::AlreadyInitialized)
    ));
}

#[tokio::test]
async fn test_sync_picks_up_new_files() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("one.md"), "# One").unwrap();
    let storage = LocalStorage::new(tmp.path());
    run_bootstrap(&storage).await.unwrap();
    wait_for_sync(&storage).await;
    assert_eq!(storage.notes().len(), 1);

    fs::write(tmp.path().join("two.md"), "# Two").unwrap();
    let before = storage.last_synced();
    storage.queue_full_sync(0);
    for _ in 0..100 {
        if storage.last_synced() != before && storage.notes().len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let titles: Vec<String> = storage.notes().into_iter().map(|n| n.title).collect();
    assert!(titles.contains(&"One".to_string()));
    assert!(titles.contains(&"Two".to_string()));
}

#[tokio::test]
async fn test_unusable_directory_reports_once_and_never_syncs() {
    let tmp = tempfile::tempdir().unwrap();
    // A regular file where the notes directory should be.
    let blocked = tmp.path().join("notes");
    fs::write(&blocked, "not a directory").unwrap();
    let storage = Arc::new(LocalStorage::new(&blocked));

    let diagnostics = CollectingDiagnostics::default();
    let mut sequencer = BootstrapSequencer::new(Box::new(diagnostics.clone()));
    let (tx, rx) = mpsc::channel();
    sequencer.mount(storage.clone(), tx).unwrap().await.unwrap();

    match rx.recv().unwrap() {
        Action::BootstrapFinished(outcome) => sequencer.finish(outcome),
    }
    assert_eq!(sequencer.state(), InitializationState::Uninitialized);
    assert_eq!(diagnostics.0.borrow().len(), 1);
    assert!(!storage.is_initialized());
    assert!(storage.last_synced().is_none());
}

// ============================================================================
// Shell end-to-end
// ============================================================================

#[tokio::test]
async fn test_shell_switches_from_loading_to_notes() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("shopping.md"), "# Shopping\n\n- bread").unwrap();
    let storage = Arc::new(LocalStorage::new(tmp.path()));

    let mut shell = AppShell::new(
        storage,
        PreferencesStore::new(Preferences::default()),
        ShellOptions {
            show_feature_checklist: false,
            platform: Platform::Other,
            diagnostics: Box::new(CollectingDiagnostics::default()),
        },
    );
    let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
    let screen = |terminal: &Terminal<TestBackend>| {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    };

    terminal.draw(|f| shell.render(f)).unwrap();
    assert!(screen(&terminal).contains("Loading Data..."));

    let (tx, rx) = mpsc::channel();
    shell.mount(tx).unwrap().await.unwrap();
    shell.apply(rx.recv().unwrap());
    assert_eq!(shell.view(), ShellView::Main { navigator: true });

    terminal.draw(|f| shell.render(f)).unwrap();
    let text = screen(&terminal);
    assert!(text.contains("Local"));
    assert!(text.contains("Shopping"));
    assert!(text.contains("bread"));
}

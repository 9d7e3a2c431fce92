//! # Local Storage
//!
//! Notes are `<id>.md` files in one directory. `index.json` caches their
//! metadata so the note list renders without reading every file.
//!
//! All index writes use atomic rename (write `.tmp`, then `rename()`) for
//! crash safety.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};

use super::{NoteIndex, NoteMeta, Storage, StorageError, derive_title};

const INDEX_FILE: &str = "index.json";

const WELCOME_NOTE: &str = "# Welcome to Jotter

Notes are plain markdown files in this directory. Edit them with any editor;
Jotter picks up changes on the next sync.

## Shortcuts

- `Ctrl+,` opens preferences
- `Ctrl+A` on the preview selects just the note
- `Tab` moves focus between panes
- `Ctrl+Q` quits

```rust
fn main() {
    println!(\"hello, notes\");
}
```
";

#[derive(Default)]
struct SharedState {
    index: NoteIndex,
    last_synced: Option<DateTime<Utc>>,
}

pub struct LocalStorage {
    dir: PathBuf,
    state: Arc<Mutex<SharedState>>,
    sync_tx: Mutex<Option<UnboundedSender<u8>>>,
    /// Set by the first `initialize` call; cleared again if it fails.
    claimed: AtomicBool,
    initialized: AtomicBool,
}

impl LocalStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            state: Arc::new(Mutex::new(SharedState::default())),
            sync_tx: Mutex::new(None),
            claimed: AtomicBool::new(false),
            initialized: AtomicBool::new(false),
        }
    }

    fn state(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn the worker that services `queue_full_sync`.
    ///
    /// Pending requests are coalesced: one rescan covers every job queued
    /// while the previous one ran.
    fn start_sync_worker(&self) -> UnboundedSender<u8> {
        let (tx, mut rx) = unbounded_channel::<u8>();
        let dir = self.dir.clone();
        let state = Arc::clone(&self.state);

        tokio::spawn(async move {
            while let Some(priority) = rx.recv().await {
                let mut batch = 1usize;
                let mut top = priority;
                while let Ok(next) = rx.try_recv() {
                    batch += 1;
                    top = top.min(next);
                }
                debug!("Running full sync (priority={}, coalesced={})", top, batch);

                let scan_dir = dir.clone();
                match tokio::task::spawn_blocking(move || reconcile(&scan_dir)).await {
                    Ok(Ok(index)) => {
                        let count = index.notes.len();
                        let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
                        guard.index = index;
                        guard.last_synced = Some(Utc::now());
                        info!("Full sync complete: {} notes", count);
                    }
                    Ok(Err(e)) => warn!("Full sync failed: {}", e),
                    Err(e) => warn!("Full sync task panicked: {}", e),
                }
            }
            debug!("Sync worker stopped");
        });

        tx
    }
}

#[async_trait]
impl Storage for LocalStorage {
    fn name(&self) -> &str {
        "Local"
    }

    async fn initialize(&self) -> Result<(), StorageError> {
        if self
            .claimed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(StorageError::AlreadyInitialized);
        }

        let dir = self.dir.clone();
        let prepared = tokio::task::spawn_blocking(move || prepare(&dir))
            .await
            .map_err(|e| StorageError::Io(io::Error::other(e)))
            .and_then(|r| r);
        let index = match prepared {
            Ok(index) => index,
            Err(e) => {
                self.claimed.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        info!(
            "Storage ready at {} ({} notes)",
            self.dir.display(),
            index.notes.len()
        );
        self.state().index = index;

        let tx = self.start_sync_worker();
        *self.sync_tx.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn queue_full_sync(&self, priority: u8) {
        let guard = self.sync_tx.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(tx) => {
                if tx.send(priority).is_err() {
                    warn!("Sync worker is gone; dropping sync request");
                }
            }
            None => warn!("Full sync requested before storage was initialized; ignoring"),
        }
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn notes(&self) -> Vec<NoteMeta> {
        self.state().index.notes.clone()
    }

    fn load_note(&self, id: &str) -> Result<String, StorageError> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(StorageError::NotFound(id.to_string()));
        }
        let path = self.dir.join(format!("{id}.md"));
        fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(id.to_string()),
            _ => StorageError::Io(e),
        })
    }

    fn last_synced(&self) -> Option<DateTime<Utc>> {
        self.state().last_synced
    }
}

/// Create the directory, seed a welcome note into an empty one, and load
/// the index (rebuilding it when missing).
fn prepare(dir: &Path) -> Result<NoteIndex, StorageError> {
    fs::create_dir_all(dir)?;

    let index_path = dir.join(INDEX_FILE);
    if index_path.exists() {
        let json = fs::read_to_string(&index_path)?;
        let index: NoteIndex = serde_json::from_str(&json)?;
        debug!("Loaded index with {} notes", index.notes.len());
        return Ok(index);
    }

    if note_files(dir)?.is_empty() {
        let id = uuid::Uuid::new_v4().to_string();
        fs::write(dir.join(format!("{id}.md")), WELCOME_NOTE)?;
        info!("Seeded welcome note {}", id);
    }

    reconcile(dir)
}

/// Rescan the directory and rewrite the index.
fn reconcile(dir: &Path) -> Result<NoteIndex, StorageError> {
    let mut notes: Vec<NoteMeta> = note_files(dir)?
        .iter()
        .filter_map(|path| read_meta(path))
        .collect();

    notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
    let index = NoteIndex { notes };
    atomic_write_json(&dir.join(INDEX_FILE), &index)?;
    Ok(index)
}

/// Metadata for one note file. Files that vanish or cannot be read between
/// listing and reading are skipped.
fn read_meta(path: &Path) -> Option<NoteMeta> {
    let id = path.file_stem().and_then(|s| s.to_str())?;
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) => {
            warn!("Skipping vanished note {}: {}", path.display(), e);
            return None;
        }
    };
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Skipping unreadable note {}: {}", path.display(), e);
            return None;
        }
    };
    Some(NoteMeta {
        id: id.to_string(),
        title: derive_title(&content),
        updated_at: unix_seconds(metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH)),
        size: metadata.len(),
    })
}

fn note_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    files.sort();
    Ok(files)
}

fn unix_seconds(time: SystemTime) -> i64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Atomically write `data` as JSON to `path` (via `.tmp` + rename).
pub(crate) fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> io::Result<()> {
    let tmp_path = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn wait_for_notes(storage: &LocalStorage, count: usize) -> bool {
        for _ in 0..100 {
            if storage.notes().len() == count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_initialize_seeds_welcome_note_into_empty_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(tmp.path().join("notes"));

        storage.initialize().await.unwrap();

        assert!(storage.is_initialized());
        let notes = storage.notes();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Welcome to Jotter");
        assert!(tmp.path().join("notes").join(INDEX_FILE).exists());
        let body = storage.load_note(&notes[0].id).unwrap();
        assert!(body.contains("## Shortcuts"));
    }

    #[tokio::test]
    async fn test_initialize_twice_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(tmp.path());
        storage.initialize().await.unwrap();

        let second = storage.initialize().await;
        assert!(matches!(second, Err(StorageError::AlreadyInitialized)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_initialize_admits_one_caller() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let (first, second) = tokio::join!(storage.initialize(), storage.initialize());

        assert_eq!(
            [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(),
            1
        );
        let rejected = if first.is_err() { first } else { second };
        assert!(matches!(rejected, Err(StorageError::AlreadyInitialized)));
        assert!(storage.is_initialized());
    }

    #[tokio::test]
    async fn test_failed_initialize_can_be_retried() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(INDEX_FILE), "{ not json").unwrap();
        let storage = LocalStorage::new(tmp.path());
        assert!(storage.initialize().await.is_err());

        fs::remove_file(tmp.path().join(INDEX_FILE)).unwrap();
        storage.initialize().await.unwrap();
        assert!(storage.is_initialized());
    }

    #[test]
    fn test_read_meta_skips_vanished_file() {
        let tmp = tempfile::tempdir().unwrap();
        let kept = tmp.path().join("kept.md");
        fs::write(&kept, "# Kept").unwrap();

        assert!(read_meta(&tmp.path().join("gone.md")).is_none());
        let meta = read_meta(&kept).unwrap();
        assert_eq!(meta.id, "kept");
        assert_eq!(meta.title, "Kept");
        assert_eq!(meta.size, 6);
    }

    #[tokio::test]
    async fn test_initialize_fails_on_corrupt_index() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(INDEX_FILE), "{ not json").unwrap();
        let storage = LocalStorage::new(tmp.path());

        let result = storage.initialize().await;
        assert!(matches!(result, Err(StorageError::Parse(_))));
        assert!(!storage.is_initialized());
    }

    #[tokio::test]
    async fn test_existing_notes_are_not_reseeded() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("todo.md"), "# Todo\n- [ ] write tests").unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.initialize().await.unwrap();

        let notes = storage.notes();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, "todo");
        assert_eq!(notes[0].title, "Todo");
    }

    #[tokio::test]
    async fn test_full_sync_picks_up_new_files() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.md"), "first").unwrap();
        let storage = LocalStorage::new(tmp.path());
        storage.initialize().await.unwrap();
        assert_eq!(storage.notes().len(), 1);
        assert!(storage.last_synced().is_none());

        fs::write(tmp.path().join("b.md"), "second").unwrap();
        storage.queue_full_sync(0);

        assert!(wait_for_notes(&storage, 2).await, "sync never picked up b.md");
        assert!(storage.last_synced().is_some());

        let on_disk: NoteIndex =
            serde_json::from_str(&fs::read_to_string(tmp.path().join(INDEX_FILE)).unwrap())
                .unwrap();
        assert_eq!(on_disk.notes.len(), 2);
    }

    #[tokio::test]
    async fn test_sync_before_initialize_is_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(tmp.path());
        storage.queue_full_sync(0);
        assert!(storage.notes().is_empty());
        assert!(!tmp.path().join(INDEX_FILE).exists());
    }

    #[test]
    fn test_load_note_rejects_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(tmp.path());
        assert!(matches!(
            storage.load_note("../secret"),
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(storage.load_note("missing"), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_reconcile_ignores_non_markdown() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("note.md"), "hello").unwrap();
        fs::write(tmp.path().join("image.png"), [0u8, 1, 2]).unwrap();
        let index = reconcile(tmp.path()).unwrap();
        assert_eq!(index.notes.len(), 1);
        assert_eq!(index.notes[0].size, 5);
    }
}

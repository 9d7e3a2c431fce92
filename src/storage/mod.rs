//! # Note Storage
//!
//! The persistence seam of Jotter. The shell only talks to the [`Storage`]
//! trait; [`LocalStorage`] is the on-disk implementation (a directory of
//! markdown files plus a JSON index).
//!
//! ```text
//! initialize()  ──►  ready (index loaded, sync worker running)
//!                          │
//! queue_full_sync(p) ──────┘  fire-and-forget; the worker rescans the
//!                             directory and rewrites `index.json`
//! ```

mod local;

use std::fmt;
use std::io;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use local::LocalStorage;
pub(crate) use local::atomic_write_json;

/// Summary metadata for one note (stored in the index file).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NoteMeta {
    pub id: String,
    pub title: String,
    pub updated_at: i64,
    pub size: u64,
}

/// Index of all notes, most recently modified first.
#[derive(Serialize, Deserialize, Default, Debug, PartialEq, Eq)]
pub struct NoteIndex {
    pub notes: Vec<NoteMeta>,
}

#[derive(Debug)]
pub enum StorageError {
    Io(io::Error),
    Parse(serde_json::Error),
    AlreadyInitialized,
    NotFound(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "storage I/O error: {e}"),
            StorageError::Parse(e) => write!(f, "storage index is corrupt: {e}"),
            StorageError::AlreadyInitialized => write!(f, "storage is already initialized"),
            StorageError::NotFound(id) => write!(f, "note not found: {id}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            StorageError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        StorageError::Io(e)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Parse(e)
    }
}

/// Where notes live.
///
/// `initialize` is expensive and must not be re-entered; callers run it once
/// per process. `queue_full_sync` never blocks and never reports back: its
/// ordering and completion belong to the implementation.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Display name for the navigator.
    fn name(&self) -> &str;

    async fn initialize(&self) -> Result<(), StorageError>;

    /// Enqueue a full resync. Requests queued while a sync is running are
    /// merged into a single rescan; `priority` is only logged.
    fn queue_full_sync(&self, priority: u8);

    fn is_initialized(&self) -> bool;

    /// Current note list (empty before initialization).
    fn notes(&self) -> Vec<NoteMeta>;

    fn load_note(&self, id: &str) -> Result<String, StorageError>;

    fn last_synced(&self) -> Option<DateTime<Utc>>;
}

/// Derive a title from note content: first non-empty line, heading markers
/// stripped, truncated to 60 chars.
pub fn derive_title(content: &str) -> String {
    let first_line = content
        .lines()
        .map(|l| l.trim_start_matches('#').trim())
        .find(|l| !l.is_empty());
    match first_line {
        Some(line) if line.chars().count() > 60 => {
            let truncated: String = line.chars().take(57).collect();
            format!("{truncated}...")
        }
        Some(line) => line.to_string(),
        None => "Untitled".to_string(),
    }
}

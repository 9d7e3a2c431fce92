//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Notify;

use crate::core::bootstrap::Diagnostics;
use crate::core::preferences::{Preferences, PreferencesStore};
use crate::storage::{NoteMeta, Storage, StorageError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageCall {
    Initialize,
    QueueFullSync(u8),
}

/// In-memory storage that records every call made to it.
pub struct MockStorage {
    calls: Mutex<Vec<StorageCall>>,
    fail: bool,
    gate: Option<Arc<Notify>>,
    initialized: AtomicBool,
    notes: HashMap<String, String>,
}

impl MockStorage {
    pub fn succeeding() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: false,
            gate: None,
            initialized: AtomicBool::new(false),
            notes: HashMap::new(),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::succeeding()
        }
    }

    /// Storage whose `initialize` blocks until the returned `Notify` fires.
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let storage = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::succeeding()
        };
        (storage, gate)
    }

    pub fn with_note(mut self, id: &str, body: &str) -> Self {
        self.notes.insert(id.to_string(), body.to_string());
        self
    }

    pub fn calls(&self) -> Vec<StorageCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for MockStorage {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn initialize(&self) -> Result<(), StorageError> {
        self.calls.lock().unwrap().push(StorageCall::Initialize);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail {
            return Err(StorageError::Io(std::io::Error::other("disk on fire")));
        }
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn queue_full_sync(&self, priority: u8) {
        self.calls
            .lock()
            .unwrap()
            .push(StorageCall::QueueFullSync(priority));
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn notes(&self) -> Vec<NoteMeta> {
        let mut notes: Vec<NoteMeta> = self
            .notes
            .iter()
            .map(|(id, body)| NoteMeta {
                id: id.clone(),
                title: crate::storage::derive_title(body),
                updated_at: 0,
                size: body.len() as u64,
            })
            .collect();
        notes.sort_by(|a, b| a.id.cmp(&b.id));
        notes
    }

    fn load_note(&self, id: &str) -> Result<String, StorageError> {
        self.notes
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    fn last_synced(&self) -> Option<DateTime<Utc>> {
        None
    }
}

/// Diagnostics sink that keeps what it was told.
#[derive(Clone, Default)]
pub struct RecordingDiagnostics {
    entries: Rc<RefCell<Vec<String>>>,
}

impl RecordingDiagnostics {
    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn report(&self, error: &StorageError) {
        self.entries.borrow_mut().push(error.to_string());
    }
}

/// Creates an in-memory preferences store with default values.
pub fn test_preferences() -> PreferencesStore {
    PreferencesStore::new(Preferences::default())
}

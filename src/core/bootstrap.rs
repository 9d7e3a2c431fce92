//! # Bootstrap
//!
//! Brings storage up before the main UI is allowed to render.
//!
//! ```text
//! mount() ─► spawn ─► initialize() ──ok──► queue_full_sync(0) ─► Initialized
//!                          │
//!                          └──err──► Diagnostics::report()    (stays Uninitialized)
//! ```
//!
//! The sequence runs once per mount. There is no retry: a failed
//! initialization leaves the shell on its loading view and retry policy
//! stays with the storage layer.

use std::sync::Arc;
use std::sync::mpsc::Sender;

use log::{debug, error, info, warn};
use tokio::task::JoinHandle;

use crate::core::action::Action;
use crate::storage::{Storage, StorageError};

/// Priority of the full sync queued right after initialization.
pub const FULL_SYNC_PRIORITY: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitializationState {
    #[default]
    Uninitialized,
    Initialized,
}

/// Operator-facing sink for bootstrap failures.
pub trait Diagnostics {
    fn report(&self, error: &StorageError);
}

/// Writes failures to the log file.
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn report(&self, error: &StorageError) {
        error!("Storage initialization failed: {}", error);
    }
}

/// Initialize `storage`, then queue a full sync without waiting for it.
///
/// The sync is only queued after `initialize` succeeds.
pub async fn run_bootstrap(storage: &dyn Storage) -> Result<(), StorageError> {
    storage.initialize().await?;
    storage.queue_full_sync(FULL_SYNC_PRIORITY);
    Ok(())
}

pub struct BootstrapSequencer {
    mounted: bool,
    state: InitializationState,
    diagnostics: Box<dyn Diagnostics>,
}

impl BootstrapSequencer {
    pub fn new(diagnostics: Box<dyn Diagnostics>) -> Self {
        Self {
            mounted: false,
            state: InitializationState::Uninitialized,
            diagnostics,
        }
    }

    pub fn state(&self) -> InitializationState {
        self.state
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Start the bootstrap task. Only the first call does anything; the
    /// outcome arrives on `tx` as [`Action::BootstrapFinished`].
    pub fn mount(
        &mut self,
        storage: Arc<dyn Storage>,
        tx: Sender<Action>,
    ) -> Option<JoinHandle<()>> {
        if self.mounted {
            debug!("Bootstrap already mounted; ignoring");
            return None;
        }
        self.mounted = true;
        info!("Bootstrapping storage '{}'", storage.name());

        Some(tokio::spawn(async move {
            let outcome = run_bootstrap(storage.as_ref()).await;
            if tx.send(Action::BootstrapFinished(outcome)).is_err() {
                warn!("Bootstrap finished after the UI went away");
            }
        }))
    }

    /// Apply the outcome of the bootstrap task.
    pub fn finish(&mut self, outcome: Result<(), StorageError>) {
        match outcome {
            Ok(()) if self.state == InitializationState::Initialized => {
                debug!("Duplicate bootstrap success ignored");
            }
            Ok(()) => {
                info!("Storage initialized");
                self.state = InitializationState::Initialized;
            }
            Err(e) => self.diagnostics.report(&e),
        }
    }
}

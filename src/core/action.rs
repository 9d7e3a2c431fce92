//! # Actions
//!
//! Messages that background tasks post back to the UI thread.
//!
//! The UI owns all shell state and is single-threaded; tokio tasks never
//! touch it directly. They send an `Action` over a std `mpsc` channel and
//! the run loop applies it between frames:
//!
//! ```text
//! tokio task ──Action──► mpsc ──► run loop ──► AppShell::apply()
//! ```

use crate::storage::StorageError;

#[derive(Debug)]
pub enum Action {
    /// The bootstrap task finished: storage initialized (and a full sync
    /// was queued) or initialization failed.
    BootstrapFinished(Result<(), StorageError>),
}

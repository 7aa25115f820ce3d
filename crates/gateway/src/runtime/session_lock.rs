//! Per-session concurrency control.
//!
//! Ensures only one exchange runs per session at a time.  A second request
//! for the same session waits for the first to finish; tokio's semaphore
//! hands out permits in arrival order.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use cg_sessions::SessionId;

/// Manages per-session exchange locks.
///
/// Each session maps to a `Semaphore(1)`.  Holding the permit gives
/// exclusive access to that session's transcript and ledger entry.
pub struct SessionLockMap {
    locks: Mutex<HashMap<SessionId, Arc<Semaphore>>>,
}

impl Default for SessionLockMap {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLockMap {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the exchange lock for a session, waiting behind any exchange
    /// already in flight.  The permit releases on drop.
    pub async fn acquire(&self, session_id: &SessionId) -> Result<OwnedSemaphorePermit, LockClosed> {
        let sem = {
            let mut locks = self.locks.lock();
            locks
                .entry(session_id.clone())
                .or_insert_with(|| Arc::new(Semaphore::new(1)))
                .clone()
        };

        sem.acquire_owned().await.map_err(|_| LockClosed)
    }

    /// Number of tracked sessions (for monitoring).
    pub fn session_count(&self) -> usize {
        self.locks.lock().len()
    }

    /// Drop the locks of evicted sessions.  A lock that is held or waited on
    /// is kept so mutual exclusion is never split across two semaphores.
    pub fn remove_many(&self, session_ids: &[SessionId]) {
        let mut locks = self.locks.lock();
        for id in session_ids {
            if locks.get(id).is_some_and(|sem| Arc::strong_count(sem) == 1) {
                locks.remove(id);
            }
        }
    }

    /// Remove every lock nobody is holding or waiting on.
    pub fn prune_idle(&self) {
        let mut locks = self.locks.lock();
        locks.retain(|_, sem| Arc::strong_count(sem) > 1);
    }
}

/// The session's semaphore was closed.  Locks are never closed while the
/// map is alive, so this indicates a bug.
#[derive(Debug)]
pub struct LockClosed;

impl std::fmt::Display for LockClosed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session lock closed")
    }
}

impl std::error::Error for LockClosed {}

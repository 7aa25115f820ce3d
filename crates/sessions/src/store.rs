//! In-memory registry of live sessions.
//!
//! Each [`SessionId`] maps to a [`SessionEntry`] tracking when the session
//! was created and last used.  Entries are removed only by the idle-TTL
//! sweep (see [`crate::lifecycle`]).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use cg_domain::trace::TraceEvent;

use crate::lifecycle::LifecycleManager;
use crate::resolver::SessionId;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session entry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A single session tracked by the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct SessionEntry {
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Process-local session registry.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a session by id.
    pub fn get(&self, session_id: &SessionId) -> Option<SessionEntry> {
        self.sessions.read().get(session_id).cloned()
    }

    /// Resolve or register a session.  Returns `(entry, is_new)`.
    pub fn resolve_or_create(&self, session_id: &SessionId) -> (SessionEntry, bool) {
        // Fast path: session already exists.
        {
            let sessions = self.sessions.read();
            if let Some(entry) = sessions.get(session_id) {
                return (entry.clone(), false);
            }
        }

        // Slow path: re-check under the write lock, another request may
        // have registered the same id in between.
        let mut sessions = self.sessions.write();
        if let Some(entry) = sessions.get(session_id) {
            return (entry.clone(), false);
        }

        let now = Utc::now();
        let entry = SessionEntry {
            session_id: session_id.clone(),
            created_at: now,
            last_seen: now,
        };
        sessions.insert(session_id.clone(), entry.clone());
        drop(sessions);

        TraceEvent::SessionResolved {
            session_id: session_id.to_string(),
            is_new: true,
        }
        .emit();

        (entry, true)
    }

    /// Touch the `last_seen` timestamp.
    pub fn touch(&self, session_id: &SessionId) {
        let mut sessions = self.sessions.write();
        if let Some(entry) = sessions.get_mut(session_id) {
            entry.last_seen = Utc::now();
        }
    }

    /// List all session entries.
    pub fn list(&self) -> Vec<SessionEntry> {
        self.sessions.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Drop every session the lifecycle policy considers expired at `now`
    /// and return their ids so dependent stores can drop them too.
    pub fn evict_idle(&self, lifecycle: &LifecycleManager, now: DateTime<Utc>) -> Vec<SessionId> {
        let mut sessions = self.sessions.write();
        let expired = lifecycle.expired(sessions.values(), now);
        for id in &expired {
            sessions.remove(id);
        }
        let remaining = sessions.len();
        drop(sessions);

        if !expired.is_empty() {
            TraceEvent::SessionsEvicted {
                count: expired.len(),
                remaining,
            }
            .emit();
        }
        expired
    }
}

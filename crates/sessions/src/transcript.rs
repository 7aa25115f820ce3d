//! Per-session conversation transcripts.
//!
//! Each session owns an ordered, append-only list of [`Turn`]s.  Turns are
//! appended in pairs (user, then assistant) under a single write lock so two
//! exchanges can never interleave.  Nothing outside the lifecycle sweep
//! removes turns.

use std::collections::HashMap;

use parking_lot::RwLock;

use cg_domain::trace::TraceEvent;
use cg_domain::{Turn, TurnRole};

use crate::resolver::SessionId;

/// In-memory transcript store keyed by session.
#[derive(Default)]
pub struct TranscriptStore {
    transcripts: RwLock<HashMap<SessionId, Vec<Turn>>>,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordered history for a session.  An empty transcript is created on
    /// first access.
    pub fn history(&self, session_id: &SessionId) -> Vec<Turn> {
        // Fast path: transcript already exists.
        {
            let transcripts = self.transcripts.read();
            if let Some(turns) = transcripts.get(session_id) {
                return turns.clone();
            }
        }

        self.transcripts
            .write()
            .entry(session_id.clone())
            .or_default()
            .clone()
    }

    /// Read-only lookup; unlike [`Self::history`] nothing is created.
    pub fn get(&self, session_id: &SessionId) -> Option<Vec<Turn>> {
        self.transcripts.read().get(session_id).cloned()
    }

    /// Append one completed exchange.  Returns the new transcript length.
    pub fn append_exchange(&self, session_id: &SessionId, user: Turn, assistant: Turn) -> usize {
        debug_assert_eq!(user.role(), TurnRole::User);
        debug_assert_eq!(assistant.role(), TurnRole::Assistant);

        let total = {
            let mut transcripts = self.transcripts.write();
            let turns = transcripts.entry(session_id.clone()).or_default();
            turns.push(user);
            turns.push(assistant);
            turns.len()
        };

        TraceEvent::TranscriptAppend {
            session_id: session_id.to_string(),
            lines: 2,
            total,
        }
        .emit();

        total
    }

    /// Number of turns recorded for a session (0 when unknown).
    pub fn len(&self, session_id: &SessionId) -> usize {
        self.transcripts
            .read()
            .get(session_id)
            .map_or(0, Vec::len)
    }

    /// Whether a transcript entry exists for the session.
    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.transcripts.read().contains_key(session_id)
    }

    /// Drop the transcripts of evicted sessions.
    pub fn remove_many(&self, session_ids: &[SessionId]) {
        let mut transcripts = self.transcripts.write();
        for id in session_ids {
            transcripts.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_creates_empty_entry() {
        let store = TranscriptStore::new();
        let id = SessionId::generate();
        assert!(!store.contains(&id));
        assert!(store.history(&id).is_empty());
        assert!(store.contains(&id));
    }

    #[test]
    fn get_does_not_create_entry() {
        let store = TranscriptStore::new();
        let id = SessionId::generate();
        assert_eq!(store.get(&id), None);
        assert!(!store.contains(&id));
    }

    #[test]
    fn n_exchanges_yield_2n_turns_in_order() {
        let store = TranscriptStore::new();
        let id = SessionId::generate();

        for i in 0..5 {
            let len = store.append_exchange(
                &id,
                Turn::user(format!("q{i}")),
                Turn::assistant(format!("a{i}")),
            );
            assert_eq!(len, 2 * (i + 1));
        }

        let history = store.history(&id);
        assert_eq!(history.len(), 10);
        for (i, pair) in history.chunks(2).enumerate() {
            assert_eq!(pair[0], Turn::user(format!("q{i}")));
            assert_eq!(pair[1], Turn::assistant(format!("a{i}")));
        }
    }

    #[test]
    fn sessions_are_isolated() {
        let store = TranscriptStore::new();
        let a = SessionId::generate();
        let b = SessionId::generate();
        store.append_exchange(&a, Turn::user("hi"), Turn::assistant("hello"));
        assert_eq!(store.len(&a), 2);
        assert_eq!(store.len(&b), 0);
    }

    #[test]
    fn history_is_a_snapshot() {
        let store = TranscriptStore::new();
        let id = SessionId::generate();
        let before = store.history(&id);
        store.append_exchange(&id, Turn::user("hi"), Turn::assistant("hello"));
        assert!(before.is_empty());
        assert_eq!(store.len(&id), 2);
    }

    #[test]
    fn remove_many_drops_entries() {
        let store = TranscriptStore::new();
        let a = SessionId::generate();
        let b = SessionId::generate();
        store.append_exchange(&a, Turn::user("1"), Turn::assistant("2"));
        store.append_exchange(&b, Turn::user("3"), Turn::assistant("4"));
        store.remove_many(&[a.clone()]);
        assert!(!store.contains(&a));
        assert_eq!(store.len(&b), 2);
    }

    #[tokio::test]
    async fn concurrent_appends_across_sessions_do_not_interfere() {
        let store = std::sync::Arc::new(TranscriptStore::new());
        let ids: Vec<SessionId> = (0..8).map(|_| SessionId::generate()).collect();

        let mut handles = Vec::new();
        for id in ids.clone() {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..25 {
                    store.append_exchange(
                        &id,
                        Turn::user(format!("u{i}")),
                        Turn::assistant(format!("a{i}")),
                    );
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        for id in &ids {
            let history = store.history(id);
            assert_eq!(history.len(), 50);
            assert_eq!(history[48], Turn::user("u24"));
            assert_eq!(history[49], Turn::assistant("a24"));
        }
    }
}

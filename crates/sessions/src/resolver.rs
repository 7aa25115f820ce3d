//! Session identifier resolution.
//!
//! A [`RequestContext`] stands for one execution context (one inbound HTTP
//! request).  The first [`SessionResolver::resolve`] call on a context
//! settles its [`SessionId`]; later calls on the same context return it
//! unchanged.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::store::SessionStore;

/// Opaque, globally unique session handle (a hyphenated UUID v4).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Mint a fresh id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Parse a caller-supplied token.  Only well-formed UUIDs are accepted;
    /// the result is normalized to lowercase hyphenated form.
    pub fn parse(raw: &str) -> Option<Self> {
        uuid::Uuid::parse_str(raw.trim())
            .ok()
            .map(|u| Self(u.hyphenated().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-request context the resolver attaches a session to.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    supplied: Option<String>,
    resolved: Option<SessionId>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context carrying the token the caller sent (if any).
    pub fn with_token(token: Option<String>) -> Self {
        Self {
            supplied: token,
            resolved: None,
        }
    }

    /// The session settled for this context, if resolution already ran.
    pub fn session_id(&self) -> Option<&SessionId> {
        self.resolved.as_ref()
    }
}

/// Assigns or retrieves the session for a request context.
pub struct SessionResolver {
    store: Arc<SessionStore>,
    accept_client_token: bool,
}

impl SessionResolver {
    pub fn new(store: Arc<SessionStore>, accept_client_token: bool) -> Self {
        Self {
            store,
            accept_client_token,
        }
    }

    /// Resolve the session for `ctx`.  Never fails.
    ///
    /// Idempotent per context.  With client tokens enabled, a well-formed
    /// supplied token is reused (re-registered if it was evicted); anything
    /// else gets a freshly minted id.
    pub fn resolve(&self, ctx: &mut RequestContext) -> SessionId {
        if let Some(id) = &ctx.resolved {
            return id.clone();
        }

        let supplied = self
            .accept_client_token
            .then(|| ctx.supplied.as_deref())
            .flatten();
        let id = match supplied.map(|raw| (raw, SessionId::parse(raw))) {
            Some((_, Some(id))) => id,
            Some((raw, None)) => {
                tracing::debug!(
                    token_len = raw.len(),
                    "malformed session token; minting a fresh id"
                );
                SessionId::generate()
            }
            None => SessionId::generate(),
        };

        self.keep_alive(&id);
        ctx.resolved = Some(id.clone());
        id
    }

    /// Mark a session as active now.  A session evicted while one of its
    /// exchanges was in flight is registered again, so its transcript and
    /// ledger entry stay reachable by the next sweep.
    pub fn keep_alive(&self, session_id: &SessionId) {
        let (_, is_new) = self.store.resolve_or_create(session_id);
        if is_new {
            tracing::debug!(session_id = %session_id, "session registered");
        } else {
            self.store.touch(session_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(accept: bool) -> (Arc<SessionStore>, SessionResolver) {
        let store = Arc::new(SessionStore::new());
        (store.clone(), SessionResolver::new(store, accept))
    }

    #[test]
    fn same_context_yields_same_id() {
        let (store, r) = resolver(true);
        let mut ctx = RequestContext::new();
        let a = r.resolve(&mut ctx);
        let b = r.resolve(&mut ctx);
        assert_eq!(a, b);
        assert_eq!(ctx.session_id(), Some(&a));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn distinct_contexts_get_distinct_ids() {
        let (_, r) = resolver(true);
        let a = r.resolve(&mut RequestContext::new());
        let b = r.resolve(&mut RequestContext::new());
        assert_ne!(a, b);
    }

    #[test]
    fn supplied_token_is_reused() {
        let (_, r) = resolver(true);
        let first = r.resolve(&mut RequestContext::new());
        let mut next = RequestContext::with_token(Some(first.to_string()));
        assert_eq!(r.resolve(&mut next), first);
    }

    #[test]
    fn supplied_token_is_normalized() {
        let (_, r) = resolver(true);
        let raw = "6F9619FF-8B86-D011-B42D-00CF4FC964FF";
        let id = r.resolve(&mut RequestContext::with_token(Some(raw.into())));
        assert_eq!(id.as_str(), "6f9619ff-8b86-d011-b42d-00cf4fc964ff");
    }

    #[test]
    fn malformed_token_mints_fresh_id() {
        let (_, r) = resolver(true);
        let id = r.resolve(&mut RequestContext::with_token(Some("not-a-uuid".into())));
        assert_ne!(id.as_str(), "not-a-uuid");
        assert!(SessionId::parse(id.as_str()).is_some());
    }

    #[test]
    fn token_ignored_when_client_tokens_disabled() {
        let (_, r) = resolver(false);
        let first = r.resolve(&mut RequestContext::new());
        let mut next = RequestContext::with_token(Some(first.to_string()));
        assert_ne!(r.resolve(&mut next), first);
    }

    #[test]
    fn keep_alive_re_registers_an_evicted_session() {
        let (store, r) = resolver(true);
        let id = r.resolve(&mut RequestContext::new());
        let lifecycle = crate::LifecycleManager::new(chrono::Duration::minutes(1));
        let evicted = store.evict_idle(&lifecycle, chrono::Utc::now() + chrono::Duration::hours(1));
        assert_eq!(evicted, vec![id.clone()]);
        assert!(store.get(&id).is_none());

        r.keep_alive(&id);
        assert!(store.get(&id).is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn session_id_serializes_as_plain_string() {
        let id = SessionId::parse("6f9619ff-8b86-d011-b42d-00cf4fc964ff").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""6f9619ff-8b86-d011-b42d-00cf4fc964ff""#);
    }
}

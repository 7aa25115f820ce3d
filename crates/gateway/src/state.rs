use std::sync::Arc;

use cg_domain::config::Config;
use cg_sessions::{LifecycleManager, SessionResolver, SessionStore, TranscriptStore};

use crate::runtime::{ExchangeOrchestrator, SessionLockMap, SpendLedger};

/// Shared application state passed to all API handlers.
///
/// Fields are grouped by concern:
/// - **Core**: config and the exchange orchestrator
/// - **Session management**: registry, resolver, lifecycle, transcripts
/// - **Spend**: per-session ledger and locks
/// - **Auth**: digest of the introspection bearer token
#[derive(Clone)]
pub struct AppState {
    // ── Core ──────────────────────────────────────────────────────────
    pub config: Arc<Config>,
    pub exchange: Arc<ExchangeOrchestrator>,

    // ── Session management ────────────────────────────────────────────
    pub sessions: Arc<SessionStore>,
    pub resolver: Arc<SessionResolver>,
    pub lifecycle: Arc<LifecycleManager>,
    pub transcripts: Arc<TranscriptStore>,

    // ── Spend ─────────────────────────────────────────────────────────
    pub spend: Arc<SpendLedger>,
    pub session_locks: Arc<SessionLockMap>,

    // ── Auth ──────────────────────────────────────────────────────────
    /// SHA-256 of the API token; `None` leaves the protected routes open.
    pub api_token_hash: Option<Vec<u8>>,
}

//! Application bootstrap: state construction and background loops.

use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};

use cg_domain::config::{Config, ConfigSeverity};
use cg_providers::{GeminiClient, GenerativeBackend};
use cg_sessions::{LifecycleManager, SessionResolver, SessionStore, TranscriptStore};

use crate::runtime::{CostEstimator, ExchangeOrchestrator, SessionLockMap, SpendLedger};
use crate::state::AppState;

/// Validate the config and build the full [`AppState`] against the Gemini
/// backend described by `[llm]`.
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    let mut has_errors = false;
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Error => {
                tracing::error!(field = %issue.field, "{}", issue.message);
                has_errors = true;
            }
            ConfigSeverity::Warning => {
                tracing::warn!(field = %issue.field, "{}", issue.message);
            }
        }
    }
    if has_errors {
        anyhow::bail!("config validation failed; fix the errors above and restart");
    }

    // ── Upstream backend ─────────────────────────────────────────────
    let backend = GeminiClient::from_config(&config.llm).context("initializing Gemini client")?;
    tracing::info!(
        provider = %config.llm.provider_id,
        model = %config.llm.model,
        key_configured = backend.has_api_key(),
        "upstream client ready"
    );

    Ok(build_app_state_with_backend(config, Arc::new(backend)))
}

/// Build the state around an arbitrary backend.  No validation.
pub fn build_app_state_with_backend(
    config: Arc<Config>,
    backend: Arc<dyn GenerativeBackend>,
) -> AppState {
    // ── Session management ───────────────────────────────────────────
    let sessions = Arc::new(SessionStore::new());
    let resolver = Arc::new(SessionResolver::new(
        sessions.clone(),
        config.sessions.client_token,
    ));
    let lifecycle = Arc::new(LifecycleManager::from_config(&config.sessions));
    let transcripts = Arc::new(TranscriptStore::new());
    tracing::info!(
        client_token = config.sessions.client_token,
        idle_ttl_minutes = config.sessions.idle_ttl_minutes,
        "session management ready"
    );

    // ── Spend ────────────────────────────────────────────────────────
    let spend = Arc::new(SpendLedger::new(config.spend.clone()));
    let session_locks = Arc::new(SessionLockMap::new());
    tracing::info!(ceiling_usd = spend.ceiling_usd(), "spend ledger ready");

    let exchange = Arc::new(ExchangeOrchestrator::new(
        resolver.clone(),
        transcripts.clone(),
        backend,
        CostEstimator::new(config.llm.pricing),
        spend.clone(),
        session_locks.clone(),
    ));

    // ── API token (read once, hashed for constant-time comparison) ──
    let api_token_hash = crate::api::auth::token_hash(&config.server);

    AppState {
        config,
        exchange,
        sessions,
        resolver,
        lifecycle,
        transcripts,
        spend,
        session_locks,
        api_token_hash,
    }
}

/// Evict idle sessions along with their transcripts, ledger entries and
/// locks.  Returns the number evicted.
pub fn sweep_idle_sessions(state: &AppState, now: DateTime<Utc>) -> usize {
    let evicted = state.sessions.evict_idle(&state.lifecycle, now);
    if !evicted.is_empty() {
        state.transcripts.remove_many(&evicted);
        state.spend.remove_many(&evicted);
        state.session_locks.remove_many(&evicted);
    }
    evicted.len()
}

/// Spawn all periodic background tasks.
pub fn spawn_background_tasks(state: &AppState) {
    // ── Periodic idle-session eviction + lock pruning ────────────────
    {
        let state = state.clone();
        let every = std::time::Duration::from_secs(state.config.sessions.sweep_interval_secs.max(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                sweep_idle_sessions(&state, Utc::now());
                state.session_locks.prune_idle();
            }
        });
    }
}

//! The exchange orchestrator.
//!
//! One inbound chat call moves through a fixed sequence of stages:
//!
//! ```text
//! ReceivedRequest → SessionResolved → HistoryLoaded → UpstreamCalled
//!   → CandidateChosen → HistoryUpdated → CostCharged → Responded
//! ```
//!
//! Any failure short-circuits to a terminal error.  The transcript append
//! and the cost charge are committed before the ceiling check, so an
//! exchange that crosses the ceiling stays recorded and charged even though
//! its reply is withheld.

use std::sync::Arc;

use axum::http::StatusCode;

use cg_domain::error::Error;
use cg_domain::trace::TraceEvent;
use cg_domain::Turn;
use cg_providers::{build_request, select_candidate, GenerateContentRequest, GenerativeBackend};
use cg_sessions::{RequestContext, SessionId, SessionResolver, TranscriptStore};

use super::cost::{CostEstimate, CostEstimator};
use super::session_lock::SessionLockMap;
use super::spend::SpendLedger;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Stages, outcome, errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Progress of a single exchange.  Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExchangeStage {
    ReceivedRequest,
    SessionResolved,
    HistoryLoaded,
    UpstreamCalled,
    CandidateChosen,
    HistoryUpdated,
    CostCharged,
    Responded,
}

/// A completed exchange.
#[derive(Debug, Clone)]
pub struct ExchangeOutcome {
    pub session_id: SessionId,
    pub text: String,
    pub estimate: CostEstimate,
    pub accumulated_usd: f64,
}

/// Terminal failure of an exchange.  `Display` is the caller-facing message.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("invalid request: {0}")]
    BadRequest(String),

    /// Non-success status or transport failure from the generative API.
    #[error("API Error: {status}")]
    Upstream { status: u16, message: String },

    #[error("Error: No suitable response found.")]
    NoCandidate,

    #[error("Spending limit exceeded. Please upgrade your plan or try later.")]
    OverLimit {
        accumulated_usd: f64,
        ceiling_usd: f64,
    },

    /// Detail is logged, never returned to the caller.
    #[error("Error: Unable to reach Gemini API. Check your network and API key.")]
    Unexpected(String),
}

impl ExchangeError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::NoCandidate | Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::OverLimit { .. } => StatusCode::PAYMENT_REQUIRED,
        }
    }
}

impl From<Error> for ExchangeError {
    fn from(e: Error) -> Self {
        match e {
            Error::Upstream {
                status, message, ..
            } => Self::Upstream { status, message },
            Error::Timeout(message) => Self::Upstream {
                status: StatusCode::GATEWAY_TIMEOUT.as_u16(),
                message,
            },
            Error::Http(message) => Self::Upstream {
                status: StatusCode::BAD_GATEWAY.as_u16(),
                message,
            },
            other => Self::Unexpected(other.to_string()),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Orchestrator
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct ExchangeOrchestrator {
    resolver: Arc<SessionResolver>,
    transcripts: Arc<TranscriptStore>,
    backend: Arc<dyn GenerativeBackend>,
    estimator: CostEstimator,
    spend: Arc<SpendLedger>,
    locks: Arc<SessionLockMap>,
}

impl ExchangeOrchestrator {
    pub fn new(
        resolver: Arc<SessionResolver>,
        transcripts: Arc<TranscriptStore>,
        backend: Arc<dyn GenerativeBackend>,
        estimator: CostEstimator,
        spend: Arc<SpendLedger>,
        locks: Arc<SessionLockMap>,
    ) -> Self {
        Self {
            resolver,
            transcripts,
            backend,
            estimator,
            spend,
            locks,
        }
    }

    /// Run one exchange for the session attached to `ctx`.
    pub async fn run(
        &self,
        ctx: &mut RequestContext,
        inbound: GenerateContentRequest,
    ) -> Result<ExchangeOutcome, ExchangeError> {
        let mut stage = ExchangeStage::ReceivedRequest;
        let result = self.run_stages(&mut stage, ctx, inbound).await;

        if let Err(e) = &result {
            let session_id = ctx.session_id().map(SessionId::to_string).unwrap_or_default();
            match e {
                ExchangeError::Unexpected(detail) => tracing::error!(
                    session_id = %session_id,
                    stage = ?stage,
                    error = %detail,
                    "exchange failed"
                ),
                ExchangeError::Upstream { status, message } => tracing::warn!(
                    session_id = %session_id,
                    stage = ?stage,
                    provider = %self.backend.provider_id(),
                    model = %self.backend.model(),
                    status,
                    error = %message,
                    "upstream call failed"
                ),
                other => tracing::info!(
                    session_id = %session_id,
                    stage = ?stage,
                    error = %other,
                    "exchange rejected"
                ),
            }
        }
        result
    }

    async fn run_stages(
        &self,
        stage: &mut ExchangeStage,
        ctx: &mut RequestContext,
        inbound: GenerateContentRequest,
    ) -> Result<ExchangeOutcome, ExchangeError> {
        let user_text = new_user_text(inbound)?;

        let session_id = self.resolver.resolve(ctx);
        advance(stage, ExchangeStage::SessionResolved, &session_id);

        // Held until the charge is committed.
        let permit = self
            .locks
            .acquire(&session_id)
            .await
            .map_err(|e| ExchangeError::Unexpected(e.to_string()))?;

        // A session already past the ceiling never reaches upstream.
        let already = self.spend.accumulated(&session_id);
        if self.spend.is_over_limit(already) {
            return Err(self.over_limit(&session_id, already));
        }

        let history = self.transcripts.history(&session_id);
        advance(stage, ExchangeStage::HistoryLoaded, &session_id);

        let request = build_request(&history, &user_text);
        let response = self.backend.generate(&request).await?;
        advance(stage, ExchangeStage::UpstreamCalled, &session_id);

        let selected = select_candidate(&response.candidates).ok_or(ExchangeError::NoCandidate)?;
        advance(stage, ExchangeStage::CandidateChosen, &session_id);

        self.transcripts.append_exchange(
            &session_id,
            Turn::user(user_text),
            Turn::assistant(selected.text.clone()),
        );
        advance(stage, ExchangeStage::HistoryUpdated, &session_id);

        let estimate = self.estimator.estimate(&request, &selected.text);
        let accumulated_usd = self.spend.charge(&session_id, &estimate);
        advance(stage, ExchangeStage::CostCharged, &session_id);

        // The upstream call may outlast the idle TTL; keep the registry
        // entry in step with the transcript and ledger just written.
        self.resolver.keep_alive(&session_id);
        drop(permit);

        // Charged and recorded either way; only the reply is withheld.
        if self.spend.is_over_limit(accumulated_usd) {
            return Err(self.over_limit(&session_id, accumulated_usd));
        }

        advance(stage, ExchangeStage::Responded, &session_id);
        Ok(ExchangeOutcome {
            session_id,
            text: selected.text,
            estimate,
            accumulated_usd,
        })
    }

    fn over_limit(&self, session_id: &SessionId, accumulated_usd: f64) -> ExchangeError {
        let ceiling_usd = self.spend.ceiling_usd();
        TraceEvent::SpendLimitExceeded {
            session_id: session_id.to_string(),
            accumulated_usd,
            ceiling_usd,
        }
        .emit();
        ExchangeError::OverLimit {
            accumulated_usd,
            ceiling_usd,
        }
    }
}

fn advance(stage: &mut ExchangeStage, next: ExchangeStage, session_id: &SessionId) {
    debug_assert!(next > *stage, "exchange stage moved backwards: {stage:?} -> {next:?}");
    *stage = next;
    tracing::debug!(session_id = %session_id, stage = ?next, "exchange stage");
}

/// The new user utterance: text of the last inbound turn, which must have
/// role `user`.  Earlier inbound turns are ignored; the server transcript is
/// the history of record.
fn new_user_text(inbound: GenerateContentRequest) -> Result<String, ExchangeError> {
    let last = inbound
        .contents
        .into_iter()
        .last()
        .ok_or_else(|| ExchangeError::BadRequest("contents must not be empty".into()))?;

    if last.role != "user" {
        return Err(ExchangeError::BadRequest(format!(
            "last turn must have role \"user\", got {:?}",
            last.role
        )));
    }

    last.joined_text()
        .ok_or_else(|| ExchangeError::BadRequest("last turn has no text".into()))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

//! Core runtime: cost estimation, the per-session spend ledger, per-session
//! locks and the exchange orchestrator that ties them to the upstream call.
//!
//! Entry point: [`ExchangeOrchestrator::run`] takes a request context and
//! the inbound `contents` and returns the reply text or an [`ExchangeError`].

pub mod cost;
pub mod exchange;
pub mod session_lock;
pub mod spend;

pub use cost::{CostEstimate, CostEstimator};
pub use exchange::{ExchangeError, ExchangeOrchestrator, ExchangeOutcome, ExchangeStage};
pub use session_lock::SessionLockMap;
pub use spend::{SpendLedger, SpendStatus};

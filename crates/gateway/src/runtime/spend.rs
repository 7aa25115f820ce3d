//! Per-session spend ledger and ceiling enforcement.
//!
//! [`SpendLedger`] is an in-memory, lock-protected map from session to
//! accumulated estimated cost.  Totals only grow; the only removal path is
//! the idle-session sweep, which drops the session entirely.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Serialize;

use cg_domain::config::SpendConfig;
use cg_domain::trace::TraceEvent;
use cg_sessions::SessionId;

use super::cost::CostEstimate;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Snapshot of one session's spend.
#[derive(Debug, Clone, Serialize)]
pub struct SpendStatus {
    pub session_id: SessionId,
    pub accumulated_usd: f64,
    pub over_limit: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SpendLedger
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// In-memory per-session spend tracker.
///
/// Thread-safe (uses `parking_lot::RwLock`).  Callers serialize exchanges of
/// one session through the session lock, so a charge and the ceiling check
/// that follows it see a consistent total.
pub struct SpendLedger {
    config: SpendConfig,
    totals: RwLock<HashMap<SessionId, f64>>,
}

impl SpendLedger {
    pub fn new(config: SpendConfig) -> Self {
        Self {
            config,
            totals: RwLock::new(HashMap::new()),
        }
    }

    pub fn ceiling_usd(&self) -> f64 {
        self.config.ceiling_usd
    }

    /// Add the estimate's cost to the session total and return the new total.
    pub fn charge(&self, session_id: &SessionId, estimate: &CostEstimate) -> f64 {
        let cost = estimate.total_usd();
        debug_assert!(cost >= 0.0, "negative cost estimate");

        let accumulated = {
            let mut totals = self.totals.write();
            let total = totals.entry(session_id.clone()).or_insert(0.0);
            *total += cost;
            *total
        };

        TraceEvent::CostCharged {
            session_id: session_id.to_string(),
            input_tokens: estimate.input_tokens,
            output_tokens: estimate.output_tokens,
            cost_usd: cost,
            accumulated_usd: accumulated,
        }
        .emit();

        accumulated
    }

    /// Accumulated cost for a session (0 when it has never been charged).
    pub fn accumulated(&self, session_id: &SessionId) -> f64 {
        self.totals.read().get(session_id).copied().unwrap_or(0.0)
    }

    /// Strictly above the ceiling.
    pub fn is_over_limit(&self, accumulated_usd: f64) -> bool {
        accumulated_usd > self.config.ceiling_usd
    }

    /// All charged sessions, ordered by id.
    pub fn snapshot(&self) -> Vec<SpendStatus> {
        let mut statuses: Vec<SpendStatus> = self
            .totals
            .read()
            .iter()
            .map(|(id, total)| SpendStatus {
                session_id: id.clone(),
                accumulated_usd: *total,
                over_limit: self.is_over_limit(*total),
            })
            .collect();
        statuses.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        statuses
    }

    /// Drop the ledger entries of evicted sessions.
    pub fn remove_many(&self, session_ids: &[SessionId]) {
        let mut totals = self.totals.write();
        for id in session_ids {
            totals.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(ceiling_usd: f64) -> SpendLedger {
        SpendLedger::new(SpendConfig { ceiling_usd })
    }

    fn estimate(input_cost_usd: f64, output_cost_usd: f64) -> CostEstimate {
        CostEstimate {
            input_tokens: 0,
            output_tokens: 0,
            input_cost_usd,
            output_cost_usd,
        }
    }

    #[test]
    fn unknown_session_has_zero_spend() {
        assert_eq!(ledger(2.0).accumulated(&SessionId::generate()), 0.0);
    }

    #[test]
    fn ceiling_is_strict() {
        let l = ledger(2.0);
        assert!(!l.is_over_limit(2.0));
        assert!(l.is_over_limit(2.01));
    }

    #[test]
    fn charges_accumulate_monotonically_as_exact_sum() {
        let l = ledger(2.0);
        let id = SessionId::generate();
        let charges = [(0.1, 0.2), (0.0, 0.0), (0.000_014, 0.000_063), (0.3, 0.05)];

        let mut expected = 0.0;
        let mut previous = 0.0;
        for (input, output) in charges {
            let est = estimate(input, output);
            expected += est.total_usd();
            let total = l.charge(&id, &est);
            assert!(total >= previous);
            assert_eq!(total, expected);
            previous = total;
        }
        assert_eq!(l.accumulated(&id), expected);
    }

    #[test]
    fn charge_crossing_ceiling_is_over_limit() {
        let l = ledger(2.0);
        let id = SessionId::generate();
        let total = l.charge(&id, &estimate(1.0, 1.01));
        assert!(l.is_over_limit(total));
    }

    #[test]
    fn sessions_are_charged_independently() {
        let l = ledger(2.0);
        let a = SessionId::generate();
        let b = SessionId::generate();
        l.charge(&a, &estimate(1.5, 1.0));
        l.charge(&b, &estimate(0.5, 0.0));

        let snapshot = l.snapshot();
        assert_eq!(snapshot.len(), 2);
        let status_a = snapshot.iter().find(|s| s.session_id == a).unwrap();
        let status_b = snapshot.iter().find(|s| s.session_id == b).unwrap();
        assert!(status_a.over_limit);
        assert!(!status_b.over_limit);
    }

    #[test]
    fn remove_many_drops_entries() {
        let l = ledger(2.0);
        let id = SessionId::generate();
        l.charge(&id, &estimate(0.5, 0.5));
        l.remove_many(&[id.clone()]);
        assert_eq!(l.accumulated(&id), 0.0);
        assert!(l.snapshot().is_empty());
    }
}

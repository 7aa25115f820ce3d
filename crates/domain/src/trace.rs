use serde::Serialize;

/// Structured trace events emitted across all chatgate crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    SessionResolved {
        session_id: String,
        is_new: bool,
    },
    TranscriptAppend {
        session_id: String,
        lines: usize,
        total: usize,
    },
    UpstreamRequest {
        provider: String,
        model: String,
        turns: usize,
        duration_ms: u64,
        status: Option<u16>,
    },
    CandidateSelected {
        index: usize,
        candidates: usize,
        safety_score: Option<f64>,
    },
    CostCharged {
        session_id: String,
        input_tokens: u64,
        output_tokens: u64,
        cost_usd: f64,
        accumulated_usd: f64,
    },
    SpendLimitExceeded {
        session_id: String,
        accumulated_usd: f64,
        ceiling_usd: f64,
    },
    SessionsEvicted {
        count: usize,
        remaining: usize,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "cg_event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_is_tagged() {
        let ev = TraceEvent::SessionsEvicted {
            count: 2,
            remaining: 5,
        };
        let v: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(v["event"], "SessionsEvicted");
        assert_eq!(v["count"], 2);
    }
}

use serde::{Deserialize, Serialize};

/// Per-session spend ceiling.
///
/// A session whose accumulated estimated cost strictly exceeds
/// `ceiling_usd` is refused.  The ledger never resets for a live session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendConfig {
    #[serde(default = "d_ceiling")]
    pub ceiling_usd: f64,
}

impl Default for SpendConfig {
    fn default() -> Self {
        Self {
            ceiling_usd: d_ceiling(),
        }
    }
}

fn d_ceiling() -> f64 {
    2.0
}

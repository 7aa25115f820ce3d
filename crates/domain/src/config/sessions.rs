use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Sessions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Session identity and lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Request/response header carrying the session token.
    #[serde(default = "d_header")]
    pub header: String,

    /// Accept a caller-supplied token and echo the session token back.
    /// When `false`, every request is its own session.
    #[serde(default = "d_true")]
    pub client_token: bool,

    /// Sessions idle for longer than this are evicted together with their
    /// transcript and spend ledger entry.
    #[serde(default = "d_60u32")]
    pub idle_ttl_minutes: u32,

    /// How often the eviction sweep runs.
    #[serde(default = "d_60u64")]
    pub sweep_interval_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            header: d_header(),
            client_token: true,
            idle_ttl_minutes: 60,
            sweep_interval_secs: 60,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_header() -> String {
    "x-session-id".into()
}
fn d_true() -> bool {
    true
}
fn d_60u32() -> u32 {
    60
}
fn d_60u64() -> u64 {
    60
}

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Upstream generative API
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider ID used in logs and error messages.
    #[serde(default = "d_provider_id")]
    pub provider_id: String,
    #[serde(default = "d_base_url")]
    pub base_url: String,
    #[serde(default = "d_model")]
    pub model: String,
    /// Upper bound on a single upstream call, connect through body.
    #[serde(default = "d_20000u")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub pricing: ModelPricing,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider_id: d_provider_id(),
            base_url: d_base_url(),
            model: d_model(),
            timeout_ms: 20_000,
            auth: AuthConfig::default(),
            pricing: ModelPricing::default(),
        }
    }
}

/// Pricing per million tokens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModelPricing {
    /// Dollars per 1 million input (prompt) tokens.
    #[serde(default = "d_input_price")]
    pub input_per_1m: f64,
    /// Dollars per 1 million output (completion) tokens.
    #[serde(default = "d_output_price")]
    pub output_per_1m: f64,
}

impl Default for ModelPricing {
    fn default() -> Self {
        Self {
            input_per_1m: d_input_price(),
            output_per_1m: d_output_price(),
        }
    }
}

impl ModelPricing {
    /// Dollar cost of `tokens` input tokens.
    pub fn input_cost(&self, tokens: u64) -> f64 {
        tokens as f64 / 1_000_000.0 * self.input_per_1m
    }

    /// Dollar cost of `tokens` output tokens.
    pub fn output_cost(&self, tokens: u64) -> f64 {
        tokens as f64 / 1_000_000.0 * self.output_per_1m
    }
}

/// Where the upstream API key comes from.
///
/// `key` wins over `env`.  Prefer `env`; a plaintext `key` is logged as a
/// warning at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Env var containing the key.
    #[serde(default = "d_key_env")]
    pub env: Option<String>,
    /// Direct key (for config-only setups).
    #[serde(default)]
    pub key: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            env: d_key_env(),
            key: None,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_provider_id() -> String {
    "gemini".into()
}
fn d_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn d_model() -> String {
    "gemini-pro".into()
}
fn d_20000u() -> u64 {
    20_000
}
fn d_input_price() -> f64 {
    7.0
}
fn d_output_price() -> f64 {
    21.0
}
fn d_key_env() -> Option<String> {
    Some("GEMINI_API_KEY".into())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pricing_small_counts_are_not_truncated() {
        let pricing = ModelPricing::default();
        // 1000 input tokens @ $7/1M = $0.007
        assert!((pricing.input_cost(1000) - 0.007).abs() < 1e-12);
        // 10 output tokens @ $21/1M = $0.00021
        assert!((pricing.output_cost(10) - 0.00021).abs() < 1e-12);
    }

    #[test]
    fn pricing_zero_tokens() {
        let pricing = ModelPricing::default();
        assert_eq!(pricing.input_cost(0), 0.0);
        assert_eq!(pricing.output_cost(0), 0.0);
    }

    #[test]
    fn llm_config_defaults() {
        let cfg: LlmConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.model, "gemini-pro");
        assert_eq!(cfg.timeout_ms, 20_000);
        assert_eq!(cfg.auth.env.as_deref(), Some("GEMINI_API_KEY"));
        assert!((cfg.pricing.input_per_1m - 7.0).abs() < 1e-12);
        assert!((cfg.pricing.output_per_1m - 21.0).abs() < 1e-12);
    }

    #[test]
    fn pricing_deserializes() {
        let toml_str = r#"
            model = "gemini-1.5-flash"

            [pricing]
            input_per_1m = 0.35
            output_per_1m = 1.05
        "#;
        let cfg: LlmConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.model, "gemini-1.5-flash");
        assert!((cfg.pricing.input_per_1m - 0.35).abs() < 1e-12);
        assert!((cfg.pricing.output_per_1m - 1.05).abs() < 1e-12);
    }
}

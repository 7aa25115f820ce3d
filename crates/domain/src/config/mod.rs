mod llm;
mod observability;
mod server;
mod sessions;
mod spend;

pub use llm::*;
pub use observability::*;
pub use server::*;
pub use sessions::*;
pub use spend::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub spend: SpendConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl ConfigError {
    fn error(field: &str, message: &str) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: &str, message: &str) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError::error("server.port", "port must be greater than 0"));
        }
        if self.server.host.is_empty() {
            errors.push(ConfigError::error("server.host", "host must not be empty"));
        }
        if self.server.api_token_env.is_empty() {
            errors.push(ConfigError::error(
                "server.api_token_env",
                "api_token_env must not be empty",
            ));
        }
        if self.server.max_concurrent_requests == 0 {
            errors.push(ConfigError::error(
                "server.max_concurrent_requests",
                "must be greater than 0",
            ));
        }

        if self.llm.base_url.is_empty() {
            errors.push(ConfigError::error("llm.base_url", "base_url must not be empty"));
        }
        if self.llm.model.is_empty() {
            errors.push(ConfigError::error("llm.model", "model must not be empty"));
        }
        if self.llm.timeout_ms == 0 {
            errors.push(ConfigError::error("llm.timeout_ms", "timeout must be greater than 0"));
        }
        if !(self.llm.pricing.input_per_1m > 0.0) {
            errors.push(ConfigError::error(
                "llm.pricing.input_per_1m",
                "price must be a positive number",
            ));
        }
        if !(self.llm.pricing.output_per_1m > 0.0) {
            errors.push(ConfigError::error(
                "llm.pricing.output_per_1m",
                "price must be a positive number",
            ));
        }
        if self.llm.auth.key.is_none() && self.llm.auth.env.is_none() {
            errors.push(ConfigError::warning(
                "llm.auth",
                "no API key source configured; upstream calls will be rejected",
            ));
        }

        if !(self.spend.ceiling_usd > 0.0) {
            errors.push(ConfigError::error(
                "spend.ceiling_usd",
                "ceiling must be a positive number",
            ));
        }

        if self.sessions.header.is_empty() {
            errors.push(ConfigError::error("sessions.header", "header must not be empty"));
        }
        if self.sessions.idle_ttl_minutes == 0 {
            errors.push(ConfigError::error(
                "sessions.idle_ttl_minutes",
                "idle TTL must be greater than 0",
            ));
        }
        let idle_ttl_ms = u64::from(self.sessions.idle_ttl_minutes) * 60_000;
        if self.sessions.idle_ttl_minutes > 0 && self.llm.timeout_ms >= idle_ttl_ms {
            errors.push(ConfigError::error(
                "llm.timeout_ms",
                "upstream timeout must be shorter than sessions.idle_ttl_minutes",
            ));
        }
        if self.sessions.sweep_interval_secs == 0 {
            errors.push(ConfigError::error(
                "sessions.sweep_interval_secs",
                "sweep interval must be greater than 0",
            ));
        }

        if !(0.0..=1.0).contains(&self.observability.sample_rate) {
            errors.push(ConfigError::error(
                "observability.sample_rate",
                "sample_rate must be between 0.0 and 1.0",
            ));
        }

        // CORS: warn if wildcard is used.
        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            errors.push(ConfigError::warning(
                "server.cors.allowed_origins",
                "wildcard \"*\" allows all origins (not recommended for production)",
            ));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(issues: &[ConfigError], field: &str) -> bool {
        issues
            .iter()
            .any(|i| i.field == field && i.severity == ConfigSeverity::Error)
    }

    #[test]
    fn default_config_is_valid() {
        let issues = Config::default().validate();
        assert!(
            issues.iter().all(|i| i.severity == ConfigSeverity::Warning),
            "unexpected errors: {issues:?}"
        );
    }

    #[test]
    fn zero_ceiling_is_rejected() {
        let mut cfg = Config::default();
        cfg.spend.ceiling_usd = 0.0;
        assert!(has_error(&cfg.validate(), "spend.ceiling_usd"));
    }

    #[test]
    fn nan_price_is_rejected() {
        let mut cfg = Config::default();
        cfg.llm.pricing.output_per_1m = f64::NAN;
        assert!(has_error(&cfg.validate(), "llm.pricing.output_per_1m"));
    }

    #[test]
    fn zero_port_and_ttl_are_rejected() {
        let mut cfg = Config::default();
        cfg.server.port = 0;
        cfg.sessions.idle_ttl_minutes = 0;
        let issues = cfg.validate();
        assert!(has_error(&issues, "server.port"));
        assert!(has_error(&issues, "sessions.idle_ttl_minutes"));
    }

    #[test]
    fn timeout_must_fit_inside_idle_ttl() {
        let mut cfg = Config::default();
        cfg.sessions.idle_ttl_minutes = 1;
        cfg.llm.timeout_ms = 60_000;
        assert!(has_error(&cfg.validate(), "llm.timeout_ms"));

        cfg.llm.timeout_ms = 59_999;
        assert!(!has_error(&cfg.validate(), "llm.timeout_ms"));
    }

    #[test]
    fn empty_api_token_env_is_rejected() {
        let mut cfg = Config::default();
        cfg.server.api_token_env.clear();
        assert!(has_error(&cfg.validate(), "server.api_token_env"));
    }

    #[test]
    fn wildcard_cors_is_a_warning() {
        let mut cfg = Config::default();
        cfg.server.cors.allowed_origins = vec!["*".into()];
        let issues = cfg.validate();
        assert!(issues.iter().any(|i| i.field == "server.cors.allowed_origins"
            && i.severity == ConfigSeverity::Warning));
    }

    #[test]
    fn display_includes_severity_tag() {
        let issue = ConfigError::error("llm.model", "model must not be empty");
        assert_eq!(issue.to_string(), "[ERROR] llm.model: model must not be empty");
    }
}

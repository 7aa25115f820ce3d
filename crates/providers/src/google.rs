//! Google Gemini client.
//!
//! Calls the Gemini `generateContent` API.  Auth is via an API key passed as
//! a query parameter (`key={api_key}`); the key is redacted in every log line.

use std::time::{Duration, Instant};

use cg_domain::config::LlmConfig;
use cg_domain::error::{Error, Result};
use cg_domain::trace::TraceEvent;

use crate::traits::GenerativeBackend;
use crate::types::{GenerateContentRequest, GenerateContentResponse};
use crate::util::{from_reqwest, redact_url_key, resolve_api_key};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A [`GenerativeBackend`] for the Google Gemini API.
pub struct GeminiClient {
    id: String,
    base_url: String,
    model: String,
    /// `None` when no key could be resolved at startup; every call then
    /// fails with [`Error::Auth`] instead of aborting boot.
    api_key: Option<String>,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a client from the deserialized `[llm]` config.
    pub fn from_config(cfg: &LlmConfig) -> Result<Self> {
        let api_key = match resolve_api_key(&cfg.auth) {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::warn!(
                    provider_id = %cfg.provider_id,
                    error = %e,
                    "no upstream API key resolved; chat requests will fail until one is configured"
                );
                None
            }
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            id: cfg.provider_id.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            api_key,
            client,
        })
    }

    /// Whether an API key was resolved.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn generate_url(&self, api_key: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, api_key
        )
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate(&self, req: &GenerateContentRequest) -> Result<GenerateContentResponse> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Auth(format!("no API key configured for {}", self.id)))?;
        let url = self.generate_url(api_key);

        tracing::debug!(
            provider = %self.id,
            url = %redact_url_key(&url),
            turns = req.contents.len(),
            "gemini generateContent request"
        );

        let started = Instant::now();
        let resp = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(req)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        let resp_text = resp.text().await.map_err(from_reqwest)?;

        TraceEvent::UpstreamRequest {
            provider: self.id.clone(),
            model: self.model.clone(),
            turns: req.contents.len(),
            duration_ms: started.elapsed().as_millis() as u64,
            status: Some(status.as_u16()),
        }
        .emit();

        if !status.is_success() {
            return Err(Error::Upstream {
                provider: self.id.clone(),
                status: status.as_u16(),
                message: resp_text,
            });
        }

        Ok(serde_json::from_str(&resp_text)?)
    }

    fn provider_id(&self) -> &str {
        &self.id
    }

    fn model(&self) -> &str {
        &self.model
    }
}

use cg_domain::error::Result;

use crate::types::{GenerateContentRequest, GenerateContentResponse};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core backend trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The upstream generative API: submit contents, receive candidates with
/// safety ratings.
///
/// Implementations return [`cg_domain::error::Error::Upstream`] for non-success
/// HTTP statuses and [`cg_domain::error::Error::Timeout`] /
/// [`cg_domain::error::Error::Http`] for transport failures.
#[async_trait::async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Send one `generateContent` request and wait for the full response.
    async fn generate(&self, req: &GenerateContentRequest) -> Result<GenerateContentResponse>;

    /// A unique identifier for this backend instance.
    fn provider_id(&self) -> &str;

    /// The model requests are sent to.
    fn model(&self) -> &str;
}

//! Chat endpoint.
//!
//! - `POST /gemini`: `{ contents: [...] }` in, `{ text }` out

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use cg_providers::GenerateContentRequest;
use cg_sessions::RequestContext;

use super::api_error;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct GenerateReply {
    pub text: String,
}

/// Run one exchange.  With client tokens enabled, the session token is read
/// from the configured header and echoed on every response that resolved a
/// session, including rejections.
pub async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<GenerateContentRequest>, JsonRejection>,
) -> Response {
    let sessions = &state.config.sessions;
    let mut ctx = if sessions.client_token {
        RequestContext::with_token(
            headers
                .get(sessions.header.as_str())
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned),
        )
    } else {
        RequestContext::new()
    };

    let mut response = match body {
        Err(rejection) => api_error(
            StatusCode::BAD_REQUEST,
            format!("invalid request: {}", rejection.body_text()),
        ),
        Ok(Json(inbound)) => match state.exchange.run(&mut ctx, inbound).await {
            Ok(outcome) => Json(GenerateReply { text: outcome.text }).into_response(),
            Err(e) => api_error(e.status(), e.to_string()),
        },
    };

    if sessions.client_token {
        if let Some(id) = ctx.session_id() {
            match (
                HeaderName::from_bytes(sessions.header.as_bytes()),
                HeaderValue::from_str(id.as_str()),
            ) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().insert(name, value);
                }
                _ => tracing::warn!(header = %sessions.header, "invalid session header name"),
            }
        }
    }

    response
}

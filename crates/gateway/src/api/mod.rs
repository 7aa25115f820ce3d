pub mod auth;
pub mod gemini;
pub mod sessions;
pub mod spend;

use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the full API router.
///
/// Routes are split into **public** (chat and liveness) and **protected**
/// (session and spend introspection, gated behind the bearer-token
/// middleware).  The chat endpoint is served at both `/gemini` and
/// `/Gemini`; the chat UI uses the capitalized path.
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        // Chat (core exchange)
        .route("/gemini", post(gemini::generate))
        .route("/Gemini", post(gemini::generate))
        // Liveness
        .route("/health", get(health));

    let protected = Router::new()
        // Session introspection
        .route("/v1/sessions", get(sessions::list_sessions))
        .route("/v1/sessions/:id", get(sessions::get_session))
        // Spend ledger
        .route("/v1/spend", get(spend::get_spend))
        .route_layer(middleware::from_fn_with_state(state, auth::require_api_token));

    public.merge(protected)
}

/// `GET /health`
async fn health(axum::extract::State(state): axum::extract::State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "sessions": state.sessions.len(),
    }))
}

/// Build a standardized JSON error response: `{ "error": "<message>" }`.
pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

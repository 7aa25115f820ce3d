//! Session introspection API endpoints.
//!
//! - `GET /v1/sessions`: live sessions
//! - `GET /v1/sessions/:id`: transcript and spend for one session

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use cg_sessions::SessionId;

use super::api_error;
use crate::state::AppState;

/// `GET /v1/sessions`
pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let mut sessions = state.sessions.list();
    sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Json(serde_json::json!({
        "sessions": sessions,
        "count": sessions.len(),
    }))
}

/// `GET /v1/sessions/:id`
pub async fn get_session(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(entry) = SessionId::parse(&id).and_then(|sid| state.sessions.get(&sid)) else {
        return api_error(StatusCode::NOT_FOUND, format!("session not found: {id}"));
    };

    let turns = state.transcripts.get(&entry.session_id).unwrap_or_default();
    let accumulated_usd = state.spend.accumulated(&entry.session_id);

    Json(serde_json::json!({
        "session_id": entry.session_id,
        "created_at": entry.created_at,
        "last_seen": entry.last_seen,
        "turns": turns,
        "accumulated_usd": accumulated_usd,
        "over_limit": state.spend.is_over_limit(accumulated_usd),
    }))
    .into_response()
}

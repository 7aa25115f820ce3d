//! Spend ledger introspection.
//!
//! - `GET /v1/spend`: accumulated cost per session and the ceiling

use axum::extract::State;
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

/// `GET /v1/spend`
pub async fn get_spend(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "ceiling_usd": state.spend.ceiling_usd(),
        "sessions": state.spend.snapshot(),
    }))
}

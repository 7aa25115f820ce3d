//! Bearer-token guard for the session and spend endpoints.
//!
//! The token comes from `server.api_token` or the env var named by
//! `server.api_token_env` (default `CG_API_TOKEN`) and is read once at
//! startup; only its SHA-256 digest is kept in `AppState`.  Session ids are
//! the chat callers' only credential, so listing them is gated.  Without a
//! token the endpoints stay open and a warning is logged at boot.

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use cg_domain::config::ServerConfig;

use super::api_error;
use crate::state::AppState;

/// Resolve the configured token and hash it.  `None` means auth is off.
pub fn token_hash(server: &ServerConfig) -> Option<Vec<u8>> {
    let env_var = &server.api_token_env;
    let token = server
        .api_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(|t| ("config".to_string(), t.to_string()))
        .or_else(|| {
            std::env::var(env_var)
                .ok()
                .filter(|t| !t.is_empty())
                .map(|t| (format!("env:{env_var}"), t))
        });

    match token {
        Some((source, t)) => {
            tracing::info!(source = %source, "API bearer-token auth enabled");
            Some(Sha256::digest(t.as_bytes()).to_vec())
        }
        None => {
            tracing::warn!(
                "API bearer-token auth DISABLED; session ids are readable by anyone who can \
                 reach the port. Set server.api_token or the {env_var} env var"
            );
            None
        }
    }
}

/// Reject requests without `Authorization: Bearer <token>`.  Attach with
/// `axum::middleware::from_fn_with_state`.
pub async fn require_api_token(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.api_token_hash.as_deref() else {
        return next.run(req).await;
    };

    let provided = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("");

    // Fixed-length digests keep the comparison independent of token length.
    let provided = Sha256::digest(provided.as_bytes());
    if !bool::from(provided.as_slice().ct_eq(expected)) {
        return api_error(StatusCode::UNAUTHORIZED, "invalid or missing API token");
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_token_wins_over_env() {
        let server = ServerConfig {
            api_token: Some("from-config".into()),
            api_token_env: "CG_TEST_AUTH_SHOULD_NOT_BE_READ".into(),
            ..Default::default()
        };
        assert_eq!(
            token_hash(&server),
            Some(Sha256::digest(b"from-config").to_vec())
        );
    }

    #[test]
    fn env_token_is_read() {
        let var = "CG_TEST_AUTH_ENV_TOKEN_4321";
        std::env::set_var(var, "from-env");
        let server = ServerConfig {
            api_token_env: var.into(),
            ..Default::default()
        };
        assert_eq!(token_hash(&server), Some(Sha256::digest(b"from-env").to_vec()));
        std::env::remove_var(var);
    }

    #[test]
    fn empty_sources_disable_auth() {
        let server = ServerConfig {
            api_token: Some(String::new()),
            api_token_env: "CG_TEST_AUTH_UNSET_9876".into(),
            ..Default::default()
        };
        assert_eq!(token_hash(&server), None);
    }
}

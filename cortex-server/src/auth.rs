//! `X-API-KEY` auth middleware for mutating routes (`spec.md` §6). Reads
//! from `AppState` rather than a global, per the "configuration is a value"
//! design note in `spec.md` §9.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use cortex_core::error::Error;

use crate::error::ApiError;
use crate::state::AppState;

const API_KEY_HEADER: &str = "x-api-key";

/// Rejects the request with `unauthenticated` if `X-API-KEY` is absent, or
/// `permission_denied` if it does not match the configured key. A server
/// started with no `api_key` configured skips the check entirely (local
/// development / the CLI's in-process embedding of this crate).
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        None => Err(Error::Unauthenticated.into()),
        Some(key) if key == expected => Ok(next.run(request).await),
        Some(_) => Err(ApiError::from(Error::PermissionDenied(
            "invalid API key".to_string(),
        ))),
    }
}

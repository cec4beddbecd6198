//! Maps `cortex_core::error::Error` onto the HTTP error envelope of
//! `spec.md` §6: `{"error": {"code", "message", "details"}}`. Handlers
//! return `Result<_, ApiError>` and rely on `?` to convert.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use cortex_core::error::Error;

/// Thin wrapper so this crate can implement `IntoResponse` for a foreign
/// error type.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

fn status_for(code: &str) -> StatusCode {
    match code {
        "invalid_argument" => StatusCode::BAD_REQUEST,
        "unauthenticated" => StatusCode::UNAUTHORIZED,
        "permission_denied" => StatusCode::FORBIDDEN,
        "not_found" => StatusCode::NOT_FOUND,
        "conflict" => StatusCode::CONFLICT,
        "resource_exhausted" => StatusCode::TOO_MANY_REQUESTS,
        "timeout" => StatusCode::GATEWAY_TIMEOUT,
        "unavailable" => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.code();
        let status = status_for(code);

        // `internal` never carries the raw Display of the error to the
        // client; it is logged with a correlation id instead (`spec.md`
        // §7).
        let (message, details) = if code == "internal" {
            let correlation_id = Uuid::new_v4();
            tracing::error!(error = %self.0, %correlation_id, "internal error");
            (
                "an internal error occurred".to_string(),
                Some(json!({ "correlation_id": correlation_id.to_string() })),
            )
        } else {
            (self.0.to_string(), None)
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
                "details": details,
            }
        }));

        (status, body).into_response()
    }
}

//! Axum HTTP surface implementing `spec.md` §6 on top of `cortex-core`.
//! The teacher ships an MCP/stdio server with no HTTP framework; this
//! crate adopts `axum` + `tower`/`tower-http` from the broader example
//! pack instead (see `DESIGN.md`).

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use std::time::Duration;

use axum::routing::{get, patch, post};
use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the full application router. Mutating routes go through the
/// `X-API-KEY` middleware; reads do not (`spec.md` §6). `request_timeout`
/// is the per-request deadline for synchronous endpoints (`spec.md` §5);
/// background ingest jobs are not subject to it.
#[must_use]
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let mutating = Router::new()
        .route("/v1/ingest", post(routes::ingest::ingest))
        .route("/v1/memories", post(routes::memories::force_create))
        .route(
            "/v1/memories/{id}",
            patch(routes::memories::patch_memory).delete(routes::memories::delete_memory),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    let read_only = Router::new()
        .route("/v1/ingest/{job_id}", get(routes::ingest::get_ingest_status))
        .route("/v1/memories", get(routes::memories::list_memories))
        .route("/v1/memories/{id}", get(routes::memories::get_memory))
        .route("/v1/context", post(routes::context::context))
        .route("/v1/dump", get(routes::dump::dump))
        .route("/health", get(routes::health::health));

    mutating.merge(read_only).with_state(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(request_timeout)),
    )
}

//! End-to-end exercise of the HTTP surface against an in-process router
//! backed by a real temp-file store, no network socket involved.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use cortex_core::adapters::{StubAnalyzer, StubEmbedder};
use cortex_core::jobs::{JobManager, JobManagerConfig};
use cortex_core::manager::MemoryManager;
use cortex_core::normalize::Normalizer;
use cortex_core::retrieval::RetrievalEngine;
use cortex_core::synthesizer::Synthesizer;
use cortex_server::{build_router, AppState};

async fn test_app() -> (axum::Router, tempfile::TempDir) {
    let (store, dir) = test_utils::temp_store().await;
    let store: Arc<dyn cortex_core::store::Store> = Arc::new(store);
    let analyzer: Arc<dyn cortex_core::adapters::Analyzer> = Arc::new(StubAnalyzer);
    let embedder: Arc<dyn cortex_core::adapters::Embedder> = Arc::new(StubEmbedder::new(16));

    let memory_manager = Arc::new(MemoryManager::new(
        Arc::clone(&store),
        Arc::clone(&analyzer),
        Arc::clone(&embedder),
        Normalizer::new(),
        0.95,
    ));
    let job_manager = Arc::new(JobManager::new(
        Arc::clone(&store),
        Arc::clone(&memory_manager),
        JobManagerConfig::default(),
    ));
    job_manager.spawn_workers();

    let retrieval_engine = Arc::new(RetrievalEngine::new(
        Arc::clone(&store),
        Arc::clone(&embedder),
        Synthesizer::new(Arc::clone(&analyzer)),
        4_000,
        std::time::Duration::from_secs(24 * 60 * 60),
    ));

    let state = AppState {
        store,
        memory_manager,
        job_manager,
        retrieval_engine,
        api_key: Some("test-key".to_string()),
    };

    (build_router(state, std::time::Duration::from_secs(30)), dir)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn force_create_requires_api_key() {
    let (app, _dir) = test_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/v1/memories")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "user_id": "u1",
                "scope": "global",
                "content": "The user's favorite color is blue.",
                "memory_type": "fact",
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn force_create_then_get_round_trips() {
    let (app, _dir) = test_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/v1/memories")
        .header("content-type", "application/json")
        .header("x-api-key", "test-key")
        .body(Body::from(
            json!({
                "user_id": "u1",
                "scope": "global",
                "content": "The user's favorite color is blue.",
                "memory_type": "fact",
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["created_count"], 1);
    let memory_id = body["memory_ids"][0].as_str().unwrap();

    let request = Request::builder()
        .method("GET")
        .uri(format!("/v1/memories/{memory_id}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["content"], "The user's favorite color is blue.");
}

#[tokio::test]
async fn get_memory_returns_404_for_unknown_id() {
    let (app, _dir) = test_app().await;

    let request = Request::builder()
        .method("GET")
        .uri(format!("/v1/memories/{}", uuid::Uuid::new_v4()))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn ingest_then_poll_job_status() {
    let (app, _dir) = test_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/v1/ingest")
        .header("content-type", "application/json")
        .header("x-api-key", "test-key")
        .body(Body::from(
            json!({
                "user_id": "u1",
                "text": "I live in Tokyo.",
                "scope": "global",
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    let job_id = body["job_id"].as_str().unwrap().to_string();

    // The background worker runs async; poll a few times for it to finish.
    let mut status = String::new();
    for _ in 0..20 {
        let request = Request::builder()
            .method("GET")
            .uri(format!("/v1/ingest/{job_id}"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let body = body_json(response).await;
        status = body["status"].as_str().unwrap().to_string();
        if status == "done" || status == "failed" {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    assert_eq!(status, "done");
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _dir) = test_app().await;
    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

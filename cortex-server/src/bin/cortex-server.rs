//! Antigravity Cortex HTTP server binary.

use std::sync::Arc;

use tracing::info;

use cortex_core::adapters::{StubAnalyzer, StubEmbedder};
use cortex_core::config::Config;
use cortex_core::jobs::{JobManager, JobManagerConfig};
use cortex_core::manager::MemoryManager;
use cortex_core::normalize::Normalizer;
use cortex_core::retrieval::RetrievalEngine;
use cortex_core::synthesizer::Synthesizer;

use cortex_server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    info!("starting Antigravity Cortex server");

    let config = Config::from_env();

    let backing_store = cortex_storage::CortexStore::connect_url(&config.database_url, "").await?;
    backing_store.initialize_schema().await?;
    let store: Arc<dyn cortex_core::store::Store> = Arc::new(backing_store);

    let analyzer: Arc<dyn cortex_core::adapters::Analyzer> = Arc::new(StubAnalyzer);
    let embedder: Arc<dyn cortex_core::adapters::Embedder> =
        Arc::new(StubEmbedder::new(config.embedding_dim));

    let memory_manager = Arc::new(MemoryManager::new(
        Arc::clone(&store),
        Arc::clone(&analyzer),
        Arc::clone(&embedder),
        Normalizer::new(),
        config.upsert_threshold,
    ));

    let job_manager = Arc::new(JobManager::new(
        Arc::clone(&store),
        Arc::clone(&memory_manager),
        JobManagerConfig {
            worker_pool_size: config.worker_pool_size,
            per_user_concurrency: config.per_user_concurrency,
            ..JobManagerConfig::default()
        },
    ));
    job_manager.spawn_workers();

    let synthesizer = Synthesizer::new(Arc::clone(&analyzer));
    let retrieval_engine = Arc::new(RetrievalEngine::new(
        Arc::clone(&store),
        Arc::clone(&embedder),
        synthesizer,
        config.context_budget_chars,
        config.state_freshness_window,
    ));

    let state = AppState {
        store,
        memory_manager,
        job_manager,
        retrieval_engine,
        api_key: config.api_key.clone(),
    };

    let app = cortex_server::build_router(state, config.request_timeout);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

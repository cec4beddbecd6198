//! Shared scaffolding for the Criterion benchmarks in `benches/`.

use std::future::Future;
use std::sync::Arc;

use criterion::async_executor::AsyncExecutor;

use cortex_core::adapters::{Analyzer, Embedder, StubAnalyzer, StubEmbedder};
use cortex_core::manager::MemoryManager;
use cortex_core::normalize::Normalizer;
use cortex_core::retrieval::RetrievalEngine;
use cortex_core::store::Store;
use cortex_core::synthesizer::Synthesizer;

/// A `current_thread` tokio runtime per iteration, for code under
/// benchmark that uses `tokio::spawn` or other runtime features.
pub struct TokioExecutor;

impl AsyncExecutor for TokioExecutor {
    fn block_on<T>(&self, future: impl Future<Output = T>) -> T {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("failed to build tokio runtime")
            .block_on(future)
    }
}

/// Build a `MemoryManager` and `RetrievalEngine` over a fresh on-disk
/// store, returning the backing temp directory so it outlives the
/// benchmark iteration.
pub async fn setup_pipeline() -> (
    Arc<MemoryManager>,
    Arc<RetrievalEngine>,
    tempfile::TempDir,
) {
    let (store, dir) = test_utils::temp_store().await;
    let store: Arc<dyn Store> = Arc::new(store);
    let analyzer: Arc<dyn Analyzer> = Arc::new(StubAnalyzer);
    let embedder: Arc<dyn Embedder> = Arc::new(StubEmbedder::new(16));

    let memory_manager = Arc::new(MemoryManager::new(
        Arc::clone(&store),
        Arc::clone(&analyzer),
        Arc::clone(&embedder),
        Normalizer::new(),
        0.95,
    ));
    let retrieval_engine = Arc::new(RetrievalEngine::new(
        Arc::clone(&store),
        Arc::clone(&embedder),
        Synthesizer::new(Arc::clone(&analyzer)),
        4_000,
        std::time::Duration::from_secs(24 * 60 * 60),
    ));

    (memory_manager, retrieval_engine, dir)
}

/// A handful of short, distinct sentences to seed memories or drive
/// ingestion without repeating the exact same content (which would hit
/// the semantic-upsert path instead of inserting new rows).
#[must_use]
pub fn sample_statements(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("The user mentioned fact number {i} during a benchmark run."))
        .collect()
}

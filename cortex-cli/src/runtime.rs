//! Wires up the same component graph as the `cortex-server` binary, but
//! in-process: no HTTP layer, just `cortex-core` and `cortex-storage`
//! talking directly to whichever subcommand is running.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use cortex_core::adapters::{Analyzer, Embedder, StubAnalyzer, StubEmbedder};
use cortex_core::config::Config;
use cortex_core::jobs::{JobManager, JobManagerConfig};
use cortex_core::manager::MemoryManager;
use cortex_core::normalize::Normalizer;
use cortex_core::retrieval::RetrievalEngine;
use cortex_core::store::Store;
use cortex_core::synthesizer::Synthesizer;
use cortex_storage::CortexStore;

pub struct Components {
    pub store: Arc<dyn Store>,
    pub memory_manager: Arc<MemoryManager>,
    pub job_manager: Arc<JobManager>,
    pub retrieval_engine: Arc<RetrievalEngine>,
}

impl Components {
    pub async fn build(config: &Config) -> anyhow::Result<Self> {
        let backing_store = CortexStore::connect_url(&config.database_url, "").await?;
        backing_store.initialize_schema().await?;
        let store: Arc<dyn Store> = Arc::new(backing_store);

        let analyzer: Arc<dyn Analyzer> = Arc::new(StubAnalyzer);
        let embedder: Arc<dyn Embedder> = Arc::new(StubEmbedder::new(config.embedding_dim));

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

        let retrieval_engine = Arc::new(RetrievalEngine::new(
            Arc::clone(&store),
            Arc::clone(&embedder),
            Synthesizer::new(Arc::clone(&analyzer)),
            config.context_budget_chars,
            config.state_freshness_window,
        ));

        Ok(Self {
            store,
            memory_manager,
            job_manager,
            retrieval_engine,
        })
    }
}

/// Parse a lowercase CLI token (`"global"`, `"fact"`, ...) into one of
/// the closed model enums via its existing `Deserialize` impl, so the
/// wire format and the CLI vocabulary never drift apart.
pub fn parse_enum<T: DeserializeOwned>(token: &str) -> anyhow::Result<T> {
    serde_json::from_value(serde_json::Value::String(token.to_lowercase()))
        .map_err(|_| anyhow::anyhow!("invalid value: {token}"))
}

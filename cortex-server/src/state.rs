//! Shared application state handed to every handler. Built once at startup
//! and cloned per-request (every field is an `Arc` or cheap to copy),
//! mirroring `zeroaltitude-vestige`'s dashboard `AppState` shape.

use std::sync::Arc;

use cortex_core::jobs::JobManager;
use cortex_core::manager::MemoryManager;
use cortex_core::retrieval::RetrievalEngine;
use cortex_core::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub memory_manager: Arc<MemoryManager>,
    pub job_manager: Arc<JobManager>,
    pub retrieval_engine: Arc<RetrievalEngine>,
    pub api_key: Option<String>,
}

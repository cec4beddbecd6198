//! The Retrieval & Ranking engine: hybrid search, multi-factor scoring,
//! temporal cutoff, and scope-prioritized merge (`spec.md` §4.5).

pub mod engine;
pub mod scoring;

pub use engine::{ContextRequest, ContextResult, RetrievalEngine};

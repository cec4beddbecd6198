//! The Analyzer and Embedder capabilities: two narrow contracts wrapping
//! the LLM and embedding providers (`spec.md` §1, §4.2, §4.3).

pub mod analyzer;
pub mod embedder;
pub mod stub;

#[cfg(feature = "http-adapters")]
pub mod http;

pub use analyzer::{AnalyzeHints, AnalyzeOutput, Analyzer, Chunk};
pub use embedder::Embedder;
pub use stub::{StubAnalyzer, StubEmbedder};

//! The Analyzer capability: `Analyze(text, hints) -> {chunks, warnings}`
//! (`spec.md` §4.2).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::MemoryType;

/// One atomic subject-predicate-object statement extracted from raw text,
/// with its classification already assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub memory_type: MemoryType,
    pub tags: Vec<String>,
    pub related_entities: Vec<(String, String)>,
    pub importance: u8,
    pub confidence: f32,
    pub event_time: Option<DateTime<Utc>>,
}

/// Additional context passed to the Analyzer to steer extraction, e.g. the
/// scope/agent the ingest targets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeHints {
    pub user_id: String,
    pub source: Option<String>,
}

/// Output of one `Analyze` call.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOutput {
    pub chunks: Vec<Chunk>,
    pub warnings: Vec<String>,
}

/// The capability that turns raw natural-language text into atomic,
/// classified chunks. Nondeterministic in production; tests must use a
/// deterministic stub (`spec.md` §9 "LLM determinism").
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Decide whether `text` carries retention-worthy signal and, if so,
    /// split and classify it. Returning zero chunks means "nothing worth
    /// retaining" (skipped), not an error.
    ///
    /// # Errors
    /// Returns an error only when the underlying model is unreachable
    /// (a transient failure the Job Manager may retry). Malformed model
    /// output is not an error: it is reported as zero chunks plus a
    /// warning.
    async fn analyze(&self, text: &str, hints: &AnalyzeHints) -> Result<AnalyzeOutput>;

    /// Summarize ranked evidence for the Synthesizer, using a fixed
    /// instruction template. Returns `(summary, bullets)`.
    async fn summarize(&self, instruction: &str, evidence: &[String]) -> Result<(String, Vec<String>)>;
}

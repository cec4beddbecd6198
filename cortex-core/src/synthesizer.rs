//! Thin formatter turning ranked evidence into a summary for downstream
//! agents (`spec.md` §4.6). Degrades gracefully when the Analyzer is down:
//! this is the one place in the pipeline explicitly allowed to swallow a
//! dependency failure instead of propagating it.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::adapters::Analyzer;
use crate::model::Memory;

const INSTRUCTION: &str = "summarize for downstream agent";

/// One piece of evidence, paired with the score it was ranked by.
#[derive(Debug, Clone, Serialize)]
pub struct EvidenceItem {
    pub memory_id: Uuid,
    pub score: f32,
}

/// Result of one synthesis call.
#[derive(Debug, Clone, Serialize)]
pub struct Synthesis {
    pub summary: String,
    pub bullets: Vec<String>,
}

pub struct Synthesizer {
    analyzer: Arc<dyn Analyzer>,
}

impl Synthesizer {
    #[must_use]
    pub fn new(analyzer: Arc<dyn Analyzer>) -> Self {
        Self { analyzer }
    }

    /// Summarize `ranked` evidence. Never fails: on Analyzer error, falls
    /// back to a deterministic concatenation of each memory's `content`.
    pub async fn synthesize(&self, ranked: &[Memory]) -> Synthesis {
        let evidence: Vec<String> = ranked.iter().map(|m| m.content.clone()).collect();

        match self.analyzer.summarize(INSTRUCTION, &evidence).await {
            Ok((summary, bullets)) => Synthesis { summary, bullets },
            Err(_) => Synthesis {
                summary: evidence.join(" "),
                bullets: evidence,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::stub::StubAnalyzer;
    use crate::model::{InputChannel, MemoryType, Scope};
    use chrono::Utc;
    use std::collections::{BTreeMap, BTreeSet};

    fn memory(content: &str) -> Memory {
        let now = Utc::now();
        Memory {
            id: Uuid::new_v4(),
            user_id: "u1".into(),
            scope: Scope::Global,
            agent_id: None,
            content: content.to_string(),
            content_hash: "h".into(),
            embedding: None,
            memory_type: MemoryType::Fact,
            tags: BTreeSet::new(),
            related_entities: BTreeMap::new(),
            importance: 3,
            confidence: 0.7,
            source: None,
            input_channel: InputChannel::Chat,
            event_time: None,
            valid_from: now,
            valid_to: None,
            supersedes_id: None,
            last_accessed: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn synthesizes_via_analyzer() {
        let synth = Synthesizer::new(Arc::new(StubAnalyzer));
        let out = synth
            .synthesize(&[memory("I live in Tokyo"), memory("I work remotely")])
            .await;
        assert_eq!(out.bullets.len(), 2);
        assert!(out.summary.contains("Tokyo"));
    }

    #[tokio::test]
    async fn degrades_on_empty_evidence() {
        let synth = Synthesizer::new(Arc::new(StubAnalyzer));
        let out = synth.synthesize(&[]).await;
        assert!(out.summary.is_empty());
        assert!(out.bullets.is_empty());
    }
}

//! Deterministic, dependency-free implementations of [`Analyzer`] and
//! [`Embedder`], used as the service's default and by every test
//! (`spec.md` §9 "LLM determinism" design note). They are not a quality
//! stand-in for a real LLM/embedding provider; they exist so the pipeline
//! is fully exercisable without one.

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::analyzer::{AnalyzeHints, AnalyzeOutput, Analyzer, Chunk};
use super::embedder::Embedder;
use crate::error::Result;
use crate::model::MemoryType;

/// Splits text on sentence terminators and classifies each sentence with a
/// small set of keyword rules. Sentences with no retention-worthy content
/// (too short, or pure filler) are dropped.
pub struct StubAnalyzer;

#[async_trait]
impl Analyzer for StubAnalyzer {
    async fn analyze(&self, text: &str, _hints: &AnalyzeHints) -> Result<AnalyzeOutput> {
        let mut chunks = Vec::new();
        let mut warnings = Vec::new();

        for sentence in split_sentences(text) {
            let trimmed = sentence.trim();
            if trimmed.split_whitespace().count() < 2 {
                continue;
            }
            chunks.push(classify(trimmed));
        }

        if chunks.is_empty() && !text.trim().is_empty() {
            warnings.push("no retention-worthy statements found".to_string());
        }

        Ok(AnalyzeOutput { chunks, warnings })
    }

    async fn summarize(
        &self,
        _instruction: &str,
        evidence: &[String],
    ) -> Result<(String, Vec<String>)> {
        let bullets: Vec<String> = evidence.to_vec();
        let summary = bullets.join(" ");
        Ok((summary, bullets))
    }
}

fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['.', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn classify(sentence: &str) -> Chunk {
    let lower = sentence.to_lowercase();
    let memory_type = if lower.contains("exhausted")
        || lower.contains("tired")
        || lower.contains("feeling")
        || lower.contains("i'm ")
    {
        MemoryType::State
    } else if lower.contains("met ")
        || lower.contains("went to")
        || lower.contains("attended")
        || lower.contains("on 20")
    {
        MemoryType::Episode
    } else if lower.contains("always") || lower.contains("never") || lower.contains("policy") {
        MemoryType::Policy
    } else {
        MemoryType::Fact
    };

    Chunk {
        content: sentence.to_string(),
        memory_type,
        tags: Vec::new(),
        related_entities: Vec::new(),
        importance: crate::model::memory::DEFAULT_IMPORTANCE,
        confidence: crate::model::memory::DEFAULT_CONFIDENCE,
        event_time: None,
    }
}

/// Deterministic pseudo-embedding derived from a hash of the input text, so
/// cosine similarity between repeated or near-identical strings is
/// meaningful in tests without a real embedding model.
pub struct StubEmbedder {
    dimension: usize,
}

impl StubEmbedder {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut seed = hasher.finish();

        let mut v = Vec::with_capacity(self.dimension);
        for _ in 0..self.dimension {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            v.push(((seed >> 16) as f32) / 32_768.0 - 1.0);
        }
        normalize(v)
    }
}

fn normalize(v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm <= f32::EPSILON {
        return v;
    }
    v.into_iter().map(|x| x / norm).collect()
}

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_text_yields_zero_chunks() {
        let out = StubAnalyzer.analyze("", &AnalyzeHints::default()).await.unwrap();
        assert!(out.chunks.is_empty());
    }

    #[tokio::test]
    async fn filler_only_text_yields_zero_chunks_with_warning() {
        let out = StubAnalyzer.analyze("uh", &AnalyzeHints::default()).await.unwrap();
        assert!(out.chunks.is_empty());
        assert!(!out.warnings.is_empty());
    }

    #[tokio::test]
    async fn classifies_state_vs_fact() {
        let out = StubAnalyzer
            .analyze("I'm exhausted. I live in Tokyo.", &AnalyzeHints::default())
            .await
            .unwrap();
        assert_eq!(out.chunks.len(), 2);
        assert_eq!(out.chunks[0].memory_type, MemoryType::State);
        assert_eq!(out.chunks[1].memory_type, MemoryType::Fact);
    }

    #[tokio::test]
    async fn embedder_preserves_order_and_cardinality() {
        let embedder = StubEmbedder::new(16);
        let out = embedder
            .embed(&["a".to_string(), "b".to_string(), "c".to_string()])
            .await
            .unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].len(), 16);
    }

    #[tokio::test]
    async fn embedder_is_deterministic() {
        let embedder = StubEmbedder::new(16);
        let a = embedder.embed(&["same text".to_string()]).await.unwrap();
        let b = embedder.embed(&["same text".to_string()]).await.unwrap();
        assert_eq!(a, b);
    }
}

//! The context-synthesis and structured-query entry points
//! (`spec.md` §4.5). All I/O (embedding, Store round-trips) is a
//! suspension point; the merge/score/cutoff steps in between are pure.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::adapters::Embedder;
use crate::error::{Error, Result};
use crate::model::{Memory, MemoryType, Scope};
use crate::store::{Cursor, MemoryFilter, Store};
use crate::synthesizer::Synthesizer;

use super::scoring;

/// Input to `POST /v1/context` (`spec.md` §4.5).
#[derive(Debug, Clone)]
pub struct ContextRequest {
    pub user_id: String,
    pub query: String,
    pub app_context: Option<serde_json::Value>,
    pub scope: Scope,
    pub agent_id: Option<String>,
    pub k: usize,
    pub include_global: bool,
    pub include_retired: bool,
    pub return_evidence: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvidenceItem {
    pub memory_id: Uuid,
    pub score: f32,
}

/// Output of one `context()` call.
#[derive(Debug, Clone, Serialize)]
pub struct ContextResult {
    pub memories: Vec<Memory>,
    pub summary: String,
    pub bullets: Vec<String>,
    pub evidence: Option<Vec<EvidenceItem>>,
}

/// Hybrid-search, rank, and synthesize ranked evidence for downstream
/// agents. Holds the Store/Embedder/Synthesizer it was built with, plus
/// the tunables from [`crate::config::Config`] that the scoring math and
/// cutoff need.
pub struct RetrievalEngine {
    store: Arc<dyn Store>,
    embedder: Arc<dyn Embedder>,
    synthesizer: Synthesizer,
    context_budget_chars: usize,
    state_freshness_window: Duration,
    half_life_days: f64,
}

impl RetrievalEngine {
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        embedder: Arc<dyn Embedder>,
        synthesizer: Synthesizer,
        context_budget_chars: usize,
        state_freshness_window: Duration,
    ) -> Self {
        Self {
            store,
            embedder,
            synthesizer,
            context_budget_chars,
            state_freshness_window,
            half_life_days: scoring::DEFAULT_HALF_LIFE_DAYS,
        }
    }

    /// `GET /v1/memories` — a plain structured query with no ranking.
    ///
    /// # Errors
    /// Propagates Store errors.
    pub async fn query(&self, filter: &MemoryFilter) -> Result<(Vec<Memory>, Option<Cursor>)> {
        self.store.list_memories(filter).await
    }

    /// `POST /v1/context` — the 8-step RAG pipeline of `spec.md` §4.5.
    ///
    /// # Errors
    /// Propagates Embedder/Store errors. Best-effort `touch_last_accessed`
    /// failures are swallowed, matching the spec's "failure here does not
    /// fail the retrieval" clause.
    pub async fn context(&self, request: ContextRequest) -> Result<ContextResult> {
        if request.k == 0 {
            return Err(Error::InvalidArgument("k must be >= 1".to_string()));
        }

        // Step 1: embed query + serialized app_context.
        let context_suffix = request
            .app_context
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_default();
        let text = format!("{} {}", request.query, context_suffix);
        let mut embeddings = self.embedder.embed(&[text]).await?;
        let embedding = embeddings
            .pop()
            .ok_or_else(|| Error::Internal("embedder returned no vectors".to_string()))?;

        // Step 2: candidate fetch.
        let k_fetch = (3 * request.k).max(30);
        let candidates = self.fetch_candidates(&request, &embedding, k_fetch).await?;

        // Step 3: temporal filter.
        let now = Utc::now();
        let survivors: Vec<_> = candidates
            .into_iter()
            .filter(|c| self.passes_temporal_filter(c, request.include_retired, now))
            .collect();

        // Step 4: score.
        let mut scored: Vec<(Memory, f32)> = survivors
            .into_iter()
            .map(|c| {
                let s = scoring::score(
                    c.similarity,
                    c.memory.importance,
                    c.memory.confidence,
                    c.memory.memory_type,
                    c.memory.updated_at,
                    now,
                    self.half_life_days,
                );
                (c.memory, s)
            })
            .collect();

        // Step 5: scope merge & tie-break.
        scored.sort_by(|(ma, sa), (mb, sb)| Self::compare(ma, *sa, mb, *sb));

        // Step 6: cutoff.
        let mut selected: Vec<(Memory, f32)> = Vec::new();
        let mut total_chars = 0usize;
        for (memory, score) in scored {
            if selected.len() >= request.k {
                break;
            }
            total_chars += memory.content.len();
            selected.push((memory, score));
            if total_chars > self.context_budget_chars {
                break;
            }
        }

        // Step 7: touch (best-effort).
        let ids: Vec<Uuid> = selected.iter().map(|(m, _)| m.id).collect();
        if let Err(err) = self.store.touch_last_accessed(&ids, now).await {
            tracing::warn!(error = %err, "touch_last_accessed failed; continuing");
        }

        let memories: Vec<Memory> = selected.iter().map(|(m, _)| m.clone()).collect();

        // Step 8: optional synthesis.
        let synthesis = self.synthesizer.synthesize(&memories).await;
        let evidence = request.return_evidence.then(|| {
            selected
                .iter()
                .map(|(m, s)| EvidenceItem {
                    memory_id: m.id,
                    score: *s,
                })
                .collect()
        });

        Ok(ContextResult {
            memories,
            summary: synthesis.summary,
            bullets: synthesis.bullets,
            evidence,
        })
    }

    async fn fetch_candidates(
        &self,
        request: &ContextRequest,
        embedding: &[f32],
        k_fetch: usize,
    ) -> Result<Vec<crate::store::Candidate>> {
        match request.scope {
            Scope::Agent => {
                let mut primary = self
                    .store
                    .search_candidates(
                        &request.user_id,
                        Scope::Agent,
                        request.agent_id.as_deref(),
                        embedding,
                        k_fetch,
                        request.include_retired,
                    )
                    .await?;
                if request.include_global {
                    let global = self
                        .store
                        .search_candidates(
                            &request.user_id,
                            Scope::Global,
                            None,
                            embedding,
                            k_fetch,
                            request.include_retired,
                        )
                        .await?;
                    primary.extend(global);
                }
                Ok(primary)
            }
            Scope::Global => {
                self.store
                    .search_candidates(
                        &request.user_id,
                        Scope::Global,
                        None,
                        embedding,
                        k_fetch,
                        request.include_retired,
                    )
                    .await
            }
        }
    }

    fn passes_temporal_filter(
        &self,
        candidate: &crate::store::Candidate,
        include_retired: bool,
        now: chrono::DateTime<Utc>,
    ) -> bool {
        let memory = &candidate.memory;
        if !include_retired && !memory.is_current() {
            return false;
        }
        if memory.memory_type == MemoryType::State {
            let age = now.signed_duration_since(memory.updated_at);
            let window = chrono::Duration::from_std(self.state_freshness_window)
                .unwrap_or(chrono::Duration::zero());
            // At most one current `state` exists per lineage (invariant 5),
            // so "no fresher state exists in the same lineage" is vacuously
            // true for the surviving current row; an expired one is simply
            // demoted out of evidence.
            if age > window {
                return false;
            }
        }
        true
    }

    /// Descending score; agent-scope beats global at equal score; then
    /// higher importance, newer `updated_at`, lexicographic `id`.
    fn compare(a: &Memory, score_a: f32, b: &Memory, score_b: f32) -> Ordering {
        score_b
            .partial_cmp(&score_a)
            .unwrap_or(Ordering::Equal)
            .then_with(|| scope_rank(b.scope).cmp(&scope_rank(a.scope)))
            .then_with(|| b.importance.cmp(&a.importance))
            .then_with(|| b.updated_at.cmp(&a.updated_at))
            .then_with(|| a.id.cmp(&b.id))
    }
}

fn scope_rank(scope: Scope) -> u8 {
    match scope {
        Scope::Agent => 1,
        Scope::Global => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InputChannel, MemoryType, Scope};
    use std::collections::{BTreeMap, BTreeSet};

    fn memory(scope: Scope, importance: u8, updated_at: chrono::DateTime<Utc>) -> Memory {
        Memory {
            id: Uuid::new_v4(),
            user_id: "u1".into(),
            scope,
            agent_id: if scope == Scope::Agent {
                Some("finance".into())
            } else {
                None
            },
            content: "x".into(),
            content_hash: "h".into(),
            embedding: None,
            memory_type: MemoryType::Fact,
            tags: BTreeSet::new(),
            related_entities: BTreeMap::new(),
            importance,
            confidence: 0.7,
            source: None,
            input_channel: InputChannel::Chat,
            event_time: None,
            valid_from: updated_at,
            valid_to: None,
            supersedes_id: None,
            last_accessed: None,
            created_at: updated_at,
            updated_at,
        }
    }

    #[test]
    fn agent_scope_beats_global_at_equal_score() {
        let now = Utc::now();
        let agent = memory(Scope::Agent, 3, now);
        let global = memory(Scope::Global, 3, now);
        assert_eq!(
            RetrievalEngine::compare(&agent, 0.5, &global, 0.5),
            Ordering::Less
        );
    }

    #[test]
    fn higher_score_wins_regardless_of_scope() {
        let now = Utc::now();
        let agent = memory(Scope::Agent, 3, now);
        let global = memory(Scope::Global, 3, now);
        assert_eq!(
            RetrievalEngine::compare(&agent, 0.1, &global, 0.9),
            Ordering::Greater
        );
    }

    #[test]
    fn ties_break_on_importance_then_recency_then_id() {
        let now = Utc::now();
        let earlier = now - chrono::Duration::hours(1);
        let low_importance = memory(Scope::Global, 2, now);
        let high_importance = memory(Scope::Global, 4, earlier);
        assert_eq!(
            RetrievalEngine::compare(&low_importance, 0.5, &high_importance, 0.5),
            Ordering::Greater
        );
    }
}

//! The Memory Manager: the ingestion pipeline that decides, for each
//! candidate fact, whether it is new, a supersession, or a duplicate to
//! drop (`spec.md` §4.4).

pub mod strategy;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::adapters::{AnalyzeHints, Analyzer, Embedder};
use crate::error::{Error, Result};
use crate::model::{
    ActorType, AuditAction, AuditRecord, InputChannel, IngestResult, Memory, MemoryType, Scope,
};
use crate::normalize::Normalizer;
use crate::store::{LineageScope, Store};

use strategy::UpdateStrategy;

/// Top-k fetched for the semantic near-duplicate check; only the best
/// match is compared against `upsert_threshold` (`spec.md` §4.4).
const NEAR_DUP_SEARCH_K: usize = 5;

/// Input to one ingestion (`spec.md` §4.4).
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub user_id: String,
    pub text: String,
    pub source: Option<String>,
    pub scope: Scope,
    pub agent_id: Option<String>,
    pub event_time: Option<DateTime<Utc>>,
    pub input_channel: InputChannel,
}

/// Input to a force/manual ingest (`spec.md` §4.4.2). Bypasses the
/// Analyzer and Normalizer-driven type inference.
#[derive(Debug, Clone)]
pub struct ForceIngestRequest {
    pub user_id: String,
    pub scope: Scope,
    pub agent_id: Option<String>,
    pub content: String,
    pub memory_type: MemoryType,
    pub tags: Vec<String>,
    pub related_entities: Vec<(String, String)>,
    pub importance: u8,
    pub confidence: f32,
    pub source: Option<String>,
    pub input_channel: InputChannel,
    pub event_time: Option<DateTime<Utc>>,
    /// Opt in to the semantic near-duplicate upsert that force ingest
    /// skips by default.
    pub allow_semantic_upsert: bool,
}

enum ChunkOutcome {
    Created(Uuid),
    Updated(Uuid),
    Skipped(Uuid),
}

struct ChunkInput<'a> {
    lineage: &'a LineageScope,
    content: &'a str,
    memory_type: MemoryType,
    tags: Vec<String>,
    related_entities: Vec<(String, String)>,
    importance: u8,
    confidence: f32,
    source: Option<String>,
    input_channel: InputChannel,
    event_time: Option<DateTime<Utc>>,
    allow_semantic_dedup: bool,
}

pub struct MemoryManager {
    store: Arc<dyn Store>,
    analyzer: Arc<dyn Analyzer>,
    embedder: Arc<dyn Embedder>,
    normalizer: Normalizer,
    upsert_threshold: f32,
    chunk_timeout: Duration,
}

impl MemoryManager {
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        analyzer: Arc<dyn Analyzer>,
        embedder: Arc<dyn Embedder>,
        normalizer: Normalizer,
        upsert_threshold: f32,
    ) -> Self {
        Self {
            store,
            analyzer,
            embedder,
            normalizer,
            upsert_threshold,
            chunk_timeout: Duration::from_secs(20),
        }
    }

    /// Override the per-chunk Analyzer/Embedder deadline (`spec.md` §5,
    /// default 20s).
    #[must_use]
    pub fn with_chunk_timeout(mut self, chunk_timeout: Duration) -> Self {
        self.chunk_timeout = chunk_timeout;
        self
    }

    async fn bounded<T>(&self, fut: impl std::future::Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.chunk_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout),
        }
    }

    /// Run the full analyze → normalize → embed → dedup → upsert pipeline
    /// for one ingest request.
    ///
    /// # Errors
    /// Returns `invalid_argument` on a scope/agent_id mismatch. A Store
    /// failure on any chunk aborts the whole ingest (the caller — the Job
    /// Manager — marks the job `failed`, since prior chunks' transaction
    /// visibility cannot be guaranteed); an Analyzer/Embedder failure on a
    /// single chunk is recorded as a warning and does not abort the
    /// remaining chunks.
    #[tracing::instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestResult> {
        validate_scope(request.scope, request.agent_id.as_deref())?;

        let hints = AnalyzeHints {
            user_id: request.user_id.clone(),
            source: request.source.clone(),
        };
        let analysis = self
            .bounded(self.analyzer.analyze(&request.text, &hints))
            .await?;
        let mut result = IngestResult::default();
        result.warnings.extend(analysis.warnings);

        if analysis.chunks.is_empty() {
            return Ok(result);
        }

        let lineage = LineageScope {
            user_id: request.user_id.clone(),
            scope: request.scope,
            agent_id: request.agent_id.clone(),
        };

        for chunk in analysis.chunks {
            let strategy = UpdateStrategy::from(chunk.memory_type);
            let input = ChunkInput {
                lineage: &lineage,
                content: &chunk.content,
                memory_type: chunk.memory_type,
                tags: chunk.tags,
                related_entities: chunk.related_entities,
                importance: chunk.importance,
                confidence: chunk.confidence,
                source: request.source.clone(),
                input_channel: request.input_channel,
                event_time: chunk.event_time.or(request.event_time),
                allow_semantic_dedup: strategy.allows_semantic_dedup(),
            };

            match self.process_chunk(input).await {
                Ok(outcome) => Self::record_outcome(&mut result, outcome),
                Err(err) if err.is_store_error() => return Err(err),
                Err(err) => {
                    result
                        .warnings
                        .push(format!("chunk skipped after adapter failure: {err}"));
                }
            }
        }

        Ok(result)
    }

    /// Force/manual create, bypassing the Analyzer and type inference.
    ///
    /// # Errors
    /// Returns `invalid_argument` on a scope/agent_id mismatch, otherwise
    /// propagates Store/Embedder errors.
    #[tracing::instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn force_ingest(&self, request: ForceIngestRequest) -> Result<IngestResult> {
        validate_scope(request.scope, request.agent_id.as_deref())?;

        let lineage = LineageScope {
            user_id: request.user_id.clone(),
            scope: request.scope,
            agent_id: request.agent_id.clone(),
        };

        let input = ChunkInput {
            lineage: &lineage,
            content: &request.content,
            memory_type: request.memory_type,
            tags: request.tags,
            related_entities: request.related_entities,
            importance: request.importance,
            confidence: request.confidence,
            source: request.source,
            input_channel: request.input_channel,
            event_time: request.event_time,
            allow_semantic_dedup: request.allow_semantic_upsert
                && UpdateStrategy::from(request.memory_type).allows_semantic_dedup(),
        };

        let outcome = self.process_chunk(input).await?;
        let mut result = IngestResult::default();
        Self::record_outcome(&mut result, outcome);
        Ok(result)
    }

    fn record_outcome(result: &mut IngestResult, outcome: ChunkOutcome) {
        match outcome {
            ChunkOutcome::Created(id) => {
                result.created_count += 1;
                result.memory_ids.push(id);
            }
            ChunkOutcome::Updated(id) => {
                result.updated_count += 1;
                result.memory_ids.push(id);
            }
            ChunkOutcome::Skipped(id) => {
                result.skipped_count += 1;
                result.memory_ids.push(id);
            }
        }
    }

    async fn process_chunk(&self, input: ChunkInput<'_>) -> Result<ChunkOutcome> {
        let now = Utc::now();
        let normalized = self.normalizer.normalize(input.content, now);

        let embedding = self
            .bounded(self.embedder.embed(&[normalized.content.clone()]))
            .await?
            .pop()
            .ok_or_else(|| Error::Internal("embedder returned no vectors".to_string()))?;

        if let Some(existing) = self
            .store
            .find_current_by_hash(input.lineage, &normalized.content_hash)
            .await?
        {
            return Ok(ChunkOutcome::Skipped(existing.id));
        }

        if input.allow_semantic_dedup {
            let candidates = self
                .store
                .find_candidates(
                    input.lineage,
                    input.memory_type,
                    &embedding,
                    NEAR_DUP_SEARCH_K,
                )
                .await?;

            if let Some(top) = candidates.first() {
                if top.similarity >= self.upsert_threshold {
                    let new_memory = build_memory(
                        input.lineage,
                        &normalized.content,
                        normalized.content_hash.clone(),
                        Some(embedding),
                        input.memory_type,
                        input.tags,
                        input.related_entities,
                        input.importance,
                        input.confidence,
                        input.source,
                        input.input_channel,
                        input.event_time,
                        now,
                        Some(top.memory.id),
                    );
                    let new_id = new_memory.id;

                    self.store.supersede(top.memory.id, new_memory).await?;

                    self.store
                        .insert_audit(AuditRecord::new(
                            top.memory.id,
                            AuditAction::Retire,
                            ActorType::System,
                            serde_json::json!({ "superseded_by": new_id }),
                        ))
                        .await?;
                    self.store
                        .insert_audit(AuditRecord::new(
                            new_id,
                            AuditAction::Update,
                            ActorType::System,
                            serde_json::json!({ "supersedes": top.memory.id }),
                        ))
                        .await?;

                    return Ok(ChunkOutcome::Updated(new_id));
                }
            }
        }

        let memory = build_memory(
            input.lineage,
            &normalized.content,
            normalized.content_hash,
            Some(embedding),
            input.memory_type,
            input.tags,
            input.related_entities,
            input.importance,
            input.confidence,
            input.source,
            input.input_channel,
            input.event_time,
            now,
            None,
        );
        let id = memory.id;

        self.store.insert_memory(memory).await?;
        self.store
            .insert_audit(AuditRecord::new(
                id,
                AuditAction::Create,
                ActorType::System,
                serde_json::json!({}),
            ))
            .await?;

        Ok(ChunkOutcome::Created(id))
    }
}

#[allow(clippy::too_many_arguments)]
fn build_memory(
    lineage: &LineageScope,
    content: &str,
    content_hash: String,
    embedding: Option<Vec<f32>>,
    memory_type: MemoryType,
    tags: Vec<String>,
    related_entities: Vec<(String, String)>,
    importance: u8,
    confidence: f32,
    source: Option<String>,
    input_channel: InputChannel,
    event_time: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    supersedes_id: Option<Uuid>,
) -> Memory {
    Memory {
        id: Uuid::new_v4(),
        user_id: lineage.user_id.clone(),
        scope: lineage.scope,
        agent_id: lineage.agent_id.clone(),
        content: content.to_string(),
        content_hash,
        embedding,
        memory_type,
        tags: tags.into_iter().collect(),
        related_entities: related_entities.into_iter().collect(),
        importance,
        confidence,
        source,
        input_channel,
        event_time,
        valid_from: now,
        valid_to: None,
        supersedes_id,
        last_accessed: None,
        created_at: now,
        updated_at: now,
    }
}

fn validate_scope(scope: Scope, agent_id: Option<&str>) -> Result<()> {
    match scope {
        Scope::Agent if agent_id.is_none_or(str::is_empty) => Err(Error::InvalidArgument(
            "agent_id must be non-empty when scope = agent".to_string(),
        )),
        Scope::Global if agent_id.is_some() => Err(Error::InvalidArgument(
            "agent_id must be null when scope = global".to_string(),
        )),
        _ => Ok(()),
    }
}

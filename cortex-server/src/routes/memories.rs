//! `/v1/memories` routes: force-create, structured query, single read,
//! manual edit, delete (`spec.md` §6).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use axum::Json;
use cortex_core::error::Error;
use cortex_core::manager::ForceIngestRequest;
use cortex_core::model::{ActorType, AuditAction, AuditRecord, InputChannel, Memory, MemoryType, Scope};
use cortex_core::store::{Cursor, MemoryFilter};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ForceCreateBody {
    pub user_id: String,
    pub scope: Scope,
    pub agent_id: Option<String>,
    pub content: String,
    pub memory_type: MemoryType,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub related_entities: Vec<(String, String)>,
    #[serde(default = "default_importance")]
    pub importance: u8,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
    pub source: Option<String>,
    pub event_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub allow_semantic_upsert: bool,
}

fn default_importance() -> u8 {
    cortex_core::model::memory::DEFAULT_IMPORTANCE
}

fn default_confidence() -> f32 {
    cortex_core::model::memory::DEFAULT_CONFIDENCE
}

pub async fn force_create(
    State(state): State<AppState>,
    Json(body): Json<ForceCreateBody>,
) -> Result<(StatusCode, Json<cortex_core::model::IngestResult>), ApiError> {
    let request = ForceIngestRequest {
        user_id: body.user_id,
        scope: body.scope,
        agent_id: body.agent_id,
        content: body.content,
        memory_type: body.memory_type,
        tags: body.tags,
        related_entities: body.related_entities,
        importance: body.importance,
        confidence: body.confidence,
        source: body.source,
        input_channel: InputChannel::Manual,
        event_time: body.event_time,
        allow_semantic_upsert: body.allow_semantic_upsert,
    };

    let result = state.memory_manager.force_ingest(request).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub user_id: String,
    pub scope: Option<Scope>,
    pub agent_id: Option<String>,
    pub memory_type: Option<MemoryType>,
    pub tags: Option<String>,
    pub q: Option<String>,
    pub valid_at: Option<DateTime<Utc>>,
    pub event_time_from: Option<DateTime<Utc>>,
    pub event_time_to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub memories: Vec<Memory>,
    pub cursor: Option<String>,
}

pub async fn list_memories(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let mut filter = MemoryFilter::new(q.user_id);
    if let Some(limit) = q.limit {
        filter = filter.with_limit(limit);
    }
    if let Some(scope) = q.scope {
        filter = filter.with_scope(scope, q.agent_id);
    }
    filter.memory_type = q.memory_type;
    filter.tags = q
        .tags
        .map(|s| s.split(',').map(str::to_string).collect())
        .unwrap_or_default();
    filter.q = q.q;
    filter.valid_at = q.valid_at;
    filter.event_time_from = q.event_time_from;
    filter.event_time_to = q.event_time_to;
    filter.cursor = q.cursor.as_deref().and_then(Cursor::decode);

    let (memories, cursor) = state.retrieval_engine.query(&filter).await?;
    Ok(Json(ListResponse {
        memories,
        cursor: cursor.map(|c| c.encode()),
    }))
}

pub async fn get_memory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Memory>, ApiError> {
    let memory = state
        .store
        .get_memory(id)
        .await?
        .ok_or(Error::MemoryNotFound(id))?;
    Ok(Json(memory))
}

#[derive(Debug, Deserialize)]
pub struct PatchBody {
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub related_entities: Option<Vec<(String, String)>>,
    pub importance: Option<u8>,
    pub confidence: Option<f32>,
}

/// A manual edit is modeled as a supersession of the current memory
/// (`spec.md` §4.4.1 update strategy), so the lineage, audit trail, and
/// at-most-one-current invariant are enforced the same way an Analyzer
/// -driven update would be.
pub async fn patch_memory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PatchBody>,
) -> Result<Json<Memory>, ApiError> {
    let current = state
        .store
        .get_memory(id)
        .await?
        .ok_or(Error::MemoryNotFound(id))?;

    let now = Utc::now();
    let mut updated = current.clone();
    updated.id = Uuid::new_v4();
    updated.supersedes_id = Some(current.id);
    updated.valid_from = now;
    updated.valid_to = None;
    updated.created_at = now;
    updated.updated_at = now;
    updated.last_accessed = None;
    if let Some(content) = body.content {
        updated.content = content;
    }
    if let Some(tags) = body.tags {
        updated.tags = tags.into_iter().collect();
    }
    if let Some(related_entities) = body.related_entities {
        updated.related_entities = related_entities.into_iter().collect();
    }
    if let Some(importance) = body.importance {
        updated.importance = importance;
    }
    if let Some(confidence) = body.confidence {
        updated.confidence = confidence;
    }

    state.store.supersede(current.id, updated.clone()).await?;
    state
        .store
        .insert_audit(AuditRecord::new(
            updated.id,
            AuditAction::Update,
            ActorType::User,
            serde_json::json!({ "before": current, "after": updated }),
        ))
        .await?;

    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub hard: bool,
}

pub async fn delete_memory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(q): Query<DeleteQuery>,
) -> Result<StatusCode, ApiError> {
    let current = state
        .store
        .get_memory(id)
        .await?
        .ok_or(Error::MemoryNotFound(id))?;

    if q.hard {
        state.store.hard_delete(id).await?;
    } else {
        state.store.soft_delete(id, Utc::now()).await?;
        state
            .store
            .insert_audit(AuditRecord::new(
                id,
                AuditAction::Delete,
                ActorType::User,
                serde_json::json!({ "before": current }),
            ))
            .await?;
    }

    Ok(StatusCode::NO_CONTENT)
}

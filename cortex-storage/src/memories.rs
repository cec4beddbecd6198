//! `memories` table operations: insert, supersede, point-in-time and
//! candidate queries, soft/hard delete.

use cortex_core::error::Result;
use cortex_core::model::{Memory, MemoryType, Scope};
use cortex_core::store::{Candidate, Cursor, LineageScope, MemoryFilter};
use uuid::Uuid;

use crate::error::storage_error;
use crate::rows::{
    dt_to_text, enum_to_text, int_value, json_to_text, opt_text_value, real_value, row_to_memory,
    text_value,
};
use crate::CortexStore;

const MEMORY_COLUMNS: &str = "id, user_id, scope, agent_id, content, content_hash, embedding, \
     memory_type, tags, related_entities, importance, confidence, source, input_channel, \
     event_time, valid_from, valid_to, supersedes_id, last_accessed, created_at, updated_at";

fn memory_params(memory: &Memory) -> Result<Vec<libsql::Value>> {
    Ok(vec![
        text_value(memory.id.to_string()),
        text_value(memory.user_id.clone()),
        text_value(enum_to_text(&memory.scope)?),
        opt_text_value(memory.agent_id.clone()),
        text_value(memory.content.clone()),
        text_value(memory.content_hash.clone()),
        opt_text_value(memory.embedding.as_ref().map(json_to_text).transpose()?),
        text_value(enum_to_text(&memory.memory_type)?),
        text_value(json_to_text(&memory.tags)?),
        text_value(json_to_text(&memory.related_entities)?),
        int_value(i64::from(memory.importance)),
        real_value(f64::from(memory.confidence)),
        opt_text_value(memory.source.clone()),
        text_value(enum_to_text(&memory.input_channel)?),
        opt_text_value(memory.event_time.map(dt_to_text)),
        text_value(dt_to_text(memory.valid_from)),
        opt_text_value(memory.valid_to.map(dt_to_text)),
        opt_text_value(memory.supersedes_id.map(|id| id.to_string())),
        opt_text_value(memory.last_accessed.map(dt_to_text)),
        text_value(dt_to_text(memory.created_at)),
        text_value(dt_to_text(memory.updated_at)),
    ])
}

impl CortexStore {
    pub(crate) async fn do_insert_memory(&self, memory: Memory) -> Result<()> {
        let conn = self.connect()?;
        let sql = format!(
            "INSERT INTO memories ({MEMORY_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );
        let params = memory_params(&memory)?;
        conn.execute(&sql, libsql::params_from_iter(params))
            .await
            .map_err(|e| storage_error("failed to insert memory", e))?;
        Ok(())
    }

    pub(crate) async fn do_supersede(&self, old_id: Uuid, new_memory: Memory) -> Result<()> {
        let conn = self.connect()?;
        conn.execute("BEGIN IMMEDIATE", ())
            .await
            .map_err(|e| storage_error("failed to begin supersede transaction", e))?;

        let retire_result = conn
            .execute(
                "UPDATE memories SET valid_to = ?, updated_at = ? WHERE id = ? AND valid_to IS NULL",
                libsql::params![
                    dt_to_text(new_memory.valid_from),
                    dt_to_text(new_memory.valid_from),
                    old_id.to_string(),
                ],
            )
            .await;

        let insert_result = if retire_result.is_ok() {
            let sql = format!(
                "INSERT INTO memories ({MEMORY_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            );
            match memory_params(&new_memory) {
                Ok(params) => conn
                    .execute(&sql, libsql::params_from_iter(params))
                    .await
                    .map_err(|e| storage_error("failed to insert successor memory", e)),
                Err(e) => Err(e),
            }
        } else {
            Ok(0)
        };

        if retire_result.is_err() || insert_result.is_err() {
            let _ = conn.execute("ROLLBACK", ()).await;
            retire_result.map_err(|e| storage_error("failed to retire predecessor memory", e))?;
            insert_result?;
        }

        conn.execute("COMMIT", ())
            .await
            .map_err(|e| storage_error("failed to commit supersede transaction", e))?;
        Ok(())
    }

    pub(crate) async fn do_get_memory(&self, id: Uuid) -> Result<Option<Memory>> {
        let conn = self.connect()?;
        let sql = format!("SELECT {MEMORY_COLUMNS} FROM memories WHERE id = ?");
        let mut rows = conn
            .query(&sql, libsql::params![id.to_string()])
            .await
            .map_err(|e| storage_error("failed to query memory by id", e))?;
        match rows
            .next()
            .await
            .map_err(|e| storage_error("failed to fetch memory row", e))?
        {
            Some(row) => Ok(Some(row_to_memory(&row)?)),
            None => Ok(None),
        }
    }

    pub(crate) async fn do_list_memories(
        &self,
        filter: &MemoryFilter,
    ) -> Result<(Vec<Memory>, Option<Cursor>)> {
        let conn = self.connect()?;
        let mut sql = format!("SELECT {MEMORY_COLUMNS} FROM memories WHERE user_id = ?");
        let mut params: Vec<libsql::Value> = vec![text_value(filter.user_id.clone())];

        if let Some(valid_at) = filter.valid_at {
            sql.push_str(" AND valid_from <= ? AND (valid_to IS NULL OR valid_to > ?)");
            params.push(text_value(dt_to_text(valid_at)));
            params.push(text_value(dt_to_text(valid_at)));
        } else {
            sql.push_str(" AND valid_to IS NULL");
        }

        if let Some(scope) = filter.scope {
            sql.push_str(" AND scope = ?");
            params.push(text_value(enum_to_text(&scope)?));
        }
        if let Some(agent_id) = &filter.agent_id {
            sql.push_str(" AND agent_id = ?");
            params.push(text_value(agent_id.clone()));
        }
        if let Some(memory_type) = filter.memory_type {
            sql.push_str(" AND memory_type = ?");
            params.push(text_value(enum_to_text(&memory_type)?));
        }
        for tag in &filter.tags {
            sql.push_str(" AND tags LIKE ?");
            params.push(text_value(format!("%\"{tag}\"%")));
        }
        if let Some(q) = &filter.q {
            sql.push_str(" AND content LIKE ?");
            params.push(text_value(format!("%{q}%")));
        }
        if let Some(from) = filter.event_time_from {
            sql.push_str(" AND event_time >= ?");
            params.push(text_value(dt_to_text(from)));
        }
        if let Some(to) = filter.event_time_to {
            sql.push_str(" AND event_time <= ?");
            params.push(text_value(dt_to_text(to)));
        }
        if let Some(cursor) = &filter.cursor {
            sql.push_str(" AND (created_at < ? OR (created_at = ? AND id < ?))");
            params.push(text_value(dt_to_text(cursor.last_created_at)));
            params.push(text_value(dt_to_text(cursor.last_created_at)));
            params.push(text_value(cursor.last_id.to_string()));
        }

        sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ?");
        let fetch_limit = filter.limit + 1;
        params.push(int_value(fetch_limit as i64));

        let mut rows = conn
            .query(&sql, libsql::params_from_iter(params))
            .await
            .map_err(|e| storage_error("failed to query memories", e))?;

        let mut memories = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| storage_error("failed to fetch memory row", e))?
        {
            memories.push(row_to_memory(&row)?);
        }

        let next_cursor = if memories.len() > filter.limit {
            memories.truncate(filter.limit);
            memories.last().map(|m| Cursor {
                last_created_at: m.created_at,
                last_id: m.id,
            })
        } else {
            None
        };

        Ok((memories, next_cursor))
    }

    pub(crate) async fn do_find_current_by_hash(
        &self,
        scope: &LineageScope,
        content_hash: &str,
    ) -> Result<Option<Memory>> {
        let conn = self.connect()?;
        let sql = format!(
            "SELECT {MEMORY_COLUMNS} FROM memories \
             WHERE user_id = ? AND scope = ? AND COALESCE(agent_id, '') = ? \
             AND content_hash = ? AND valid_to IS NULL LIMIT 1"
        );
        let mut rows = conn
            .query(
                &sql,
                libsql::params![
                    scope.user_id.clone(),
                    enum_to_text(&scope.scope)?,
                    scope.agent_id.clone().unwrap_or_default(),
                    content_hash.to_string(),
                ],
            )
            .await
            .map_err(|e| storage_error("failed to query memory by content hash", e))?;
        match rows
            .next()
            .await
            .map_err(|e| storage_error("failed to fetch memory row", e))?
        {
            Some(row) => Ok(Some(row_to_memory(&row)?)),
            None => Ok(None),
        }
    }

    pub(crate) async fn do_find_candidates(
        &self,
        scope: &LineageScope,
        memory_type: MemoryType,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<Candidate>> {
        let conn = self.connect()?;
        let sql = format!(
            "SELECT {MEMORY_COLUMNS} FROM memories \
             WHERE user_id = ? AND scope = ? AND COALESCE(agent_id, '') = ? \
             AND memory_type = ? AND valid_to IS NULL AND embedding IS NOT NULL"
        );
        let mut rows = conn
            .query(
                &sql,
                libsql::params![
                    scope.user_id.clone(),
                    enum_to_text(&scope.scope)?,
                    scope.agent_id.clone().unwrap_or_default(),
                    enum_to_text(&memory_type)?,
                ],
            )
            .await
            .map_err(|e| storage_error("failed to query candidate memories", e))?;

        score_and_rank(&mut rows, query_embedding, k).await
    }

    pub(crate) async fn do_search_candidates(
        &self,
        user_id: &str,
        scope: Scope,
        agent_id: Option<&str>,
        query_embedding: &[f32],
        k: usize,
        include_retired: bool,
    ) -> Result<Vec<Candidate>> {
        let conn = self.connect()?;
        let mut sql = format!(
            "SELECT {MEMORY_COLUMNS} FROM memories \
             WHERE user_id = ? AND scope = ? AND COALESCE(agent_id, '') = ? AND embedding IS NOT NULL"
        );
        if !include_retired {
            sql.push_str(" AND valid_to IS NULL");
        }
        let mut rows = conn
            .query(
                &sql,
                libsql::params![
                    user_id.to_string(),
                    enum_to_text(&scope)?,
                    agent_id.unwrap_or_default().to_string(),
                ],
            )
            .await
            .map_err(|e| storage_error("failed to query search candidates", e))?;

        score_and_rank(&mut rows, query_embedding, k).await
    }

    pub(crate) async fn do_soft_delete(&self, id: Uuid, at: chrono::DateTime<chrono::Utc>) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE memories SET valid_to = ?, updated_at = ? WHERE id = ?",
            libsql::params![dt_to_text(at), dt_to_text(at), id.to_string()],
        )
        .await
        .map_err(|e| storage_error("failed to soft-delete memory", e))?;
        Ok(())
    }

    pub(crate) async fn do_hard_delete(&self, id: Uuid) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "DELETE FROM memories WHERE id = ?",
            libsql::params![id.to_string()],
        )
        .await
        .map_err(|e| storage_error("failed to hard-delete memory", e))?;
        Ok(())
    }

    pub(crate) async fn do_touch_last_accessed(
        &self,
        ids: &[Uuid],
        at: chrono::DateTime<chrono::Utc>,
    ) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let conn = self.connect()?;
        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!("UPDATE memories SET last_accessed = ? WHERE id IN ({placeholders})");
        let mut params: Vec<libsql::Value> = vec![text_value(dt_to_text(at))];
        params.extend(ids.iter().map(|id| text_value(id.to_string())));
        conn.execute(&sql, libsql::params_from_iter(params))
            .await
            .map_err(|e| storage_error("failed to touch last_accessed", e))?;
        Ok(())
    }

    pub(crate) async fn do_dump_all(&self) -> Result<Vec<Memory>> {
        let conn = self.connect()?;
        let sql = format!("SELECT {MEMORY_COLUMNS} FROM memories WHERE valid_to IS NULL ORDER BY user_id, created_at");
        let mut rows = conn
            .query(&sql, ())
            .await
            .map_err(|e| storage_error("failed to dump memories", e))?;
        let mut out = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| storage_error("failed to fetch memory row", e))?
        {
            out.push(row_to_memory(&row)?);
        }
        Ok(out)
    }
}

/// Decode every row's embedding, score it against `query_embedding` with
/// cosine similarity, and keep the top `k` — the in-Rust substitute for a
/// native vector index (see `schema` module docs).
async fn score_and_rank(
    rows: &mut libsql::Rows,
    query_embedding: &[f32],
    k: usize,
) -> Result<Vec<Candidate>> {
    let mut out = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| storage_error("failed to fetch candidate row", e))?
    {
        let memory = row_to_memory(&row)?;
        let similarity = cortex_core::retrieval::scoring::cosine_similarity(
            query_embedding,
            memory.embedding.as_deref().unwrap_or(&[]),
        );
        out.push(Candidate { memory, similarity });
    }
    out.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
    out.truncate(k);
    Ok(out)
}

//! libSQL/Turso storage backend implementing [`cortex_core::store::Store`].
//!
//! A thin wrapper over [`libsql::Database`]: every operation opens its own
//! [`libsql::Connection`] (libSQL connections are cheap, unlike a TCP-backed
//! driver) rather than maintaining a custom connection pool, since the only
//! pooling concern `spec.md` names is a configured concurrency cap, which
//! the Job Manager's worker pool already enforces at the call-site level.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cortex_core::error::{Error, Result};
use cortex_core::model::{AuditRecord, IngestJob, IngestResult, JobStatus, Memory, MemoryType, Scope};
use cortex_core::store::{Candidate, Cursor, LineageScope, MemoryFilter, Store};
use libsql::{Builder, Connection, Database};
use uuid::Uuid;

mod audit;
pub mod error;
mod jobs;
mod memories;
mod rows;
pub mod schema;

/// A libSQL-backed [`Store`]. Cheap to clone (wraps an `Arc<Database>`).
pub struct CortexStore {
    db: Arc<Database>,
}

impl CortexStore {
    /// Connect to `url`, enforcing the same transport security rule the
    /// HTTP Analyzer/Embedder adapters apply to outbound calls: only
    /// `libsql://` (with a token), `file:`, or `:memory:` are accepted.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` for a disallowed scheme or a missing
    /// remote token, `Error::Storage` if the connection itself fails.
    pub async fn connect_url(url: &str, token: &str) -> Result<Self> {
        if !url.starts_with("libsql://") && !url.starts_with("file:") && !url.starts_with(":memory:") {
            return Err(Error::InvalidArgument(format!(
                "insecure database URL `{url}`: only libsql://, file:, or :memory: are allowed"
            )));
        }
        if url.starts_with("libsql://") && token.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "authentication token required for remote libsql:// connections".to_string(),
            ));
        }

        let db = if url.starts_with("libsql://") {
            Builder::new_remote(url.to_string(), token.to_string())
                .build()
                .await
                .map_err(|e| error::storage_error("failed to connect to libsql", e))?
        } else {
            let path = url.strip_prefix("file:").unwrap_or(url);
            Builder::new_local(path)
                .build()
                .await
                .map_err(|e| error::storage_error("failed to connect to libsql", e))?
        };

        Ok(Self { db: Arc::new(db) })
    }

    /// Wrap an already-open [`libsql::Database`] (the path used by tests,
    /// which build an in-memory or temp-file database directly).
    #[must_use]
    pub fn from_database(db: Database) -> Self {
        Self { db: Arc::new(db) }
    }

    fn connect(&self) -> Result<Connection> {
        self.db
            .connect()
            .map_err(|e| error::storage_error("failed to open connection", e))
    }

    /// Create every table and index. Idempotent; safe to call on every
    /// startup.
    ///
    /// # Errors
    /// Propagates the first DDL statement that fails.
    pub async fn initialize_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        for statement in schema::ALL_STATEMENTS {
            conn.execute(statement, ())
                .await
                .map_err(|e| error::storage_error("failed to run schema statement", e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl Store for CortexStore {
    async fn insert_memory(&self, memory: Memory) -> Result<()> {
        self.do_insert_memory(memory).await
    }

    async fn supersede(&self, old_id: Uuid, new_memory: Memory) -> Result<()> {
        self.do_supersede(old_id, new_memory).await
    }

    async fn get_memory(&self, id: Uuid) -> Result<Option<Memory>> {
        self.do_get_memory(id).await
    }

    async fn list_memories(&self, filter: &MemoryFilter) -> Result<(Vec<Memory>, Option<Cursor>)> {
        self.do_list_memories(filter).await
    }

    async fn find_current_by_hash(
        &self,
        scope: &LineageScope,
        content_hash: &str,
    ) -> Result<Option<Memory>> {
        self.do_find_current_by_hash(scope, content_hash).await
    }

    async fn find_candidates(
        &self,
        scope: &LineageScope,
        memory_type: MemoryType,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<Candidate>> {
        self.do_find_candidates(scope, memory_type, query_embedding, k).await
    }

    async fn search_candidates(
        &self,
        user_id: &str,
        scope: Scope,
        agent_id: Option<&str>,
        query_embedding: &[f32],
        k: usize,
        include_retired: bool,
    ) -> Result<Vec<Candidate>> {
        self.do_search_candidates(user_id, scope, agent_id, query_embedding, k, include_retired)
            .await
    }

    async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        self.do_soft_delete(id, at).await
    }

    async fn hard_delete(&self, id: Uuid) -> Result<()> {
        self.do_hard_delete(id).await
    }

    async fn touch_last_accessed(&self, ids: &[Uuid], at: DateTime<Utc>) -> Result<()> {
        self.do_touch_last_accessed(ids, at).await
    }

    async fn insert_audit(&self, record: AuditRecord) -> Result<()> {
        self.do_insert_audit(record).await
    }

    async fn list_audit_for_memory(&self, memory_id: Uuid) -> Result<Vec<AuditRecord>> {
        self.do_list_audit_for_memory(memory_id).await
    }

    async fn dump_all(&self) -> Result<Vec<Memory>> {
        self.do_dump_all().await
    }

    async fn insert_job(&self, job: IngestJob) -> Result<()> {
        self.do_insert_job(job).await
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<IngestJob>> {
        self.do_get_job(job_id).await
    }

    async fn find_job_by_idempotency_key(
        &self,
        user_id: &str,
        key: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<IngestJob>> {
        self.do_find_job_by_idempotency_key(user_id, key, since).await
    }

    async fn update_job_status(
        &self,
        job_id: Uuid,
        status: JobStatus,
        result: Option<IngestResult>,
        error: Option<String>,
    ) -> Result<()> {
        self.do_update_job_status(job_id, status, result, error).await
    }

    async fn claim_next_job_for_user(&self, user_id: &str) -> Result<Option<IngestJob>> {
        self.do_claim_next_job_for_user(user_id).await
    }

    async fn users_with_pending_jobs(&self) -> Result<Vec<String>> {
        self.do_users_with_pending_jobs().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> CortexStore {
        let db = Builder::new_local(":memory:").build().await.unwrap();
        let store = CortexStore::from_database(db);
        store.initialize_schema().await.unwrap();
        store
    }

    #[tokio::test]
    async fn rejects_insecure_url() {
        let err = CortexStore::connect_url("http://example.com", "").await.unwrap_err();
        assert_eq!(err.code(), "invalid_argument");
    }

    #[tokio::test]
    async fn rejects_remote_url_without_token() {
        let err = CortexStore::connect_url("libsql://example.com", "").await.unwrap_err();
        assert_eq!(err.code(), "invalid_argument");
    }

    #[tokio::test]
    async fn schema_initializes_on_in_memory_database() {
        let _store = memory_store().await;
    }
}

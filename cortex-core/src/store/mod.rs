//! Unified trait for storage backends, mirroring the teacher's
//! `StorageBackend` trait shape: one async method per operation,
//! `Result<T>` return, no SQL types leaking across the boundary
//! (`spec.md` §3, §6).

pub mod filter;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::model::{AuditRecord, IngestJob, JobStatus, Memory, Scope};
pub use filter::{Cursor, MemoryFilter};

/// A candidate returned from a vector/metadata search, paired with its raw
/// cosine similarity so the Retrieval Engine can apply the scoring formula
/// of `spec.md` §4.5 on top.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub memory: Memory,
    pub similarity: f32,
}

/// Identifies the lineage bucket a dedup/near-dup lookup is scoped to:
/// `(user_id, scope, agent_id)`.
#[derive(Debug, Clone)]
pub struct LineageScope {
    pub user_id: String,
    pub scope: Scope,
    pub agent_id: Option<String>,
}

/// Storage backend for memories, their audit trail, and ingest jobs.
///
/// Implementations must uphold the uniqueness, lineage and atomicity
/// invariants of `spec.md` §3/§5: [`Store::supersede`] retires the
/// predecessor and inserts the successor in one transaction, and
/// `find_current_by_hash`/`find_candidates` only ever see a transaction's
/// committed state.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a brand-new current memory (no predecessor).
    async fn insert_memory(&self, memory: Memory) -> Result<()>;

    /// Atomically retire `old_id` (`valid_to = new.valid_from`) and insert
    /// `new_memory` with `supersedes_id = old_id` in one transaction.
    async fn supersede(&self, old_id: Uuid, new_memory: Memory) -> Result<()>;

    async fn get_memory(&self, id: Uuid) -> Result<Option<Memory>>;

    /// Structured filter query; returns up to `filter.limit` rows ordered by
    /// `(created_at DESC, id)` and the cursor to pass for the next page.
    async fn list_memories(&self, filter: &MemoryFilter) -> Result<(Vec<Memory>, Option<Cursor>)>;

    /// Exact-duplicate lookup within a lineage bucket, scoped further by
    /// `memory_type` since exact-dup suppression never crosses type.
    async fn find_current_by_hash(
        &self,
        scope: &LineageScope,
        content_hash: &str,
    ) -> Result<Option<Memory>>;

    /// Top-k nearest neighbors by cosine similarity, restricted to
    /// `scope` and `memory_type`, among current rows only.
    async fn find_candidates(
        &self,
        scope: &LineageScope,
        memory_type: crate::model::MemoryType,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<Candidate>>;

    /// ANN candidate fetch for retrieval, not restricted to a single
    /// `memory_type`, optionally including retired rows for `valid_at`
    /// queries.
    async fn search_candidates(
        &self,
        user_id: &str,
        scope: Scope,
        agent_id: Option<&str>,
        query_embedding: &[f32],
        k: usize,
        include_retired: bool,
    ) -> Result<Vec<Candidate>>;

    async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;

    async fn hard_delete(&self, id: Uuid) -> Result<()>;

    /// Best-effort batch update of `last_accessed`; failures here must
    /// never fail the calling retrieval (`spec.md` §4.5 step 7).
    async fn touch_last_accessed(&self, ids: &[Uuid], at: DateTime<Utc>) -> Result<()>;

    async fn insert_audit(&self, record: AuditRecord) -> Result<()>;

    async fn list_audit_for_memory(&self, memory_id: Uuid) -> Result<Vec<AuditRecord>>;

    /// Stream every current memory for `GET /v1/dump`.
    async fn dump_all(&self) -> Result<Vec<Memory>>;

    // ---- Job table ----

    async fn insert_job(&self, job: IngestJob) -> Result<()>;

    async fn get_job(&self, job_id: Uuid) -> Result<Option<IngestJob>>;

    async fn find_job_by_idempotency_key(
        &self,
        user_id: &str,
        key: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<IngestJob>>;

    async fn update_job_status(
        &self,
        job_id: Uuid,
        status: JobStatus,
        result: Option<crate::model::IngestResult>,
        error: Option<String>,
    ) -> Result<()>;

    /// Pop the oldest accepted job for `user_id`, atomically marking it
    /// `running`. Returns `None` if that user has no queued work. Used by
    /// the Job Manager's per-user worker loop to enforce FIFO ordering and
    /// `per_user_concurrency = 1`.
    async fn claim_next_job_for_user(&self, user_id: &str) -> Result<Option<IngestJob>>;

    /// Every distinct `user_id` with at least one `accepted` job, used by
    /// the worker pool to discover new work without scanning the whole
    /// table per tick.
    async fn users_with_pending_jobs(&self) -> Result<Vec<String>>;
}

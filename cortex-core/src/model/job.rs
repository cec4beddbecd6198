//! The asynchronous ingest job record (`spec.md` §3, §4.7).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::memory::Scope;

/// Lifecycle state of an ingest job. Transitions only move forward:
/// `accepted -> running -> {done, failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Accepted,
    Running,
    Done,
    Failed,
}

/// Outcome of a completed (or partially completed) ingestion, mirroring
/// the Memory Manager's per-request output (`spec.md` §4.4).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestResult {
    pub created_count: usize,
    pub updated_count: usize,
    pub skipped_count: usize,
    pub memory_ids: Vec<Uuid>,
    pub warnings: Vec<String>,
}

/// A background ingest job, identified by `job_id` and optionally
/// deduplicated by a client-supplied `idempotency_key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestJob {
    pub job_id: Uuid,
    pub idempotency_key: Option<String>,
    pub user_id: String,
    pub agent_id: Option<String>,
    pub scope: Scope,
    pub text: String,
    pub source: Option<String>,
    pub event_time: Option<DateTime<Utc>>,
    pub received_at: DateTime<Utc>,
    pub status: JobStatus,
    pub result: Option<IngestResult>,
    pub error: Option<String>,
}

impl IngestJob {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, JobStatus::Done | JobStatus::Failed)
    }
}

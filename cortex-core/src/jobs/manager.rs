//! The Job Manager: accepts ingest requests, assigns job ids, enforces
//! idempotency, and runs ingestion in the background with per-user FIFO
//! ordering (`spec.md` §4.7). Structurally this is the teacher's
//! poll-based worker pool (`PatternExtractionQueue`) re-keyed per user
//! instead of a single shared channel, since per-user serialization is
//! the ordering guarantee `spec.md` §5 asks for.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::manager::{IngestRequest, MemoryManager};
use crate::model::{InputChannel, IngestJob, JobStatus};
use crate::store::Store;

use super::types::{JobManagerConfig, JobStats, MAX_ADAPTER_RETRY_ATTEMPTS};

pub struct JobManager {
    store: Arc<dyn Store>,
    memory_manager: Arc<MemoryManager>,
    config: JobManagerConfig,
    active_users: Mutex<HashSet<String>>,
    stats: Mutex<JobStats>,
}

impl JobManager {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, memory_manager: Arc<MemoryManager>, config: JobManagerConfig) -> Self {
        Self {
            store,
            memory_manager,
            config,
            active_users: Mutex::new(HashSet::new()),
            stats: Mutex::new(JobStats::default()),
        }
    }

    #[must_use]
    pub async fn stats(&self) -> JobStats {
        self.stats.lock().await.clone()
    }

    /// Accept an ingest request: assign a `job_id`, persist `status =
    /// accepted`, and return immediately. Honors `idempotency_key` within
    /// [`JobManagerConfig::idempotency_window`] (`spec.md` §4.7).
    ///
    /// # Errors
    /// Propagates Store errors.
    #[tracing::instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn accept(
        &self,
        request: IngestRequest,
        idempotency_key: Option<String>,
    ) -> Result<IngestJob> {
        let now = Utc::now();

        if let Some(key) = &idempotency_key {
            let since = now - self.config.idempotency_window;
            if let Some(existing) = self
                .store
                .find_job_by_idempotency_key(&request.user_id, key, since)
                .await?
            {
                return Ok(existing);
            }
        }

        let job = IngestJob {
            job_id: Uuid::new_v4(),
            idempotency_key,
            user_id: request.user_id,
            agent_id: request.agent_id,
            scope: request.scope,
            text: request.text,
            source: request.source,
            event_time: request.event_time,
            received_at: now,
            status: JobStatus::Accepted,
            result: None,
            error: None,
        };

        self.store.insert_job(job.clone()).await?;
        self.stats.lock().await.total_accepted += 1;

        Ok(job)
    }

    /// `GET /v1/ingest/{job_id}`.
    ///
    /// # Errors
    /// Returns `not_found` if no such job exists.
    pub async fn get_status(&self, job_id: Uuid) -> Result<IngestJob> {
        self.store
            .get_job(job_id)
            .await?
            .ok_or_else(|| Error::JobNotFound(job_id.to_string()))
    }

    /// Spawn the background worker pool. Each worker polls for users with
    /// pending jobs, claims one job per idle user, and runs it to
    /// completion before looking for more work.
    #[must_use]
    pub fn spawn_workers(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        (0..self.config.worker_pool_size.max(1))
            .map(|_| {
                let manager = Arc::clone(self);
                tokio::spawn(async move { manager.worker_loop().await })
            })
            .collect()
    }

    async fn worker_loop(self: Arc<Self>) {
        loop {
            match self.try_claim_any().await {
                Some(job) => self.run_job(job).await,
                None => tokio::time::sleep(self.config.poll_interval).await,
            }
        }
    }

    async fn try_claim_any(&self) -> Option<IngestJob> {
        let users = self.store.users_with_pending_jobs().await.ok()?;
        for user in users {
            {
                let mut active = self.active_users.lock().await;
                if active.len() >= self.effective_capacity() || active.contains(&user) {
                    continue;
                }
                active.insert(user.clone());
            }

            match self.store.claim_next_job_for_user(&user).await {
                Ok(Some(job)) => return Some(job),
                _ => {
                    self.active_users.lock().await.remove(&user);
                }
            }
        }
        None
    }

    /// Upper bound on users being processed at once. `per_user_concurrency`
    /// caps concurrency *within* a user's own queue (always 1 in this
    /// design, per `spec.md` §5); cross-user concurrency is bounded by the
    /// worker pool size instead.
    fn effective_capacity(&self) -> usize {
        self.config.worker_pool_size.max(1)
    }

    async fn run_job(&self, job: IngestJob) {
        let user_id = job.user_id.clone();
        let job_id = job.job_id;

        let request = IngestRequest {
            user_id: job.user_id.clone(),
            text: job.text.clone(),
            source: job.source.clone(),
            scope: job.scope,
            agent_id: job.agent_id.clone(),
            event_time: job.event_time,
            input_channel: InputChannel::Api,
        };

        let outcome = self.execute_with_retry(request).await;
        let mut stats = self.stats.lock().await;
        match outcome {
            Ok(result) => {
                stats.total_done += 1;
                drop(stats);
                if let Err(err) = self
                    .store
                    .update_job_status(job_id, JobStatus::Done, Some(result), None)
                    .await
                {
                    tracing::error!(error = %err, %job_id, "failed to persist job completion");
                }
            }
            Err(err) => {
                stats.total_failed += 1;
                drop(stats);
                if let Err(update_err) = self
                    .store
                    .update_job_status(job_id, JobStatus::Failed, None, Some(err.to_string()))
                    .await
                {
                    tracing::error!(error = %update_err, %job_id, "failed to persist job failure");
                }
            }
        }

        self.active_users.lock().await.remove(&user_id);
    }

    /// At-least-once retry of the whole ingest for transient Analyzer/Store
    /// unavailability, bounded to 3 attempts with exponential backoff
    /// (`spec.md` §4.7, §7). A non-transient error (validation, conflict)
    /// fails immediately.
    async fn execute_with_retry(&self, request: IngestRequest) -> Result<crate::model::IngestResult> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let deadline = tokio::time::timeout(
                self.config.job_wall_clock_cap,
                self.memory_manager.ingest(request.clone()),
            )
            .await;

            match deadline {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(err)) if err.is_transient() && attempt < MAX_ADAPTER_RETRY_ATTEMPTS => {
                    let backoff = std::time::Duration::from_millis(200 * 2u64.pow(attempt - 1));
                    tracing::warn!(error = %err, attempt, "retrying ingest after transient failure");
                    tokio::time::sleep(backoff).await;
                }
                Ok(Err(err)) => return Err(err),
                Err(_elapsed) => return Err(Error::Timeout),
            }
        }
    }
}

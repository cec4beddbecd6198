//! Tunables and statistics for the ingest job worker pool, mirroring the
//! teacher's `QueueConfig`/`QueueStats` shape.

use std::time::Duration;

pub const DEFAULT_WORKER_POOL_SIZE: usize = 8;
pub const DEFAULT_PER_USER_CONCURRENCY: usize = 1;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_IDEMPOTENCY_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_JOB_WALL_CLOCK_CAP: Duration = Duration::from_secs(5 * 60);
pub const MAX_ADAPTER_RETRY_ATTEMPTS: u32 = 3;

/// Worker pool configuration (`spec.md` §4.7, §5).
#[derive(Debug, Clone)]
pub struct JobManagerConfig {
    /// Number of background worker tasks in the global pool.
    pub worker_pool_size: usize,
    /// Max jobs processed concurrently for a single user; `1` preserves
    /// causal ordering of upserts (`spec.md` §5).
    pub per_user_concurrency: usize,
    /// How long workers sleep between polls when no user has pending work.
    pub poll_interval: Duration,
    /// Idempotency-key retention window (`spec.md` §4.7).
    pub idempotency_window: Duration,
    /// Wall-clock cap for one job, independent of request deadlines.
    pub job_wall_clock_cap: Duration,
}

impl Default for JobManagerConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: DEFAULT_WORKER_POOL_SIZE,
            per_user_concurrency: DEFAULT_PER_USER_CONCURRENCY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            idempotency_window: DEFAULT_IDEMPOTENCY_WINDOW,
            job_wall_clock_cap: DEFAULT_JOB_WALL_CLOCK_CAP,
        }
    }
}

/// Running counters for observability, exposed via `/health` or metrics.
#[derive(Debug, Clone, Default)]
pub struct JobStats {
    pub total_accepted: u64,
    pub total_done: u64,
    pub total_failed: u64,
    pub active_workers: usize,
}

//! `ingest_jobs` table operations: acceptance, idempotency lookup, atomic
//! per-user claim (`spec.md` §4.7, §5).

use chrono::{DateTime, Utc};
use cortex_core::error::Result;
use cortex_core::model::{IngestJob, IngestResult, JobStatus};
use uuid::Uuid;

use crate::error::storage_error;
use crate::rows::{dt_to_text, enum_to_text, json_to_text, row_to_job};
use crate::CortexStore;

const JOB_COLUMNS: &str = "job_id, idempotency_key, user_id, agent_id, scope, text, source, \
     event_time, received_at, status, result, error";

impl CortexStore {
    pub(crate) async fn do_insert_job(&self, job: IngestJob) -> Result<()> {
        let conn = self.connect()?;
        let sql = format!("INSERT INTO ingest_jobs ({JOB_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)");
        conn.execute(
            &sql,
            libsql::params![
                job.job_id.to_string(),
                job.idempotency_key.clone(),
                job.user_id.clone(),
                job.agent_id.clone(),
                enum_to_text(&job.scope)?,
                job.text.clone(),
                job.source.clone(),
                job.event_time.map(dt_to_text),
                dt_to_text(job.received_at),
                enum_to_text(&job.status)?,
                job.result.as_ref().map(json_to_text).transpose()?,
                job.error.clone(),
            ],
        )
        .await
        .map_err(|e| storage_error("failed to insert ingest job", e))?;
        Ok(())
    }

    pub(crate) async fn do_get_job(&self, job_id: Uuid) -> Result<Option<IngestJob>> {
        let conn = self.connect()?;
        let sql = format!("SELECT {JOB_COLUMNS} FROM ingest_jobs WHERE job_id = ?");
        let mut rows = conn
            .query(&sql, libsql::params![job_id.to_string()])
            .await
            .map_err(|e| storage_error("failed to query ingest job", e))?;
        match rows
            .next()
            .await
            .map_err(|e| storage_error("failed to fetch ingest job row", e))?
        {
            Some(row) => Ok(Some(row_to_job(&row)?)),
            None => Ok(None),
        }
    }

    pub(crate) async fn do_find_job_by_idempotency_key(
        &self,
        user_id: &str,
        key: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<IngestJob>> {
        let conn = self.connect()?;
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM ingest_jobs \
             WHERE user_id = ? AND idempotency_key = ? AND received_at >= ? \
             ORDER BY received_at DESC LIMIT 1"
        );
        let mut rows = conn
            .query(
                &sql,
                libsql::params![user_id.to_string(), key.to_string(), dt_to_text(since)],
            )
            .await
            .map_err(|e| storage_error("failed to query ingest job by idempotency key", e))?;
        match rows
            .next()
            .await
            .map_err(|e| storage_error("failed to fetch ingest job row", e))?
        {
            Some(row) => Ok(Some(row_to_job(&row)?)),
            None => Ok(None),
        }
    }

    pub(crate) async fn do_update_job_status(
        &self,
        job_id: Uuid,
        status: JobStatus,
        result: Option<IngestResult>,
        error: Option<String>,
    ) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE ingest_jobs SET status = ?, result = ?, error = ? WHERE job_id = ?",
            libsql::params![
                enum_to_text(&status)?,
                result.as_ref().map(json_to_text).transpose()?,
                error,
                job_id.to_string(),
            ],
        )
        .await
        .map_err(|e| storage_error("failed to update ingest job status", e))?;
        Ok(())
    }

    pub(crate) async fn do_claim_next_job_for_user(&self, user_id: &str) -> Result<Option<IngestJob>> {
        let conn = self.connect()?;
        conn.execute("BEGIN IMMEDIATE", ())
            .await
            .map_err(|e| storage_error("failed to begin claim transaction", e))?;

        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM ingest_jobs \
             WHERE user_id = ? AND status = ? ORDER BY received_at LIMIT 1"
        );
        let next_job = async {
            let mut rows = conn
                .query(&sql, libsql::params![user_id.to_string(), enum_to_text(&JobStatus::Accepted)?])
                .await
                .map_err(|e| storage_error("failed to query pending job", e))?;
            match rows
                .next()
                .await
                .map_err(|e| storage_error("failed to fetch pending job row", e))?
            {
                Some(row) => Ok(Some(row_to_job(&row)?)),
                None => Ok(None),
            }
        }
        .await;

        let job = match next_job {
            Ok(job) => job,
            Err(e) => {
                let _ = conn.execute("ROLLBACK", ()).await;
                return Err(e);
            }
        };

        if let Some(job) = &job {
            if let Err(e) = conn
                .execute(
                    "UPDATE ingest_jobs SET status = ? WHERE job_id = ?",
                    libsql::params![enum_to_text(&JobStatus::Running)?, job.job_id.to_string()],
                )
                .await
                .map_err(|e| storage_error("failed to mark job running", e))
            {
                let _ = conn.execute("ROLLBACK", ()).await;
                return Err(e);
            }
        }

        conn.execute("COMMIT", ())
            .await
            .map_err(|e| storage_error("failed to commit claim transaction", e))?;

        Ok(job.map(|mut j| {
            j.status = JobStatus::Running;
            j
        }))
    }

    pub(crate) async fn do_users_with_pending_jobs(&self) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let sql = "SELECT DISTINCT user_id FROM ingest_jobs WHERE status = ? ORDER BY user_id";
        let mut rows = conn
            .query(sql, libsql::params![enum_to_text(&JobStatus::Accepted)?])
            .await
            .map_err(|e| storage_error("failed to query users with pending jobs", e))?;

        let mut out = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| storage_error("failed to fetch user_id row", e))?
        {
            let user_id: String = row
                .get::<String>(0)
                .map_err(|e| storage_error("users_with_pending_jobs column", e))?;
            out.push(user_id);
        }
        Ok(out)
    }
}

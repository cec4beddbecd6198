//! `POST /v1/ingest` and `GET /v1/ingest/{job_id}` (`spec.md` §6, §4.7).

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cortex_core::manager::IngestRequest;
use cortex_core::model::{InputChannel, IngestResult, JobStatus, Scope};

use crate::error::ApiError;
use crate::state::AppState;

const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

#[derive(Debug, Deserialize)]
pub struct IngestBody {
    pub user_id: String,
    pub text: String,
    pub source: Option<String>,
    #[serde(default = "default_scope")]
    pub scope: Scope,
    pub agent_id: Option<String>,
    pub event_time: Option<DateTime<Utc>>,
    #[serde(default = "default_input_channel")]
    pub input_channel: InputChannel,
}

fn default_scope() -> Scope {
    Scope::Global
}

fn default_input_channel() -> InputChannel {
    InputChannel::Api
}

#[derive(Debug, Serialize)]
pub struct IngestAcceptedResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
}

pub async fn ingest(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<IngestBody>,
) -> Result<(StatusCode, Json<IngestAcceptedResponse>), ApiError> {
    let idempotency_key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let request = IngestRequest {
        user_id: body.user_id,
        text: body.text,
        source: body.source,
        scope: body.scope,
        agent_id: body.agent_id,
        event_time: body.event_time,
        input_channel: body.input_channel,
    };

    let job = state.job_manager.accept(request, idempotency_key).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(IngestAcceptedResponse {
            job_id: job.job_id,
            status: job.status,
        }),
    ))
}

#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub status: JobStatus,
    pub result: Option<IngestResult>,
    pub error: Option<String>,
}

pub async fn get_ingest_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobStatusResponse>, ApiError> {
    let job = state.job_manager.get_status(job_id).await?;
    Ok(Json(JobStatusResponse {
        status: job.status,
        result: job.result,
        error: job.error,
    }))
}

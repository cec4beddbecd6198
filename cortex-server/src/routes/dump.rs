//! `GET /v1/dump` — admin export of every current memory (`spec.md` §6).

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DumpQuery {
    #[serde(default)]
    pub format: DumpFormat,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DumpFormat {
    #[default]
    Json,
    Jsonl,
}

pub async fn dump(
    State(state): State<AppState>,
    Query(q): Query<DumpQuery>,
) -> Result<Response, ApiError> {
    let memories = state.store.dump_all().await?;

    match q.format {
        DumpFormat::Json => {
            let body = serde_json::to_string(&memories).map_err(cortex_core::error::Error::Serialization)?;
            Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
        }
        DumpFormat::Jsonl => {
            let mut body = String::new();
            for memory in &memories {
                let line = serde_json::to_string(memory).map_err(cortex_core::error::Error::Serialization)?;
                body.push_str(&line);
                body.push('\n');
            }
            Ok(([(header::CONTENT_TYPE, "application/x-ndjson")], body).into_response())
        }
    }
}

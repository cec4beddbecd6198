//! `POST /v1/context` — ranked RAG retrieval + synthesis (`spec.md` §4.5).

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use cortex_core::model::Scope;
use cortex_core::retrieval::ContextRequest;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ContextBody {
    pub user_id: String,
    pub query: String,
    pub app_context: Option<serde_json::Value>,
    #[serde(default = "default_scope")]
    pub scope: Scope,
    pub agent_id: Option<String>,
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default)]
    pub include_global: bool,
    #[serde(default)]
    pub include_retired: bool,
    #[serde(default)]
    pub return_evidence: bool,
}

fn default_scope() -> Scope {
    Scope::Global
}

fn default_k() -> usize {
    5
}

pub async fn context(
    State(state): State<AppState>,
    Json(body): Json<ContextBody>,
) -> Result<Json<cortex_core::retrieval::ContextResult>, ApiError> {
    let request = ContextRequest {
        user_id: body.user_id,
        query: body.query,
        app_context: body.app_context,
        scope: body.scope,
        agent_id: body.agent_id,
        k: body.k,
        include_global: body.include_global,
        include_retired: body.include_retired,
        return_evidence: body.return_evidence,
    };

    let result = state.retrieval_engine.context(request).await?;
    Ok(Json(result))
}

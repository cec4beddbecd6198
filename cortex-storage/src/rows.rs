//! Row <-> domain-type mapping.
//!
//! libSQL has no native enum, JSON, UUID or timestamp column type, so every
//! structured field crosses the boundary as TEXT: timestamps as RFC 3339,
//! enums via their `serde` `Serialize`/`Deserialize` impl (a quoted JSON
//! string, e.g. `"global"`), and collections/embeddings as JSON arrays.

use chrono::{DateTime, Utc};
use cortex_core::error::Error;
use cortex_core::model::{
    ActorType, AuditAction, AuditRecord, InputChannel, IngestJob, IngestResult, JobStatus, Memory,
    MemoryType, Scope,
};
use libsql::Row;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use crate::error::storage_error;

pub fn dt_to_text(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

pub fn text_to_dt(s: &str) -> cortex_core::error::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| storage_error("malformed timestamp column", e))
}

pub fn enum_to_text<T: Serialize>(value: &T) -> cortex_core::error::Result<String> {
    serde_json::to_string(value).map_err(Error::Serialization)
}

pub fn text_to_enum<T: DeserializeOwned>(s: &str) -> cortex_core::error::Result<T> {
    serde_json::from_str(s).map_err(Error::Serialization)
}

pub fn json_to_text<T: Serialize>(value: &T) -> cortex_core::error::Result<String> {
    serde_json::to_string(value).map_err(Error::Serialization)
}

pub fn text_to_json<T: DeserializeOwned>(s: &str) -> cortex_core::error::Result<T> {
    serde_json::from_str(s).map_err(Error::Serialization)
}

/// Lift a plain string into a `libsql::Value::Text`, the column encoding
/// every TEXT field in this crate uses.
pub fn text_value(s: String) -> libsql::Value {
    libsql::Value::Text(s)
}

/// Lift an optional string into `Value::Text`/`Value::Null`. libSQL has no
/// blanket `Option<String> -> Value` conversion, so every nullable TEXT
/// column goes through this instead of a bare `.into()`.
pub fn opt_text_value(s: Option<String>) -> libsql::Value {
    s.map_or(libsql::Value::Null, libsql::Value::Text)
}

pub fn int_value(n: i64) -> libsql::Value {
    libsql::Value::Integer(n)
}

pub fn real_value(n: f64) -> libsql::Value {
    libsql::Value::Real(n)
}

fn get_text(row: &Row, idx: i32) -> cortex_core::error::Result<String> {
    row.get::<String>(idx)
        .map_err(|e| storage_error(format!("column {idx}"), e))
}

fn get_opt_text(row: &Row, idx: i32) -> cortex_core::error::Result<Option<String>> {
    row.get::<Option<String>>(idx)
        .map_err(|e| storage_error(format!("column {idx}"), e))
}

fn get_i64(row: &Row, idx: i32) -> cortex_core::error::Result<i64> {
    row.get::<i64>(idx)
        .map_err(|e| storage_error(format!("column {idx}"), e))
}

fn get_f64(row: &Row, idx: i32) -> cortex_core::error::Result<f64> {
    row.get::<f64>(idx)
        .map_err(|e| storage_error(format!("column {idx}"), e))
}

/// Column order matches `schema::CREATE_MEMORIES_TABLE`.
pub fn row_to_memory(row: &Row) -> cortex_core::error::Result<Memory> {
    let id = Uuid::parse_str(&get_text(row, 0)?).map_err(|e| storage_error("memories.id", e))?;
    let user_id = get_text(row, 1)?;
    let scope: Scope = text_to_enum(&get_text(row, 2)?)?;
    let agent_id = get_opt_text(row, 3)?;
    let content = get_text(row, 4)?;
    let content_hash = get_opt_text(row, 5)?.unwrap_or_default();
    let embedding = get_opt_text(row, 6)?
        .map(|s| text_to_json::<Vec<f32>>(&s))
        .transpose()?;
    let memory_type: MemoryType = text_to_enum(&get_text(row, 7)?)?;
    let tags: BTreeSet<String> = text_to_json(&get_text(row, 8)?)?;
    let related_entities: BTreeMap<String, String> = text_to_json(&get_text(row, 9)?)?;
    let importance = get_i64(row, 10)? as u8;
    let confidence = get_f64(row, 11)? as f32;
    let source = get_opt_text(row, 12)?;
    let input_channel: InputChannel = text_to_enum(&get_text(row, 13)?)?;
    let event_time = get_opt_text(row, 14)?.map(|s| text_to_dt(&s)).transpose()?;
    let valid_from = text_to_dt(&get_text(row, 15)?)?;
    let valid_to = get_opt_text(row, 16)?.map(|s| text_to_dt(&s)).transpose()?;
    let supersedes_id = get_opt_text(row, 17)?
        .map(|s| Uuid::parse_str(&s))
        .transpose()
        .map_err(|e| storage_error("memories.supersedes_id", e))?;
    let last_accessed = get_opt_text(row, 18)?.map(|s| text_to_dt(&s)).transpose()?;
    let created_at = text_to_dt(&get_text(row, 19)?)?;
    let updated_at = text_to_dt(&get_text(row, 20)?)?;

    Ok(Memory {
        id,
        user_id,
        scope,
        agent_id,
        content,
        content_hash,
        embedding,
        memory_type,
        tags,
        related_entities,
        importance,
        confidence,
        source,
        input_channel,
        event_time,
        valid_from,
        valid_to,
        supersedes_id,
        last_accessed,
        created_at,
        updated_at,
    })
}

/// Column order matches `schema::CREATE_INGEST_JOBS_TABLE`.
pub fn row_to_job(row: &Row) -> cortex_core::error::Result<IngestJob> {
    let job_id =
        Uuid::parse_str(&get_text(row, 0)?).map_err(|e| storage_error("ingest_jobs.job_id", e))?;
    let idempotency_key = get_opt_text(row, 1)?;
    let user_id = get_text(row, 2)?;
    let agent_id = get_opt_text(row, 3)?;
    let scope: Scope = text_to_enum(&get_text(row, 4)?)?;
    let text = get_text(row, 5)?;
    let source = get_opt_text(row, 6)?;
    let event_time = get_opt_text(row, 7)?.map(|s| text_to_dt(&s)).transpose()?;
    let received_at = text_to_dt(&get_text(row, 8)?)?;
    let status: JobStatus = text_to_enum(&get_text(row, 9)?)?;
    let result = get_opt_text(row, 10)?
        .map(|s| text_to_json::<IngestResult>(&s))
        .transpose()?;
    let error = get_opt_text(row, 11)?;

    Ok(IngestJob {
        job_id,
        idempotency_key,
        user_id,
        agent_id,
        scope,
        text,
        source,
        event_time,
        received_at,
        status,
        result,
        error,
    })
}

/// Column order matches `schema::CREATE_MEMORY_AUDIT_LOGS_TABLE`.
pub fn row_to_audit(row: &Row) -> cortex_core::error::Result<AuditRecord> {
    let id = Uuid::parse_str(&get_text(row, 0)?).map_err(|e| storage_error("memory_audit_logs.id", e))?;
    let memory_id = Uuid::parse_str(&get_text(row, 1)?)
        .map_err(|e| storage_error("memory_audit_logs.memory_id", e))?;
    let action: AuditAction = text_to_enum(&get_text(row, 2)?)?;
    let actor_type: ActorType = text_to_enum(&get_text(row, 3)?)?;
    let diff: serde_json::Value = text_to_json(&get_text(row, 4)?)?;
    let created_at = text_to_dt(&get_text(row, 5)?)?;

    Ok(AuditRecord {
        id,
        memory_id,
        action,
        actor_type,
        diff,
        created_at,
    })
}

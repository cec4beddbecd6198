//! Shared test fixtures for the Antigravity Cortex workspace.
//!
//! Flat builder functions over the `cortex-core` domain types, in the same
//! spirit as a fixtures module in any of this workspace's crates: construct
//! a value with sane defaults, then override whichever fields the test
//! actually cares about on the returned struct.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use cortex_core::model::memory::{DEFAULT_CONFIDENCE, DEFAULT_IMPORTANCE};
use cortex_core::model::{
    ActorType, AuditAction, AuditRecord, InputChannel, IngestJob, IngestResult, JobStatus, Memory,
    MemoryType, Scope,
};
use cortex_core::normalize::Normalizer;
use uuid::Uuid;

/// A current, global-scoped `fact` memory for `user_id` with `content`
/// normalized and hashed the same way the Memory Manager would.
#[must_use]
pub fn test_memory(user_id: &str, content: &str) -> Memory {
    test_memory_with(user_id, Scope::Global, None, MemoryType::Fact, content)
}

/// [`test_memory`] with an explicit scope, agent and memory type.
#[must_use]
pub fn test_memory_with(
    user_id: &str,
    scope: Scope,
    agent_id: Option<&str>,
    memory_type: MemoryType,
    content: &str,
) -> Memory {
    let now = Utc::now();
    let normalized = Normalizer::new().normalize(content, now);
    Memory {
        id: Uuid::new_v4(),
        user_id: user_id.to_string(),
        scope,
        agent_id: agent_id.map(str::to_string),
        content: normalized.content,
        content_hash: normalized.content_hash,
        embedding: Some(deterministic_embedding(content, 16)),
        memory_type,
        tags: BTreeSet::new(),
        related_entities: BTreeMap::new(),
        importance: DEFAULT_IMPORTANCE,
        confidence: DEFAULT_CONFIDENCE,
        source: Some("test".to_string()),
        input_channel: InputChannel::Chat,
        event_time: None,
        valid_from: now,
        valid_to: None,
        supersedes_id: None,
        last_accessed: None,
        created_at: now,
        updated_at: now,
    }
}

/// A retired copy of `memory`, as if it had just been superseded.
#[must_use]
pub fn retire(mut memory: Memory, at: chrono::DateTime<Utc>) -> Memory {
    memory.valid_to = Some(at);
    memory
}

/// Deterministic pseudo-embedding of unit length, using the same
/// multiplicative-congruential scheme as
/// `cortex_core::adapters::stub::StubEmbedder` so vectors built here and
/// vectors produced by the stub embedder are comparable with
/// `cortex_core::retrieval::scoring::cosine_similarity`.
#[must_use]
pub fn deterministic_embedding(text: &str, dimension: usize) -> Vec<f32> {
    use std::hash::{Hash, Hasher};

    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    text.hash(&mut hasher);
    let mut seed = hasher.finish();

    let mut v = Vec::with_capacity(dimension);
    for _ in 0..dimension {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        v.push(((seed >> 16) as f32) / 32_768.0 - 1.0);
    }

    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm <= f32::EPSILON {
        v
    } else {
        v.into_iter().map(|x| x / norm).collect()
    }
}

/// An audit record for `memory_id`, actor defaulting to `System` and an
/// empty diff — enough for tests that only care about the action trail,
/// not the payload.
#[must_use]
pub fn test_audit_record(memory_id: Uuid, action: AuditAction) -> AuditRecord {
    AuditRecord::new(memory_id, action, ActorType::System, serde_json::json!({}))
}

/// A freshly accepted ingest job for `user_id` carrying `text`, with no
/// idempotency key.
#[must_use]
pub fn test_ingest_job(user_id: &str, text: &str) -> IngestJob {
    IngestJob {
        job_id: Uuid::new_v4(),
        idempotency_key: None,
        user_id: user_id.to_string(),
        agent_id: None,
        scope: Scope::Global,
        text: text.to_string(),
        source: Some("test".to_string()),
        event_time: None,
        received_at: Utc::now(),
        status: JobStatus::Accepted,
        result: None,
        error: None,
    }
}

/// An empty [`IngestResult`], for tests that build up expected counts
/// incrementally.
#[must_use]
pub fn test_ingest_result() -> IngestResult {
    IngestResult::default()
}

#[cfg(feature = "storage")]
mod storage_fixture {
    use cortex_storage::CortexStore;
    use tempfile::TempDir;

    /// A fresh, schema-initialized libSQL store backed by a temp-dir file.
    /// Uses a file rather than `:memory:` so a test can open a second
    /// connection against the same database if it needs to.
    ///
    /// # Panics
    /// Panics if the temp database cannot be opened or the schema fails to
    /// initialize; a broken test fixture should fail loudly rather than
    /// hand the test a half-built store.
    pub async fn temp_store() -> (CortexStore, TempDir) {
        let dir = tempfile::tempdir().expect("create temp dir for test store");
        let db_path = dir.path().join("cortex-test.db");
        let db = libsql::Builder::new_local(&db_path)
            .build()
            .await
            .expect("open temp libsql database");
        let store = CortexStore::from_database(db);
        store
            .initialize_schema()
            .await
            .expect("initialize test store schema");
        (store, dir)
    }
}

#[cfg(feature = "storage")]
pub use storage_fixture::temp_store;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_is_internally_consistent() {
        let m = test_memory("u1", "I live in Tokyo.");
        assert!(m.scope_is_consistent());
        assert!(m.is_current());
        assert!(!m.content_hash.is_empty());
    }

    #[test]
    fn agent_scoped_memory_carries_its_agent_id() {
        let m = test_memory_with(
            "u1",
            Scope::Agent,
            Some("finance"),
            MemoryType::State,
            "Budget is on track.",
        );
        assert!(m.scope_is_consistent());
        assert_eq!(m.agent_id.as_deref(), Some("finance"));
    }

    #[test]
    fn retire_sets_valid_to() {
        let m = test_memory("u1", "I live in Tokyo.");
        let now = Utc::now();
        let retired = retire(m, now);
        assert!(!retired.is_current());
        assert_eq!(retired.valid_to, Some(now));
    }

    #[test]
    fn deterministic_embedding_is_stable_and_normalized() {
        let a = deterministic_embedding("same text", 8);
        let b = deterministic_embedding("same text", 8);
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_ingest_job_starts_accepted() {
        let job = test_ingest_job("u1", "some text");
        assert_eq!(job.status, JobStatus::Accepted);
        assert!(!job.is_terminal());
    }
}

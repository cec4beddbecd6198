//! SQL schema for the relational store (`spec.md` §6 "Persisted state
//! layout").
//!
//! SQLite/libSQL has no native vector index or inverted index, so the
//! approximate-nearest-neighbor requirement is approximated by storing
//! `embedding` as a JSON-encoded `Vec<f32>` and scoring candidates in Rust
//! (see [`crate::CortexStore::find_candidates`]), and the tag/entity
//! inverted index is approximated by a plain btree index over the
//! JSON-serialized column plus `LIKE` containment checks.

pub const CREATE_MEMORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS memories (
    id TEXT PRIMARY KEY NOT NULL,
    user_id TEXT NOT NULL,
    scope TEXT NOT NULL,
    agent_id TEXT,
    content TEXT NOT NULL,
    content_hash TEXT,
    embedding TEXT,
    memory_type TEXT NOT NULL,
    tags TEXT NOT NULL DEFAULT '[]',
    related_entities TEXT NOT NULL DEFAULT '{}',
    importance INTEGER NOT NULL DEFAULT 3,
    confidence REAL NOT NULL DEFAULT 0.7,
    source TEXT,
    input_channel TEXT NOT NULL,
    event_time TEXT,
    valid_from TEXT NOT NULL,
    valid_to TEXT,
    supersedes_id TEXT,
    last_accessed TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

/// Dedup uniqueness (invariant 2) applies to the *current* set: a lineage
/// may legitimately revisit a content hash across retired generations
/// (e.g. A -> B -> A), but never twice among currently-visible rows.
pub const CREATE_MEMORIES_DEDUP_INDEX: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_memories_dedup
ON memories(user_id, scope, COALESCE(agent_id, ''), content_hash)
WHERE valid_to IS NULL AND content_hash IS NOT NULL
"#;

pub const CREATE_MEMORIES_LINEAGE_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_memories_lineage
ON memories(user_id, scope, agent_id)
"#;

pub const CREATE_MEMORIES_SUPERSEDES_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_memories_supersedes
ON memories(supersedes_id)
"#;

pub const CREATE_MEMORIES_VALID_FROM_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_memories_valid_from
ON memories(valid_from)
"#;

pub const CREATE_MEMORIES_EVENT_TIME_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_memories_event_time
ON memories(event_time)
"#;

pub const CREATE_MEMORIES_TAGS_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_memories_tags
ON memories(tags)
"#;

pub const CREATE_MEMORY_AUDIT_LOGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS memory_audit_logs (
    id TEXT PRIMARY KEY NOT NULL,
    memory_id TEXT NOT NULL,
    action TEXT NOT NULL,
    actor_type TEXT NOT NULL,
    diff TEXT NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY(memory_id) REFERENCES memories(id) ON DELETE CASCADE
)
"#;

pub const CREATE_MEMORY_AUDIT_LOGS_MEMORY_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_memory_audit_logs_memory
ON memory_audit_logs(memory_id, created_at)
"#;

pub const CREATE_INGEST_JOBS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS ingest_jobs (
    job_id TEXT PRIMARY KEY NOT NULL,
    idempotency_key TEXT,
    user_id TEXT NOT NULL,
    agent_id TEXT,
    scope TEXT NOT NULL,
    text TEXT NOT NULL,
    source TEXT,
    event_time TEXT,
    received_at TEXT NOT NULL,
    status TEXT NOT NULL,
    result TEXT,
    error TEXT
)
"#;

pub const CREATE_INGEST_JOBS_IDEMPOTENCY_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_ingest_jobs_idempotency
ON ingest_jobs(user_id, idempotency_key, received_at)
"#;

pub const CREATE_INGEST_JOBS_PENDING_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_ingest_jobs_pending
ON ingest_jobs(user_id, status, received_at)
"#;

/// Every DDL statement, in dependency order. [`crate::CortexStore::initialize_schema`]
/// runs these once at startup; each is idempotent (`IF NOT EXISTS`).
pub const ALL_STATEMENTS: &[&str] = &[
    CREATE_MEMORIES_TABLE,
    CREATE_MEMORIES_DEDUP_INDEX,
    CREATE_MEMORIES_LINEAGE_INDEX,
    CREATE_MEMORIES_SUPERSEDES_INDEX,
    CREATE_MEMORIES_VALID_FROM_INDEX,
    CREATE_MEMORIES_EVENT_TIME_INDEX,
    CREATE_MEMORIES_TAGS_INDEX,
    CREATE_MEMORY_AUDIT_LOGS_TABLE,
    CREATE_MEMORY_AUDIT_LOGS_MEMORY_INDEX,
    CREATE_INGEST_JOBS_TABLE,
    CREATE_INGEST_JOBS_IDEMPOTENCY_INDEX,
    CREATE_INGEST_JOBS_PENDING_INDEX,
];

//! Append-only audit trail for memory state transitions (`spec.md` §3,
//! invariant 7).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of state transition an [`AuditRecord`] documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Retire,
    Delete,
    Restore,
    Confirm,
    Reject,
}

/// Who (or what) triggered the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    System,
    User,
    Admin,
}

/// One append-only row recording a before/after diff for a memory.
///
/// Deleting a memory cascades to its audit rows (`spec.md` §3); the Store
/// is responsible for that cascade, this type just carries the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub memory_id: Uuid,
    pub action: AuditAction,
    pub actor_type: ActorType,
    /// JSON diff of the fields that changed; `null`/absent fields on
    /// create, both sides populated on update/retire.
    pub diff: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    #[must_use]
    pub fn new(
        memory_id: Uuid,
        action: AuditAction,
        actor_type: ActorType,
        diff: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            memory_id,
            action,
            actor_type,
            diff,
            created_at: Utc::now(),
        }
    }
}

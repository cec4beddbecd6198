//! The atomic unit of knowledge: a [`Memory`] and its supporting enums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Visibility boundary of a memory: every memory belongs to exactly one
/// user and is either visible to all of that user's agents (`Global`) or
/// scoped to a single named agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Global,
    Agent,
}

/// Selects the per-type update strategy a memory participates in
/// (`spec.md` §4.4.1). Closed enum with an associated strategy object,
/// not a subclass hierarchy, per the design note in `spec.md` §9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    Fact,
    State,
    Episode,
    Policy,
}

impl MemoryType {
    /// `fact`, `state` and `policy` chain via supersession and keep at most
    /// one current member per lineage; `episode` never supersedes.
    #[must_use]
    pub fn supersedes_on_near_duplicate(self) -> bool {
        !matches!(self, MemoryType::Episode)
    }
}

/// Provenance of the raw text a memory was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputChannel {
    Chat,
    Manual,
    Api,
    Import,
}

/// A structured, versioned assertion about a user.
///
/// See `spec.md` §3 for the full set of invariants this type must uphold;
/// the type itself only carries the data, invariants are enforced by the
/// Memory Manager and the Store together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub id: Uuid,
    pub user_id: String,
    pub scope: Scope,
    pub agent_id: Option<String>,
    pub content: String,
    pub content_hash: String,
    pub embedding: Option<Vec<f32>>,
    pub memory_type: MemoryType,
    pub tags: BTreeSet<String>,
    pub related_entities: BTreeMap<String, String>,
    pub importance: u8,
    pub confidence: f32,
    pub source: Option<String>,
    pub input_channel: InputChannel,
    pub event_time: Option<DateTime<Utc>>,
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
    pub supersedes_id: Option<Uuid>,
    pub last_accessed: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Memory {
    /// A memory is current iff it has not been retired.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.valid_to.is_none()
    }

    /// `(scope = agent) <=> (agent_id != null)` — invariant 1 of `spec.md` §3.
    #[must_use]
    pub fn scope_is_consistent(&self) -> bool {
        match self.scope {
            Scope::Agent => self.agent_id.as_deref().is_some_and(|s| !s.is_empty()),
            Scope::Global => self.agent_id.is_none(),
        }
    }

    /// The dedup key of invariant 2: `(user_id, scope, agent_id or "", content_hash)`.
    #[must_use]
    pub fn dedup_key(&self) -> (String, Scope, String, String) {
        (
            self.user_id.clone(),
            self.scope,
            self.agent_id.clone().unwrap_or_default(),
            self.content_hash.clone(),
        )
    }
}

pub const MIN_IMPORTANCE: u8 = 1;
pub const MAX_IMPORTANCE: u8 = 5;
pub const DEFAULT_IMPORTANCE: u8 = 3;
pub const DEFAULT_CONFIDENCE: f32 = 0.7;

#[cfg(test)]
mod tests {
    use super::*;

    fn base_memory() -> Memory {
        let now = Utc::now();
        Memory {
            id: Uuid::new_v4(),
            user_id: "u1".into(),
            scope: Scope::Global,
            agent_id: None,
            content: "I live in Tokyo.".into(),
            content_hash: "hash".into(),
            embedding: None,
            memory_type: MemoryType::Fact,
            tags: BTreeSet::new(),
            related_entities: BTreeMap::new(),
            importance: DEFAULT_IMPORTANCE,
            confidence: DEFAULT_CONFIDENCE,
            source: None,
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

    #[test]
    fn global_scope_requires_no_agent_id() {
        let mut m = base_memory();
        assert!(m.scope_is_consistent());
        m.agent_id = Some("finance".into());
        assert!(!m.scope_is_consistent());
    }

    #[test]
    fn agent_scope_requires_non_empty_agent_id() {
        let mut m = base_memory();
        m.scope = Scope::Agent;
        assert!(!m.scope_is_consistent());
        m.agent_id = Some(String::new());
        assert!(!m.scope_is_consistent());
        m.agent_id = Some("finance".into());
        assert!(m.scope_is_consistent());
    }

    #[test]
    fn current_iff_valid_to_is_none() {
        let mut m = base_memory();
        assert!(m.is_current());
        m.valid_to = Some(Utc::now());
        assert!(!m.is_current());
    }

    #[test]
    fn episode_never_supersedes() {
        assert!(!MemoryType::Episode.supersedes_on_near_duplicate());
        assert!(MemoryType::Fact.supersedes_on_near_duplicate());
        assert!(MemoryType::State.supersedes_on_near_duplicate());
        assert!(MemoryType::Policy.supersedes_on_near_duplicate());
    }
}

//! Structured query filter and cursor pagination for `GET /v1/memories`
//! (`spec.md` §4.5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{MemoryType, Scope};

/// Opaque pagination cursor over the stable `(created_at DESC, id)` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub last_created_at: DateTime<Utc>,
    pub last_id: Uuid,
}

impl Cursor {
    /// Encode as an opaque string for the HTTP surface. Base64 of
    /// `"{rfc3339}|{uuid}"` — opaque to the client, cheap to decode.
    #[must_use]
    pub fn encode(&self) -> String {
        use base64_lite::encode;
        encode(format!("{}|{}", self.last_created_at.to_rfc3339(), self.last_id))
    }

    #[must_use]
    pub fn decode(s: &str) -> Option<Self> {
        let raw = base64_lite::decode(s)?;
        let text = String::from_utf8(raw).ok()?;
        let (ts, id) = text.split_once('|')?;
        Some(Self {
            last_created_at: DateTime::parse_from_rfc3339(ts).ok()?.with_timezone(&Utc),
            last_id: Uuid::parse_str(id).ok()?,
        })
    }
}

/// Structured filter accepted by `GET /v1/memories`: any subset of the
/// fields in `spec.md` §4.5. `None` means "no constraint on this field".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryFilter {
    pub user_id: String,
    pub scope: Option<Scope>,
    pub agent_id: Option<String>,
    pub memory_type: Option<MemoryType>,
    /// Memories must contain ALL of these tags.
    pub tags: Vec<String>,
    /// Full-text substring match over `content`.
    pub q: Option<String>,
    /// Return memories valid at this instant instead of only current ones.
    pub valid_at: Option<DateTime<Utc>>,
    pub event_time_from: Option<DateTime<Utc>>,
    pub event_time_to: Option<DateTime<Utc>>,
    pub limit: usize,
    pub cursor: Option<Cursor>,
}

pub const DEFAULT_LIMIT: usize = 50;
pub const MAX_LIMIT: usize = 500;

impl MemoryFilter {
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            limit: DEFAULT_LIMIT,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.clamp(1, MAX_LIMIT);
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope: Scope, agent_id: Option<String>) -> Self {
        self.scope = Some(scope);
        self.agent_id = agent_id;
        self
    }

    /// Whether `valid_at` is set; when it is not, only current rows
    /// (`valid_to IS NULL`) are returned (`spec.md` §4.5).
    #[must_use]
    pub fn wants_point_in_time(&self) -> bool {
        self.valid_at.is_some()
    }
}

/// A tiny, dependency-free base64 codec so cursors stay opaque without
/// pulling in the `base64` crate for a handful of bytes.
mod base64_lite {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

    pub fn encode(input: impl AsRef<[u8]>) -> String {
        let bytes = input.as_ref();
        let mut out = String::with_capacity((bytes.len() + 2) / 3 * 4);
        for chunk in bytes.chunks(3) {
            let b = [
                chunk[0],
                *chunk.get(1).unwrap_or(&0),
                *chunk.get(2).unwrap_or(&0),
            ];
            let n = ((b[0] as u32) << 16) | ((b[1] as u32) << 8) | (b[2] as u32);
            out.push(ALPHABET[(n >> 18 & 0x3f) as usize] as char);
            out.push(ALPHABET[(n >> 12 & 0x3f) as usize] as char);
            out.push(if chunk.len() > 1 {
                ALPHABET[(n >> 6 & 0x3f) as usize] as char
            } else {
                '='
            });
            out.push(if chunk.len() > 2 {
                ALPHABET[(n & 0x3f) as usize] as char
            } else {
                '='
            });
        }
        out
    }

    pub fn decode(input: &str) -> Option<Vec<u8>> {
        let mut out = Vec::with_capacity(input.len() / 4 * 3);
        let cleaned: Vec<u8> = input.bytes().filter(|&b| b != b'=').collect();
        for chunk in cleaned.chunks(4) {
            let mut n: u32 = 0;
            let mut valid_bytes = 0;
            for (i, &c) in chunk.iter().enumerate() {
                let idx = ALPHABET.iter().position(|&a| a == c)?;
                n |= (idx as u32) << (18 - i * 6);
                valid_bytes = i;
            }
            out.push((n >> 16) as u8);
            if valid_bytes >= 2 {
                out.push((n >> 8) as u8);
            }
            if valid_bytes >= 3 {
                out.push(n as u8);
            }
        }
        Some(out)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_round_trips() {
        let cursor = Cursor {
            last_created_at: Utc::now(),
            last_id: Uuid::new_v4(),
        };
        let encoded = cursor.encode();
        let decoded = Cursor::decode(&encoded).unwrap();
        assert_eq!(cursor, decoded);
    }

    #[test]
    fn limit_is_clamped() {
        let filter = MemoryFilter::new("u1").with_limit(10_000);
        assert_eq!(filter.limit, MAX_LIMIT);
        let filter = MemoryFilter::new("u1").with_limit(0);
        assert_eq!(filter.limit, 1);
    }

    #[test]
    fn default_filter_returns_only_current() {
        let filter = MemoryFilter::new("u1");
        assert!(!filter.wants_point_in_time());
    }
}

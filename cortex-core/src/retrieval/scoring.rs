//! Pure scoring arithmetic for the Retrieval Engine (`spec.md` §4.5 step 4).
//! No I/O; every function here is a suspension-free, deterministic step.

use chrono::{DateTime, Utc};

use crate::model::MemoryType;

/// Half-life, in days, of the recency decay applied to `state`/`episode`
/// candidates. Configurable in principle; fixed here since `spec.md` gives
/// no environment key for it.
pub const DEFAULT_HALF_LIFE_DAYS: f64 = 14.0;

/// Cosine similarity in `[-1, 1]`, clamped to `[0, 1]` per `spec.md` §4.5
/// ("negatives clamped to 0"). Zero-length or mismatched-dimension inputs
/// are defined as dissimilar rather than an error, matching the teacher's
/// `cosine_similarity` defensive returns.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).max(0.0)
}

/// `w_importance(i) = 0.6 + 0.1*i`.
#[must_use]
pub fn importance_weight(importance: u8) -> f32 {
    0.6 + 0.1 * f32::from(importance)
}

/// `w_confidence(c) = 0.5 + 0.5*c`.
#[must_use]
pub fn confidence_weight(confidence: f32) -> f32 {
    0.5 + 0.5 * confidence
}

/// `decay(type, age)`: `1.0` for `fact`/`policy`; exponential decay with
/// `half_life_days` for `state`/`episode`.
#[must_use]
pub fn decay(memory_type: MemoryType, age_days: f64, half_life_days: f64) -> f32 {
    match memory_type {
        MemoryType::Fact | MemoryType::Policy => 1.0,
        MemoryType::State | MemoryType::Episode => {
            (-age_days / half_life_days).exp() as f32
        }
    }
}

/// Age in fractional days between `timestamp` and `now`. Clamped to `0.0`
/// so clock skew never produces a negative age (and thus a decay above 1).
#[must_use]
pub fn age_days(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - timestamp).num_milliseconds().max(0) as f64 / 86_400_000.0
}

/// The multi-factor score of `spec.md` §4.5 step 4:
/// `score = sim * w_importance(importance) * w_confidence(confidence) * decay(type, age)`.
#[must_use]
pub fn score(
    similarity: f32,
    importance: u8,
    confidence: f32,
    memory_type: MemoryType,
    updated_at: DateTime<Utc>,
    now: DateTime<Utc>,
    half_life_days: f64,
) -> f32 {
    similarity.max(0.0)
        * importance_weight(importance)
        * confidence_weight(confidence)
        * decay(memory_type, age_days(updated_at, now), half_life_days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_score_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors_clamp_to_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn mismatched_dimensions_are_dissimilar() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn importance_weight_matches_spec_endpoints() {
        assert!((importance_weight(1) - 0.7).abs() < 1e-6);
        assert!((importance_weight(5) - 1.1).abs() < 1e-6);
    }

    #[test]
    fn fact_and_policy_never_decay() {
        assert_eq!(decay(MemoryType::Fact, 1000.0, DEFAULT_HALF_LIFE_DAYS), 1.0);
        assert_eq!(decay(MemoryType::Policy, 1000.0, DEFAULT_HALF_LIFE_DAYS), 1.0);
    }

    #[test]
    fn state_decays_to_half_at_half_life() {
        let d = decay(MemoryType::State, DEFAULT_HALF_LIFE_DAYS, DEFAULT_HALF_LIFE_DAYS);
        assert!((d - 0.5).abs() < 1e-3);
    }

    #[test]
    fn age_days_never_negative() {
        let now = Utc::now();
        let future = now + chrono::Duration::hours(1);
        assert_eq!(age_days(future, now), 0.0);
    }
}

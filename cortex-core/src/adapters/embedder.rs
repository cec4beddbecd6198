//! The Embedder capability: `Embed([text]) -> [vec[D]]` (`spec.md` §4.3).

use async_trait::async_trait;

use crate::error::Result;

/// The capability that turns text into fixed-dimension dense vectors.
/// Implementations must preserve input order and cardinality; batched
/// calls are permitted and expected for throughput.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed `texts`, returning one vector per input in the same order.
    ///
    /// # Errors
    /// Returns an error when the underlying model is unreachable; this is
    /// a transient failure the Job Manager may retry.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// The fixed dimension `D` this embedder produces.
    fn dimension(&self) -> usize;
}

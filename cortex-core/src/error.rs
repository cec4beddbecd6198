//! Error taxonomy for the memory service.
//!
//! One variant per cause, not per failing call site, so that every layer
//! above (the Job Manager, the HTTP surface) can match on *why* something
//! failed rather than parse a message. [`Error::code`] is the single place
//! that maps a variant onto the closed error-code set of the external
//! contract.

use uuid::Uuid;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the ingestion pipeline, retrieval engine, job manager
/// and store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("memory not found: {0}")]
    MemoryNotFound(Uuid),

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    Storage(String),

    #[error("analyzer unavailable: {0}")]
    Analyzer(String),

    #[error("embedder unavailable: {0}")]
    Embedder(String),

    #[error("deadline exceeded")]
    Timeout,

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error onto the closed HTTP error-code set from the external
    /// contract: `invalid_argument`, `unauthenticated`, `permission_denied`,
    /// `not_found`, `conflict`, `resource_exhausted`, `timeout`,
    /// `unavailable`, `internal`.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidArgument(_) => "invalid_argument",
            Error::Unauthenticated => "unauthenticated",
            Error::PermissionDenied(_) => "permission_denied",
            Error::MemoryNotFound(_) | Error::JobNotFound(_) => "not_found",
            Error::Conflict(_) => "conflict",
            Error::Storage(_) | Error::Analyzer(_) | Error::Embedder(_) => "unavailable",
            Error::Timeout => "timeout",
            Error::ResourceExhausted(_) => "resource_exhausted",
            Error::Serialization(_) | Error::Internal(_) => "internal",
        }
    }

    /// Whether a caller (the Job Manager's retry loop) may retry this error
    /// with backoff. Only dependency unavailability is transient; validation
    /// and lineage errors are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Storage(_) | Error::Analyzer(_) | Error::Embedder(_) | Error::Timeout
        )
    }

    /// Whether this error originated from the Store. Per `spec.md` §7, a
    /// Store failure mid-ingest aborts the whole job (prior chunks'
    /// transaction visibility cannot be guaranteed), while an
    /// Analyzer/Embedder failure on one chunk only warns and continues.
    #[must_use]
    pub fn is_store_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }
}

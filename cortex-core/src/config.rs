//! Service configuration.
//!
//! A single flat struct loaded once at startup from the environment
//! variables named in the external contract, then passed by value into
//! every component. There is no process-wide singleton beyond the Store
//! connection pool and adapter clients that own it (`spec.md` §9).

use std::env;
use std::time::Duration;

/// Recognized environment variable names, kept as constants so
/// [`Config::from_env`] and documentation never drift apart.
pub mod env_keys {
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const API_KEY: &str = "API_KEY";
    pub const LLM_API_KEY: &str = "LLM_API_KEY";
    pub const EMBEDDING_DIM: &str = "EMBEDDING_DIM";
    pub const UPSERT_THRESHOLD: &str = "UPSERT_THRESHOLD";
    pub const STATE_FRESHNESS_WINDOW_SECONDS: &str = "STATE_FRESHNESS_WINDOW_SECONDS";
    pub const CONTEXT_BUDGET_CHARS: &str = "CONTEXT_BUDGET_CHARS";
    pub const WORKER_POOL_SIZE: &str = "WORKER_POOL_SIZE";
    pub const PER_USER_CONCURRENCY: &str = "PER_USER_CONCURRENCY";
    pub const REQUEST_TIMEOUT_SECONDS: &str = "REQUEST_TIMEOUT_SECONDS";
}

/// Service-wide configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Connection string for the relational store.
    pub database_url: String,
    /// Shared secret required on mutating HTTP routes (`X-API-KEY`).
    pub api_key: Option<String>,
    /// API key for the configured LLM/embedding provider, if the
    /// HTTP-backed adapters are in use.
    pub llm_api_key: Option<String>,
    /// Fixed embedding dimension `D`. Changing this requires a schema
    /// migration; it is read once at startup, never per-request.
    pub embedding_dim: usize,
    /// Cosine-similarity threshold above which a semantic near-duplicate
    /// is treated as a supersession candidate (`spec.md` §4.4).
    pub upsert_threshold: f32,
    /// How long a `state` memory is considered fresh for ranking purposes
    /// before being demoted (`spec.md` §4.5 step 3).
    pub state_freshness_window: Duration,
    /// Character budget for one synthesized context window
    /// (`spec.md` §4.5 step 6).
    pub context_budget_chars: usize,
    /// Number of background ingest workers in the global pool.
    pub worker_pool_size: usize,
    /// Maximum concurrent jobs per user (causal ordering guarantee).
    pub per_user_concurrency: usize,
    /// Per-request deadline for synchronous endpoints.
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "file:cortex.db".to_string(),
            api_key: None,
            llm_api_key: None,
            embedding_dim: 768,
            upsert_threshold: 0.95,
            state_freshness_window: Duration::from_secs(24 * 60 * 60),
            context_budget_chars: 4_000,
            worker_pool_size: 8,
            per_user_concurrency: 1,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Load configuration from the environment, falling back to
    /// [`Config::default`] for any key that is absent or fails to parse.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database_url: env::var(env_keys::DATABASE_URL).unwrap_or(defaults.database_url),
            api_key: env::var(env_keys::API_KEY).ok(),
            llm_api_key: env::var(env_keys::LLM_API_KEY).ok(),
            embedding_dim: parse_env_or(env_keys::EMBEDDING_DIM, defaults.embedding_dim),
            upsert_threshold: parse_env_or(env_keys::UPSERT_THRESHOLD, defaults.upsert_threshold),
            state_freshness_window: Duration::from_secs(parse_env_or(
                env_keys::STATE_FRESHNESS_WINDOW_SECONDS,
                defaults.state_freshness_window.as_secs(),
            )),
            context_budget_chars: parse_env_or(
                env_keys::CONTEXT_BUDGET_CHARS,
                defaults.context_budget_chars,
            ),
            worker_pool_size: parse_env_or(env_keys::WORKER_POOL_SIZE, defaults.worker_pool_size),
            per_user_concurrency: parse_env_or(
                env_keys::PER_USER_CONCURRENCY,
                defaults.per_user_concurrency,
            ),
            request_timeout: Duration::from_secs(parse_env_or(
                env_keys::REQUEST_TIMEOUT_SECONDS,
                defaults.request_timeout.as_secs(),
            )),
        }
    }
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

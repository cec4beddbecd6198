//! Core domain logic for Antigravity Cortex: ingestion, temporal/scope
//! data model, retrieval and ranking, and the asynchronous job lifecycle.
//! Storage, HTTP, and CLI surfaces live in sibling crates; this crate has
//! no I/O dependency beyond the [`store::Store`], [`adapters::Analyzer`],
//! and [`adapters::Embedder`] trait objects it is handed.

pub mod adapters;
pub mod config;
pub mod error;
pub mod jobs;
pub mod manager;
pub mod model;
pub mod normalize;
pub mod retrieval;
pub mod store;
pub mod synthesizer;

pub use config::Config;
pub use error::{Error, Result};

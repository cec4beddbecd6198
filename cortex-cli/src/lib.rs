//! Library half of the `cortex` operator CLI, split out from `main.rs` so
//! the command handlers can be exercised directly in integration tests
//! without going through `assert_cmd`.

pub mod commands;
pub mod output;
pub mod runtime;

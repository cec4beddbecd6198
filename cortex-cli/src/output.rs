//! Output formatting shared by every subcommand. Trimmed down from the
//! teacher's `Human`/`Json`/`Yaml` trio to `Human`/`Json` — nothing in
//! this system's data model benefits from a third serialization shape.

use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain-text summary for a human at a terminal.
    Human,
    /// Pretty-printed JSON for scripting.
    Json,
}

/// Print `value` as JSON, or fall back to `human` when the format is
/// [`OutputFormat::Human`].
pub fn print<T: Serialize>(
    format: OutputFormat,
    value: &T,
    human: impl FnOnce(&T) -> String,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Human => println!("{}", human(value)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

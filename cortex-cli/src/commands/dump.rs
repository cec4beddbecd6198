use std::io::Write;
use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::runtime::Components;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DumpFormat {
    Json,
    Jsonl,
}

#[derive(Args, Debug)]
pub struct DumpArgs {
    /// "json" for a single array, "jsonl" for newline-delimited objects.
    #[arg(long, value_enum, default_value_t = DumpFormat::Json)]
    pub format: DumpFormat,

    /// Write to this file instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub async fn run(components: &Components, args: DumpArgs) -> anyhow::Result<()> {
    let memories = components.store.dump_all().await?;

    let body = match args.format {
        DumpFormat::Json => serde_json::to_string_pretty(&memories)?,
        DumpFormat::Jsonl => memories
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?
            .join("\n"),
    };

    match args.out {
        Some(path) => std::fs::write(path, body)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{body}")?;
        }
    }

    Ok(())
}

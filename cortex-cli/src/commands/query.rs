use clap::Args;

use cortex_core::store::{Cursor, MemoryFilter};

use crate::output::{self, OutputFormat};
use crate::runtime::{parse_enum, Components};

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// User to list memories for.
    #[arg(long)]
    pub user_id: String,

    /// Restrict to "global" or "agent" scope.
    #[arg(long)]
    pub scope: Option<String>,

    /// Agent name, used together with `--scope agent`.
    #[arg(long)]
    pub agent_id: Option<String>,

    /// Restrict to one memory type: fact, state, episode, policy.
    #[arg(long)]
    pub memory_type: Option<String>,

    /// Require all of these tags (repeatable).
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Case-sensitive substring match over memory content.
    #[arg(long)]
    pub q: Option<String>,

    /// Maximum rows to return.
    #[arg(long, default_value_t = 50)]
    pub limit: usize,

    /// Opaque cursor from a previous page's output.
    #[arg(long)]
    pub cursor: Option<String>,
}

pub async fn run(
    components: &Components,
    args: QueryArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let mut filter = MemoryFilter::new(args.user_id).with_limit(args.limit);
    if let Some(scope) = args.scope {
        filter = filter.with_scope(parse_enum(&scope)?, args.agent_id);
    }
    if let Some(memory_type) = args.memory_type {
        filter.memory_type = Some(parse_enum(&memory_type)?);
    }
    filter.tags = args.tags;
    filter.q = args.q;
    filter.cursor = args
        .cursor
        .as_deref()
        .map(Cursor::decode)
        .map(|c| c.ok_or_else(|| anyhow::anyhow!("invalid cursor")))
        .transpose()?;

    let (memories, cursor) = components.retrieval_engine.query(&filter).await?;

    output::print(format, &(memories, cursor), |(memories, cursor)| {
        let mut lines: Vec<String> = memories
            .iter()
            .map(|m| format!("{}  [{:?}/{:?}]  {}", m.id, m.memory_type, m.scope, m.content))
            .collect();
        lines.push(format!(
            "-- {} memories, next cursor: {}",
            memories.len(),
            cursor.as_ref().map(Cursor::encode).unwrap_or_default()
        ));
        lines.join("\n")
    })
}

use clap::Args;

use cortex_core::model::Scope;
use cortex_core::retrieval::ContextRequest;

use crate::output::{self, OutputFormat};
use crate::runtime::{parse_enum, Components};

#[derive(Args, Debug)]
pub struct ContextArgs {
    /// User to synthesize context for.
    #[arg(long)]
    pub user_id: String,

    /// The natural-language query driving retrieval.
    pub query: String,

    /// Visibility scope to search: "global" or "agent".
    #[arg(long, default_value = "global")]
    pub scope: String,

    /// Agent name, used together with `--scope agent`.
    #[arg(long)]
    pub agent_id: Option<String>,

    /// Number of memories to retrieve before synthesis.
    #[arg(long, default_value_t = 5)]
    pub k: usize,

    /// Also search global memories when scoped to an agent.
    #[arg(long, default_value_t = true)]
    pub include_global: bool,

    /// Include retired (superseded) memories in the candidate set.
    #[arg(long)]
    pub include_retired: bool,

    /// Attach per-memory scores and ranks to the output.
    #[arg(long)]
    pub return_evidence: bool,
}

pub async fn run(
    components: &Components,
    args: ContextArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let scope: Scope = parse_enum(&args.scope)?;

    let request = ContextRequest {
        user_id: args.user_id,
        query: args.query,
        app_context: None,
        scope,
        agent_id: args.agent_id,
        k: args.k,
        include_global: args.include_global,
        include_retired: args.include_retired,
        return_evidence: args.return_evidence,
    };

    let result = components.retrieval_engine.context(request).await?;

    output::print(format, &result, |result| {
        let mut out = result.summary.clone();
        for bullet in &result.bullets {
            out.push_str(&format!("\n- {bullet}"));
        }
        out
    })
}

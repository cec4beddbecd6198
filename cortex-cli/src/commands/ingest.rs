use std::path::PathBuf;

use clap::Args;

use cortex_core::manager::IngestRequest;
use cortex_core::model::InputChannel;

use crate::output::{self, OutputFormat};
use crate::runtime::{parse_enum, Components};

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Path to a UTF-8 text file to ingest through the normal pipeline.
    pub file: PathBuf,

    /// User the extracted memories belong to.
    #[arg(long)]
    pub user_id: String,

    /// Visibility scope: "global" or "agent".
    #[arg(long, default_value = "global")]
    pub scope: String,

    /// Agent name, required when `--scope agent`.
    #[arg(long)]
    pub agent_id: Option<String>,

    /// Provenance label; defaults to the file path.
    #[arg(long)]
    pub source: Option<String>,

    /// Block until the background job reaches a terminal state instead
    /// of returning the job id immediately.
    #[arg(long)]
    pub wait: bool,
}

pub async fn run(
    components: &Components,
    args: IngestArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.file)?;
    let scope = parse_enum(&args.scope)?;
    let source = args
        .source
        .or_else(|| args.file.to_str().map(str::to_string));

    let request = IngestRequest {
        user_id: args.user_id,
        text,
        source,
        scope,
        agent_id: args.agent_id,
        event_time: None,
        input_channel: InputChannel::Import,
    };

    let mut job = components.job_manager.accept(request, None).await?;

    if !args.wait {
        return output::print(format, &job, |job| {
            format!("accepted job {} (status: {:?})", job.job_id, job.status)
        });
    }

    while !job.is_terminal() {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        job = components.job_manager.get_status(job.job_id).await?;
    }

    output::print(format, &job, |job| match (&job.result, &job.error) {
        (Some(result), _) => format!(
            "job {} done: {} created, {} updated, {} skipped",
            job.job_id, result.created_count, result.updated_count, result.skipped_count
        ),
        (None, Some(error)) => format!("job {} failed: {error}", job.job_id),
        (None, None) => format!("job {} finished with no result", job.job_id),
    })
}

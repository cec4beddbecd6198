use clap::Args;
use uuid::Uuid;

use crate::output::{self, OutputFormat};
use crate::runtime::Components;

#[derive(Args, Debug)]
pub struct JobStatusArgs {
    /// The job id returned by `cortex ingest`.
    pub job_id: Uuid,
}

pub async fn run(
    components: &Components,
    args: JobStatusArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let job = components.job_manager.get_status(args.job_id).await?;
    output::print(format, &job, |job| {
        format!("job {} status: {:?}", job.job_id, job.status)
    })
}

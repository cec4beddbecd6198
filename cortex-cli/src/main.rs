use clap::{Parser, Subcommand};

use cortex_cli::commands::{context, dump, ingest, job, query, serve};
use cortex_cli::output::OutputFormat;
use cortex_cli::runtime::Components;
use cortex_core::config::Config;

#[derive(Parser)]
#[command(name = "cortex")]
#[command(about = "Operator CLI for the Antigravity Cortex memory service")]
#[command(version, long_about = None)]
struct Cli {
    /// Output format for commands that print data.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Human)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a text file through the normal async pipeline.
    Ingest(ingest::IngestArgs),
    /// Inspect the status of a previously accepted ingest job.
    Job(job::JobStatusArgs),
    /// List memories for a user with structured filters.
    Query(query::QueryArgs),
    /// Run the retrieval + synthesis pipeline and print the resulting context.
    Context(context::ContextArgs),
    /// Export every current memory as JSON or JSONL.
    Dump(dump::DumpArgs),
    /// Run the HTTP server in the foreground.
    Serve(serve::ServeArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    let components = Components::build(&config).await?;

    match cli.command {
        Commands::Ingest(args) => ingest::run(&components, args, cli.format).await,
        Commands::Job(args) => job::run(&components, args, cli.format).await,
        Commands::Query(args) => query::run(&components, args, cli.format).await,
        Commands::Context(args) => context::run(&components, args, cli.format).await,
        Commands::Dump(args) => dump::run(&components, args).await,
        Commands::Serve(args) => serve::run(components, &config, args).await,
    }
}

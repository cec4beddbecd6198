use clap::Args;

use cortex_core::config::Config;
use cortex_server::AppState;

use crate::runtime::Components;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind the HTTP listener to.
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub bind: String,
}

pub async fn run(components: Components, config: &Config, args: ServeArgs) -> anyhow::Result<()> {
    components.job_manager.spawn_workers();

    let state = AppState {
        store: components.store,
        memory_manager: components.memory_manager,
        job_manager: components.job_manager,
        retrieval_engine: components.retrieval_engine,
        api_key: config.api_key.clone(),
    };

    let app = cortex_server::build_router(state, config.request_timeout);
    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

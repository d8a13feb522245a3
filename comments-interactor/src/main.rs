use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use comments_interactor::{
    cli::Cli,
    engine::EngineClient,
    server::{self, InteractorState},
};

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let engine = EngineClient::new(&cli.engine_endpoint, cli.request_timeout())
        .context("failed to build engine client")?;
    let state = InteractorState::new(engine).context("failed to build metrics")?;

    let address = cli.listen_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    server::serve(listener, state, server::shutdown_signal())
        .await
        .context("server error")?;

    info!("server closed");
    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use comments_engine::{
    cli::{Cli, StoreBackend},
    server::{self, EngineState},
    store::{KvStore, MemoryStore, RedisStore},
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
    match cli.store {
        StoreBackend::Redis => {
            info!(endpoint = %cli.redis_endpoint, "using redis store");
            let store = RedisStore::open(&cli.redis_endpoint, cli.store_timeout())
                .context("invalid redis endpoint")?;
            run(&cli, store).await
        }
        StoreBackend::Memory => {
            info!("using in-memory store");
            run(&cli, MemoryStore::new()).await
        }
    }
}

async fn run<S: KvStore>(cli: &Cli, store: S) -> Result<()> {
    let state = EngineState::new(store, cli.increment_mode).context("failed to build metrics")?;

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

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::sequence::IncrementMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    /// Redis at `--redis-endpoint`.
    Redis,
    /// Process-local map; contents are lost on exit.
    Memory,
}

/// Storage-facing half of the comments service.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Interface to listen on.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on. Use 0 for an ephemeral port.
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Redis `host:port`.
    #[arg(long, env = "REDIS_ENDPOINT", default_value = "localhost:6379")]
    pub redis_endpoint: String,

    #[arg(long, env = "STORE", value_enum, default_value_t = StoreBackend::Redis)]
    pub store: StoreBackend,

    /// How comment indices are allocated. `read-then-write` reproduces the
    /// legacy non-atomic counter.
    #[arg(long, env = "INCREMENT_MODE", value_enum, default_value_t = IncrementMode::Atomic)]
    pub increment_mode: IncrementMode,

    /// Upper bound on any single store call, in milliseconds.
    #[arg(long, env = "STORE_TIMEOUT_MS", default_value_t = 1000)]
    pub store_timeout_ms: u64,
}

impl Cli {
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

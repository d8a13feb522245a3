use std::time::Duration;

use clap::Parser;

/// Front-facing half of the comments service: an HTML dashboard in front of
/// the comments engine.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Interface to listen on.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on. Use 0 for an ephemeral port.
    #[arg(long, env = "PORT", default_value_t = 9000)]
    pub port: u16,

    /// `host:port` of the comments engine.
    #[arg(long, env = "COMMENTS_ENGINE_ENDPOINT", default_value = "127.0.0.1:8000")]
    pub engine_endpoint: String,

    /// Timeout for each request to the engine, in milliseconds.
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value_t = 2000)]
    pub request_timeout_ms: u64,
}

impl Cli {
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

use std::{future::Future, sync::Arc};

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::{
    net::TcpListener,
    signal::{self, ctrl_c},
};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{
    metrics::{self, EngineMetrics},
    repository::CommentRepository,
    routes::{comment_handler, latest_handler, method_not_post, root_handler},
    sequence::IncrementMode,
    store::KvStore,
};

/// Everything a request handler can reach. Built once at startup.
pub struct EngineState<S> {
    pub repository: CommentRepository<S>,
    pub metrics: EngineMetrics,
}

impl<S: KvStore> EngineState<S> {
    pub fn new(store: S, mode: IncrementMode) -> Result<Arc<Self>, prometheus::Error> {
        Ok(Arc::new(Self {
            repository: CommentRepository::new(store, mode),
            metrics: EngineMetrics::new()?,
        }))
    }
}

pub fn router<S: KvStore>(state: Arc<EngineState<S>>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/latest", get(latest_handler::<S>))
        .route(
            "/comment",
            post(comment_handler::<S>).fallback(method_not_post),
        )
        .route("/metrics", get(metrics::metrics_handler::<S>))
        .fallback(root_handler)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            metrics::track::<S>,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the engine on `listener` until `shutdown` resolves.
pub async fn serve<S, F>(
    listener: TcpListener,
    state: Arc<EngineState<S>>,
    shutdown: F,
) -> std::io::Result<()>
where
    S: KvStore,
    F: Future<Output = ()> + Send + 'static,
{
    info!(
        addr = ?listener.local_addr().ok(),
        mode = ?state.repository.sequence().mode(),
        "comments engine listening"
    );
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Resolves on Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = ctrl_c().await {
            warn!(error = ?err, "failed to install ctrl-c handler");
            std::future::pending::<()>().await;
        }
        info!("received ctrl-c, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(err) => {
                warn!(error = ?err, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

use std::{future::Future, sync::Arc};

use axum::{Router, middleware, routing::get};
use tokio::{
    net::TcpListener,
    signal::{self, ctrl_c},
};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{
    engine::EngineClient,
    metrics::{self, InteractorMetrics},
    routes::{dashboard_handler, submit_handler},
};

pub struct InteractorState {
    pub engine: EngineClient,
    pub metrics: InteractorMetrics,
}

impl InteractorState {
    pub fn new(engine: EngineClient) -> Result<Arc<Self>, prometheus::Error> {
        Ok(Arc::new(Self {
            engine,
            metrics: InteractorMetrics::new()?,
        }))
    }
}

pub fn router(state: Arc<InteractorState>) -> Router {
    Router::new()
        .route("/", get(dashboard_handler).post(submit_handler))
        .route("/metrics", get(metrics::metrics_handler))
        .layer(middleware::from_fn_with_state(state.clone(), metrics::track))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve<F>(
    listener: TcpListener,
    state: Arc<InteractorState>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(
        addr = ?listener.local_addr().ok(),
        engine = state.engine.base_url(),
        "comments interactor listening"
    );
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

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

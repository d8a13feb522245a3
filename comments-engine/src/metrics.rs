//! Prometheus counters exposed on `/metrics`.
//!
//! Each [`EngineMetrics`] owns its own [`Registry`], so several engines (as in
//! the integration tests) never collide on metric names.

use std::sync::Arc;

use axum::{
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::{server::EngineState, store::KvStore};

pub struct EngineMetrics {
    registry: Registry,
    http_hits: IntCounterVec,
    comments_received: IntCounter,
    errors_sent: IntCounter,
}

impl EngineMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_hits = IntCounterVec::new(
            Opts::new(
                "comments_engine_http_hits_total",
                "The total number of hits on a given route",
            ),
            &["route", "method"],
        )?;
        let comments_received = IntCounter::new(
            "comments_engine_comments_received_total",
            "The total number of comments received",
        )?;
        let errors_sent = IntCounter::new(
            "comments_engine_errors_sent_total",
            "The total number of errors returned",
        )?;

        registry.register(Box::new(http_hits.clone()))?;
        registry.register(Box::new(comments_received.clone()))?;
        registry.register(Box::new(errors_sent.clone()))?;

        Ok(Self {
            registry,
            http_hits,
            comments_received,
            errors_sent,
        })
    }

    pub fn hit(&self, route: &str, method: &str) {
        self.http_hits.with_label_values(&[route, method]).inc();
    }

    pub fn comment_received(&self) {
        self.comments_received.inc();
    }

    pub fn error_sent(&self) {
        self.errors_sent.inc();
    }

    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|err| prometheus::Error::Msg(err.to_string()))
    }
}

/// Counts every routed request, and every error response, on the way out.
pub async fn track<S: KvStore>(
    State(state): State<Arc<EngineState<S>>>,
    request: Request,
    next: Next,
) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = request.method().as_str().to_string();
    state.metrics.hit(&route, &method);

    let response = next.run(request).await;
    if response.status().is_client_error() || response.status().is_server_error() {
        state.metrics.error_sent();
    }
    response
}

pub async fn metrics_handler<S: KvStore>(State(state): State<Arc<EngineState<S>>>) -> Response {
    match state.metrics.render() {
        Ok(body) => body.into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}

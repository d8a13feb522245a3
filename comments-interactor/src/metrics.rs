use std::sync::Arc;

use axum::{
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::server::InteractorState;

pub struct InteractorMetrics {
    registry: Registry,
    http_hits: IntCounterVec,
    comments_received: IntCounter,
    comments_posted: IntCounter,
}

impl InteractorMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_hits = IntCounterVec::new(
            Opts::new(
                "comments_interactor_http_hits_total",
                "The total number of hits on a given route",
            ),
            &["route", "method"],
        )?;
        let comments_received = IntCounter::new(
            "comments_interactor_comments_received_total",
            "The total number of comments received (successfully posted or not)",
        )?;
        let comments_posted = IntCounter::new(
            "comments_interactor_comments_posted_total",
            "The total number of comments posted (successfully posted)",
        )?;

        registry.register(Box::new(http_hits.clone()))?;
        registry.register(Box::new(comments_received.clone()))?;
        registry.register(Box::new(comments_posted.clone()))?;

        Ok(Self {
            registry,
            http_hits,
            comments_received,
            comments_posted,
        })
    }

    pub fn hit(&self, route: &str, method: &str) {
        self.http_hits.with_label_values(&[route, method]).inc();
    }

    pub fn comment_received(&self) {
        self.comments_received.inc();
    }

    pub fn comment_posted(&self) {
        self.comments_posted.inc();
    }

    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|err| prometheus::Error::Msg(err.to_string()))
    }
}

pub async fn track(
    State(state): State<Arc<InteractorState>>,
    request: Request,
    next: Next,
) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    state.metrics.hit(&route, request.method().as_str());
    next.run(request).await
}

pub async fn metrics_handler(State(state): State<Arc<InteractorState>>) -> Response {
    match state.metrics.render() {
        Ok(body) => body.into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}

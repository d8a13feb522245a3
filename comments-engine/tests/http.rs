use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header::CONTENT_TYPE},
};
use comments_engine::{
    error::ErrorPayload,
    routes::Stored,
    sequence::{COUNTER_KEY, IncrementMode},
    server::{self, EngineState},
    store::{KvStore, MemoryStore},
};
use serde_json::json;
use tokio::{net::TcpListener, sync::oneshot};
use tower::ServiceExt;

fn engine() -> Result<(MemoryStore, Arc<EngineState<MemoryStore>>)> {
    let store = MemoryStore::new();
    let state = EngineState::new(store.clone(), IncrementMode::Atomic)?;
    Ok((store, state))
}

async fn send(app: Router, request: Request<Body>) -> Result<(StatusCode, Vec<u8>)> {
    let response = app.oneshot(request).await?;
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, body.to_vec()))
}

fn post_comment(body: &str) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method(Method::POST)
        .uri("/comment")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))?)
}

fn get(uri: &str) -> Result<Request<Body>> {
    Ok(Request::builder().uri(uri).body(Body::empty())?)
}

#[tokio::test]
async fn root_answers_with_banner() -> Result<()> {
    let (_, state) = engine()?;
    let (status, body) = send(server::router(state), get("/")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"comments engine answering here!\n");
    Ok(())
}

#[tokio::test]
async fn unknown_paths_get_the_banner_too() -> Result<()> {
    let (_, state) = engine()?;
    let (status, body) = send(server::router(state.clone()), get("/nowhere")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"comments engine answering here!\n");

    let metrics = state.metrics.render()?;
    assert!(metrics.contains(r#"comments_engine_http_hits_total{method="GET",route="unmatched"} 1"#));
    assert!(metrics.contains("comments_engine_errors_sent_total 0"));
    Ok(())
}

#[tokio::test]
async fn posted_comments_come_back_newest_first() -> Result<()> {
    let (_, state) = engine()?;

    for (i, text) in ["alpha", "beta"].into_iter().enumerate() {
        let request = post_comment(&json!({ "comment": text }).to_string())?;
        let (status, body) = send(server::router(state.clone()), request).await?;
        assert_eq!(status, StatusCode::OK);
        let stored: Stored = serde_json::from_slice(&body)?;
        assert_eq!(
            stored,
            Stored {
                message: "stored !".to_string(),
                index: i as u64 + 1,
            }
        );
    }

    let (status, body) = send(server::router(state), get("/latest")?).await?;
    assert_eq!(status, StatusCode::OK);
    let latest: Vec<String> = serde_json::from_slice(&body)?;
    assert_eq!(latest, vec!["beta".to_string(), "alpha".to_string()]);
    Ok(())
}

#[tokio::test]
async fn latest_on_empty_store_is_an_empty_array() -> Result<()> {
    let (_, state) = engine()?;
    let (status, body) = send(server::router(state), get("/latest")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"[]");
    Ok(())
}

#[tokio::test]
async fn malformed_body_is_rejected_before_the_store() -> Result<()> {
    let (store, state) = engine()?;
    let (status, body) = send(server::router(state), post_comment("{not json")?).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let payload: ErrorPayload = serde_json::from_slice(&body)?;
    assert_eq!(payload.additional_info, "The data sent was likely incorrect");
    assert!(store.snapshot().is_empty());
    Ok(())
}

#[tokio::test]
async fn empty_comment_is_a_validation_failure() -> Result<()> {
    let (store, state) = engine()?;
    let request = post_comment(&json!({ "comment": "" }).to_string())?;
    let (status, body) = send(server::router(state), request).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let payload: ErrorPayload = serde_json::from_slice(&body)?;
    assert_eq!(payload.message, "Empty comment");
    assert!(store.snapshot().is_empty());
    Ok(())
}

#[tokio::test]
async fn comment_route_only_accepts_post() -> Result<()> {
    let (_, state) = engine()?;
    let (status, body) = send(server::router(state), get("/comment")?).await?;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    let payload: ErrorPayload = serde_json::from_slice(&body)?;
    assert_eq!(
        payload,
        ErrorPayload {
            message: "POST not used".to_string(),
            additional_info: "HTTP method was not POST".to_string(),
        }
    );
    Ok(())
}

#[tokio::test]
async fn corrupt_counter_surfaces_as_server_error() -> Result<()> {
    let (store, state) = engine()?;
    store.set(COUNTER_KEY, "twelve").await?;

    let (status, body) = send(server::router(state.clone()), get("/latest")?).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let payload: ErrorPayload = serde_json::from_slice(&body)?;
    assert!(payload.message.starts_with("corrupt state"));
    assert_eq!(
        payload.additional_info,
        "Maybe there is a problem with the store backend?"
    );

    let request = post_comment(&json!({ "comment": "hi" }).to_string())?;
    let (status, body) = send(server::router(state), request).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let payload: ErrorPayload = serde_json::from_slice(&body)?;
    assert_eq!(payload.additional_info, "Problem with the store maybe?");
    Ok(())
}

#[tokio::test]
async fn served_engine_counts_hits_and_errors() -> Result<()> {
    let (_, state) = engine()?;
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(server::serve(listener, state, async move {
        let _ = shutdown_rx.await;
    }));

    let client = reqwest::Client::new();
    let base = format!("http://{addr}");

    let response = client
        .post(format!("{base}/comment"))
        .json(&json!({ "comment": "over the wire" }))
        .send()
        .await?;
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let latest: Vec<String> = client
        .get(format!("{base}/latest"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(latest, vec!["over the wire".to_string()]);

    let response = client.get(format!("{base}/comment")).send().await?;
    assert_eq!(response.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);

    let metrics = client
        .get(format!("{base}/metrics"))
        .send()
        .await?
        .text()
        .await?;
    assert!(metrics.contains(r#"comments_engine_http_hits_total{method="POST",route="/comment"} 1"#));
    assert!(metrics.contains(r#"comments_engine_http_hits_total{method="GET",route="/latest"} 1"#));
    assert!(metrics.contains("comments_engine_comments_received_total 1"));
    assert!(metrics.contains("comments_engine_errors_sent_total 1"));

    drop(client);
    let _ = shutdown_tx.send(());
    server.await??;
    Ok(())
}

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{error::ApiError, server::EngineState, store::KvStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stored {
    pub message: String,
    pub index: u64,
}

pub async fn root_handler() -> &'static str {
    "comments engine answering here!\n"
}

pub async fn latest_handler<S: KvStore>(
    State(state): State<Arc<EngineState<S>>>,
) -> Result<Json<Vec<String>>, ApiError> {
    let comments = state.repository.latest().await.map_err(|err| {
        ApiError::repository(err, "Maybe there is a problem with the store backend?")
    })?;

    Ok(Json(comments))
}

pub async fn comment_handler<S: KvStore>(
    State(state): State<Arc<EngineState<S>>>,
    payload: Result<Json<Comment>, JsonRejection>,
) -> Result<Json<Stored>, ApiError> {
    let Json(Comment { comment }) =
        payload.map_err(|rejection| ApiError::MalformedPayload(rejection.body_text()))?;

    if comment.is_empty() {
        return Err(ApiError::Validation("Empty comment".to_string()));
    }

    let index = state
        .repository
        .store(&comment)
        .await
        .map_err(|err| ApiError::repository(err, "Problem with the store maybe?"))?;

    state.metrics.comment_received();
    info!(index, "comment stored");

    Ok(Json(Stored {
        message: "stored !".to_string(),
        index,
    }))
}

pub async fn method_not_post() -> ApiError {
    ApiError::MethodNotAllowed
}

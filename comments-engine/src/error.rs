use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

/// Failures of the indexing and retrieval core.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("corrupt state under {key:?}: {detail}")]
    CorruptState { key: String, detail: String },
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(reason) => EngineError::StoreUnavailable(reason),
            StoreError::NotACounter { key } => EngineError::CorruptState {
                key,
                detail: "value cannot be incremented".to_string(),
            },
        }
    }
}

/// Body returned with every non-success response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
    #[serde(rename = "additionalInfo", default)]
    pub additional_info: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    MalformedPayload(String),

    #[error("POST not used")]
    MethodNotAllowed,

    #[error("{source}")]
    Repository {
        source: EngineError,
        hint: &'static str,
    },
}

impl ApiError {
    pub fn repository(source: EngineError, hint: &'static str) -> Self {
        ApiError::Repository { source, hint }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Repository { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn hint(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "The comment was empty",
            ApiError::MalformedPayload(_) => "The data sent was likely incorrect",
            ApiError::MethodNotAllowed => "HTTP method was not POST",
            ApiError::Repository { hint, .. } => hint,
        }
    }

    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload {
            message: self.to_string(),
            additional_info: self.hint().to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.payload())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_onto_the_engine_taxonomy() {
        assert_eq!(
            EngineError::from(StoreError::Unavailable("refused".into())),
            EngineError::StoreUnavailable("refused".into())
        );
        assert!(matches!(
            EngineError::from(StoreError::NotACounter { key: "index".into() }),
            EngineError::CorruptState { key, .. } if key == "index"
        ));
    }

    #[test]
    fn payload_uses_the_wire_field_names() {
        let err = ApiError::repository(
            EngineError::StoreUnavailable("connection refused".into()),
            "Problem with the store maybe?",
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = serde_json::to_value(err.payload()).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "message": "store unavailable: connection refused",
                "additionalInfo": "Problem with the store maybe?",
            })
        );
    }
}

//! HTTP client for the comments engine.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum EngineClientError {
    #[error("Error contacting the backend, {0}")]
    Transport(#[from] reqwest::Error),

    #[error("CommentsEngine returned an error: {message}")]
    Engine {
        status: u16,
        message: String,
        additional_info: String,
    },

    #[error("CommentsEngine returned badly formatted values, {0}")]
    Malformed(String),
}

#[derive(Debug, Serialize)]
struct Comment<'a> {
    comment: &'a str,
}

/// Engine acknowledgement for a stored comment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Stored {
    pub message: String,
    #[serde(default)]
    pub index: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    message: String,
    #[serde(rename = "additionalInfo", default)]
    additional_info: String,
}

#[derive(Clone)]
pub struct EngineClient {
    http: reqwest::Client,
    base_url: String,
}

impl EngineClient {
    /// `endpoint` is `host:port`, as in `COMMENTS_ENGINE_ENDPOINT`.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, EngineClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: format!("http://{endpoint}"),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn post_comment(&self, text: &str) -> Result<Stored, EngineClientError> {
        let response = self
            .http
            .post(format!("{}/comment", self.base_url))
            .json(&Comment { comment: text })
            .send()
            .await
            .inspect_err(|err| warn!(error = %err, "could not post to the engine"))?;

        let status = response.status();
        let body = response.bytes().await?;
        decode_stored(status, &body)
    }

    pub async fn latest(&self) -> Result<Vec<String>, EngineClientError> {
        let response = self
            .http
            .get(format!("{}/latest", self.base_url))
            .send()
            .await
            .inspect_err(|err| warn!(error = %err, "could not get latest from the engine"))?;

        let status = response.status();
        let body = response.bytes().await?;
        decode_latest(status, &body)
    }
}

pub(crate) fn decode_stored(status: StatusCode, body: &[u8]) -> Result<Stored, EngineClientError> {
    if status.is_success() {
        return serde_json::from_slice(body).map_err(|err| malformed(&err));
    }
    Err(decode_error(status, body))
}

/// A success body is a JSON array of strings. Anything else is read as the
/// engine's error payload, whatever the status code.
pub(crate) fn decode_latest(
    status: StatusCode,
    body: &[u8],
) -> Result<Vec<String>, EngineClientError> {
    match serde_json::from_slice::<Vec<String>>(body) {
        Ok(comments) => {
            debug!(count = comments.len(), "engine returned comments");
            Ok(comments)
        }
        Err(_) => Err(decode_error(status, body)),
    }
}

fn decode_error(status: StatusCode, body: &[u8]) -> EngineClientError {
    match serde_json::from_slice::<ErrorPayload>(body) {
        Ok(payload) => {
            warn!(%status, message = %payload.message, "engine returned an error");
            EngineClientError::Engine {
                status: status.as_u16(),
                message: payload.message,
                additional_info: payload.additional_info,
            }
        }
        Err(err) => malformed(&err),
    }
}

fn malformed(err: &serde_json::Error) -> EngineClientError {
    warn!(error = %err, "engine returned unexpected value");
    EngineClientError::Malformed(err.to_string())
}

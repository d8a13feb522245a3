//! Front-facing half of the comments service.
//!
//! Serves an HTML page listing the engine's latest comments with a form to
//! post a new one. Submissions are forwarded to the engine's `/comment`
//! endpoint; the page is rendered from its `/latest` endpoint.

pub mod cli;
pub mod dashboard;
pub mod engine;
pub mod metrics;
pub mod routes;
pub mod server;

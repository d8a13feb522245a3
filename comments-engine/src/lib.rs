//! Storage-facing half of the comments service.
//!
//! Comments are written under `comment<N>` keys, where `N` comes from a single
//! counter stored under `index`. Reads walk back from the counter over a fixed
//! window of [`repository::RECENT_WINDOW`] indices.
//!
//! - [`store`] abstracts the key-value store (Redis or in-memory).
//! - [`sequence`] allocates indices from the counter key.
//! - [`repository`] stores comments and serves the recent window.
//! - [`routes`] and [`server`] expose the repository over HTTP with axum.
//! - [`metrics`] keeps the Prometheus counters behind `/metrics`.
//! - [`cli`] parses flags and their environment overrides.

pub mod cli;
pub mod error;
pub mod metrics;
pub mod repository;
pub mod routes;
pub mod sequence;
pub mod server;
pub mod store;

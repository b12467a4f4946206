#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Fetch orchestration for per-agency dataset endpoints.
//!
//! The [`FetchOrchestrator`](orchestrator::FetchOrchestrator) maps
//! `(DatasetKey, EntityScope, QueryParams)` to a concrete request, issues
//! it through an [`HttpClient`](client::HttpClient), and drives the
//! dataset store's state machine. Fetch-level failures — transport errors,
//! non-2xx statuses, malformed payloads — are all converted into store
//! state here; nothing throws past this boundary.

pub mod client;
pub mod endpoints;
pub mod orchestrator;
pub mod retry;
pub mod rules;

use traffic_stops_datasets_models::DatasetKey;

/// Errors that can occur while fetching a dataset.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed at the transport level.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("HTTP {status}")]
    Status {
        /// The response status code.
        status: reqwest::StatusCode,
    },

    /// Response body was not valid JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Body was valid JSON but not the shape expected for the key.
    #[error("malformed {key} payload: {message}")]
    MalformedPayload {
        /// Which dataset the payload was fetched for.
        key: DatasetKey,
        /// Description of the shape mismatch.
        message: String,
    },

    /// The entity scope cannot be fetched (e.g., empty agency id).
    #[error("invalid entity scope: {message}")]
    InvalidScope {
        /// Description of what is wrong with the scope.
        message: String,
    },
}

//! HTTP client boundary.
//!
//! The orchestrator only needs "GET this URL, give me JSON". Keeping that
//! behind a trait keeps the transport swappable and lets orchestrator
//! tests run against an in-memory client.

use std::time::Duration;

use async_trait::async_trait;

use crate::{FetchError, retry};

/// Per-request timeout. Statistics payloads are small; anything slower
/// than this is effectively down.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimal JSON-over-HTTP client the orchestrator fetches through.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetches `url` and returns the parsed JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] for transport failures, non-success
    /// statuses, and non-JSON bodies.
    async fn get_json(&self, url: &str) -> Result<serde_json::Value, FetchError>;
}

/// [`reqwest`]-backed client with retry/backoff for transient failures.
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Builds a client with the standard request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] when the TLS backend cannot be
    /// initialized.
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get_json(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        retry::get_json(&self.client, url).await
    }
}

//! HTTP retry helper for transient errors.
//!
//! The dashboard issues one small JSON GET per dataset, so the policy is
//! simpler than a bulk-ingest pipeline's: retry connection-level failures,
//! HTTP 429, and 5xx with exponential backoff; treat other 4xx and
//! undecodable bodies as permanent.

use std::time::Duration;

use crate::FetchError;

/// Maximum retry attempts for transient failures. With exponential
/// backoff (2s, 4s, 8s) the total wait before giving up is 14 seconds.
const MAX_RETRIES: u32 = 3;

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 500;

/// Sends a GET request for `url` and parses the response body as JSON.
///
/// Retries transient failures (timeouts, connection resets, HTTP 429 and
/// 5xx) up to [`MAX_RETRIES`] times with exponential backoff. Other 4xx
/// statuses are permanent and fail immediately. A 2xx body that cannot be
/// parsed as JSON fails with the parse error; the body preview is logged.
///
/// # Errors
///
/// Returns [`FetchError`] when the request fails after all retries, the
/// server answers with a non-retryable status, or the body is not JSON.
#[allow(clippy::future_not_send)]
pub async fn get_json(
    client: &reqwest::Client,
    url: &str,
) -> Result<serde_json::Value, FetchError> {
    let response = send_with_retries(client, url).await?;
    let status = response.status();

    let text = response.text().await?;
    match serde_json::from_str(&text) {
        Ok(value) => Ok(value),
        Err(json_err) => {
            let preview = body_preview(&text);
            log::error!(
                "JSON parse failed for {url}\n  \
                 status: {status}\n  \
                 received: {} bytes\n  \
                 parse error: {json_err}\n  \
                 body preview: {preview}",
                text.len(),
            );
            Err(FetchError::Json(json_err))
        }
    }
}

#[allow(clippy::future_not_send)]
async fn send_with_retries(
    client: &reqwest::Client,
    url: &str,
) -> Result<reqwest::Response, FetchError> {
    for attempt in 0..=MAX_RETRIES {
        if attempt > 0 {
            let delay = Duration::from_secs(1u64 << attempt); // 2s, 4s, 8s
            log::warn!("  retry {attempt}/{MAX_RETRIES} for {url} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match client.get(url).send().await {
            Err(e) => {
                if is_transient(&e) && attempt < MAX_RETRIES {
                    log::warn!("  transient error fetching {url}: {e}");
                    continue;
                }
                return Err(FetchError::Http(e));
            }
            Ok(response) => {
                let status = response.status();

                let retryable = status == reqwest::StatusCode::TOO_MANY_REQUESTS
                    || status.is_server_error();
                if retryable {
                    if attempt < MAX_RETRIES {
                        log::warn!("  HTTP {status} fetching {url}");
                        continue;
                    }
                    return Err(FetchError::Status { status });
                }

                // Other 4xx are permanent.
                if status.is_client_error() {
                    return Err(FetchError::Status { status });
                }

                return Ok(response);
            }
        }
    }

    unreachable!("retry loop exits through a return")
}

/// `true` when the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_decode() || e.is_request()
}

/// Truncates a body for logging. The cut is backed off to a char boundary
/// so a multi-byte character straddling the limit cannot panic the slice.
fn body_preview(text: &str) -> String {
    if text.len() <= BODY_PREVIEW_LEN {
        return text.to_string();
    }
    let mut end = BODY_PREVIEW_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

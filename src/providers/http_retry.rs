//! HTTP retry wrapper for REST-backed stores.
//!
//! `send_with_retry()` replaces `request.send()` and adds:
//! - Exponential backoff with jitter on 429 (Too Many Requests) and 5xx errors
//! - Retry-After header parsing (seconds only)
//! - Transparent passthrough for every other status code

use reqwest::{RequestBuilder, Response};
use std::time::Duration;

use super::StoreError;

/// Retry behaviour for one store
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (default: 3)
    pub max_retries: u32,
    /// Base delay in milliseconds for exponential backoff (default: 500)
    pub base_delay_ms: u64,
    /// Maximum delay cap in milliseconds (default: 30000)
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// No retries at all
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Backoff for the given attempt, capped, plus 10-30% jitter
    fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.base_delay_ms.saturating_mul(1u64 << attempt.min(16));
        let capped = base.min(self.max_delay_ms) as f64;
        let jitter = capped * (0.1 + rand::random::<f64>() * 0.2);
        Duration::from_millis((capped + jitter) as u64)
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn parse_retry_after(response: &Response) -> Option<Duration> {
    let value = response.headers().get("retry-after")?.to_str().ok()?;
    let secs = value.trim().parse::<u64>().ok()?;
    Some(Duration::from_secs(secs.min(300)))
}

/// Send a request, retrying on 429/5xx.
///
/// The builder must be cloneable (no streaming body); otherwise the request
/// is sent once.
pub async fn send_with_retry(
    request: RequestBuilder,
    policy: &RetryPolicy,
) -> Result<Response, StoreError> {
    let mut request = request;
    let mut attempt = 0;
    loop {
        let retry = request.try_clone();
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        let status = response.status().as_u16();
        let next = match retry {
            Some(next) if attempt < policy.max_retries && is_retryable_status(status) => next,
            _ => return Ok(response),
        };

        let delay = parse_retry_after(&response).unwrap_or_else(|| policy.delay_for(attempt));
        tracing::debug!(
            "HTTP {} from {}. Retry {}/{} after {:?}",
            status,
            response.url(),
            attempt + 1,
            policy.max_retries,
            delay
        );
        tokio::time::sleep(delay).await;

        attempt += 1;
        request = next;
    }
}

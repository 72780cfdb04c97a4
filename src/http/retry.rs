//! Retry with exponential backoff
//!
//! `Backoff` is an explicit state machine (attempts made, next delay) so the
//! bound on attempts and the delay sequence can be checked without a network.

use super::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::config::HttpConfig;
use crate::error::{is_transient_status, Error, Result};
use std::time::Duration;
use tracing::warn;

/// Maximum number of body bytes kept in a non-transient error
const ERROR_BODY_LIMIT: usize = 512;

/// Retry bounds for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub initial_backoff: Duration,
    /// Ceiling for the computed delay
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl From<&HttpConfig> for RetryPolicy {
    fn from(config: &HttpConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: config.initial_backoff(),
            max_backoff: config.max_backoff(),
        }
    }
}

impl RetryPolicy {
    /// Create a policy
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff,
        }
    }
}

/// Backoff state for one request
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: RetryPolicy,
    attempts: u32,
    next_delay: Duration,
}

impl Backoff {
    /// Start with no attempts made
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            next_delay: policy.initial_backoff.min(policy.max_backoff),
        }
    }

    /// Attempts recorded so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay the next failure will produce, ignoring any hint
    pub fn next_delay(&self) -> Duration {
        self.next_delay
    }

    /// Record a failed attempt
    ///
    /// Returns the delay to wait before resending, or `None` once
    /// `max_attempts` is reached. A server hint replaces the computed delay
    /// for this attempt; the computed sequence keeps doubling underneath.
    pub fn on_failure(&mut self, hint: Option<Duration>) -> Option<Duration> {
        self.attempts += 1;
        if self.attempts >= self.policy.max_attempts {
            return None;
        }

        let computed = self.next_delay;
        self.next_delay = self
            .next_delay
            .saturating_mul(2)
            .min(self.policy.max_backoff);
        Some(hint.unwrap_or(computed))
    }
}

/// Send a request, retrying transient failures
///
/// 2xx responses are returned. 429/500/502/503 responses, timeouts and
/// connection failures are retried up to the policy bound and then surface as
/// the last error. Any other status fails immediately with
/// `Error::NonTransientHttp`.
pub async fn send_with_retry(
    transport: &dyn HttpTransport,
    request: &HttpRequest,
    policy: &RetryPolicy,
) -> Result<HttpResponse> {
    let mut backoff = Backoff::new(*policy);

    loop {
        let (error, hint) = match transport.send(request).await {
            Ok(response) if response.is_success() => return Ok(response),
            Ok(response) if is_transient_status(response.status) => (
                Error::TransientHttp {
                    status: response.status,
                    attempts: backoff.attempts() + 1,
                },
                response.retry_after,
            ),
            Ok(response) => {
                return Err(Error::http_status(
                    response.status,
                    truncate(&response.body, ERROR_BODY_LIMIT),
                ))
            }
            Err(e) if e.is_transient() => (e, None),
            Err(e) => return Err(e),
        };

        match backoff.on_failure(hint) {
            Some(delay) => {
                warn!(
                    url = %request.url,
                    attempt = backoff.attempts(),
                    max_attempts = policy.max_attempts,
                    error = %error,
                    "Transient failure, retrying in {delay:?}"
                );
                tokio::time::sleep(delay).await;
            }
            None => return Err(error),
        }
    }
}

fn truncate(body: &str, limit: usize) -> String {
    if body.len() <= limit {
        return body.to_string();
    }
    let mut end = limit;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

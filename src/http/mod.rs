//! HTTP module
//!
//! Provides the transport seam the extractor sends requests through, plus
//! retry with exponential backoff and client-side rate limiting.
//!
//! # Features
//!
//! - **Transport trait**: `HttpTransport` decouples page fetching from reqwest
//! - **Retry state machine**: `Backoff` tracks attempts and the next delay
//! - **Retry-After**: a server hint takes precedence over the computed delay
//! - **Rate Limiting**: Token bucket rate limiter using governor

mod rate_limit;
mod retry;
mod transport;

pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use retry::{send_with_retry, Backoff, RetryPolicy};
pub use transport::{
    HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportConfig,
};

#[cfg(test)]
mod tests;

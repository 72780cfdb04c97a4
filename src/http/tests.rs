//! Tests for the HTTP module

use super::*;
use crate::error::Error;
use crate::types::Method;
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Transport replaying a fixed list of outcomes
struct ScriptedTransport {
    outcomes: Mutex<Vec<crate::error::Result<HttpResponse>>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    fn new(mut outcomes: Vec<crate::error::Result<HttpResponse>>) -> Self {
        outcomes.reverse();
        Self {
            outcomes: Mutex::new(outcomes),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, _request: &HttpRequest) -> crate::error::Result<HttpResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Ok(HttpResponse::new(200, "[]")))
    }
}

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::from_millis(1), Duration::from_millis(5))
}

fn request() -> HttpRequest {
    HttpRequest::new(Method::POST, "http://test.invalid/v1/items/search")
}

// ============================================================================
// Request / Response Types
// ============================================================================

#[test]
fn test_request_builder() {
    let req = HttpRequest::new(Method::GET, "https://api.example.com/items")
        .header("Authorization", "Bearer t")
        .query("limit", "10")
        .json(json!({"offset": 0}))
        .timeout(Duration::from_secs(5));

    assert_eq!(req.headers, vec![("Authorization".into(), "Bearer t".into())]);
    assert_eq!(req.query, vec![("limit".into(), "10".into())]);
    assert_eq!(req.body, Some(json!({"offset": 0})));
    assert_eq!(req.timeout, Duration::from_secs(5));
}

#[test]
fn test_response_helpers() {
    let resp = HttpResponse::new(200, r#"{"data": []}"#);
    assert!(resp.is_success());
    assert_eq!(resp.json().unwrap(), json!({"data": []}));

    let resp = HttpResponse::new(204, "not json");
    assert!(resp.is_success());
    assert!(matches!(resp.json(), Err(Error::Decode { .. })));

    assert!(!HttpResponse::new(301, "").is_success());
}

#[test]
fn test_transport_config_from_http_config() {
    let mut http = crate::config::HttpConfig::default();
    http.requests_per_second = Some(5);
    http.timeout_secs = 12;
    let config = TransportConfig::from(&http);
    assert_eq!(config.timeout, Duration::from_secs(12));
    assert_eq!(config.rate_limit, Some(RateLimiterConfig::per_second(5)));
    assert!(config.user_agent.starts_with("scope-extract/"));
}

// ============================================================================
// Retry Behavior
// ============================================================================

#[tokio::test]
async fn test_success_first_try() {
    let transport = ScriptedTransport::new(vec![Ok(HttpResponse::new(200, "[]"))]);
    let resp = send_with_retry(&transport, &request(), &fast_policy(5))
        .await
        .unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_transient_statuses_are_retried() {
    let transport = ScriptedTransport::new(vec![
        Ok(HttpResponse::new(429, "")),
        Ok(HttpResponse::new(500, "")),
        Ok(HttpResponse::new(502, "")),
        Ok(HttpResponse::new(503, "")),
        Ok(HttpResponse::new(200, "[1]")),
    ]);
    let resp = send_with_retry(&transport, &request(), &fast_policy(5))
        .await
        .unwrap();
    assert_eq!(resp.body, "[1]");
    assert_eq!(transport.calls(), 5);
}

#[tokio::test]
async fn test_retries_exhausted() {
    let transport = ScriptedTransport::new(vec![
        Ok(HttpResponse::new(503, "")),
        Ok(HttpResponse::new(503, "")),
        Ok(HttpResponse::new(503, "")),
        Ok(HttpResponse::new(200, "[]")),
    ]);
    let err = send_with_retry(&transport, &request(), &fast_policy(3))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::TransientHttp {
            status: 503,
            attempts: 3
        }
    ));
    assert_eq!(transport.calls(), 3);
}

#[tokio::test]
async fn test_non_transient_fails_immediately() {
    let transport = ScriptedTransport::new(vec![
        Ok(HttpResponse::new(404, "no such resource")),
        Ok(HttpResponse::new(200, "[]")),
    ]);
    let err = send_with_retry(&transport, &request(), &fast_policy(5))
        .await
        .unwrap_err();
    match err {
        Error::NonTransientHttp { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "no such resource");
        }
        other => panic!("expected non-transient error, got {other:?}"),
    }
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_504_is_not_transient() {
    let transport = ScriptedTransport::new(vec![Ok(HttpResponse::new(504, ""))]);
    let err = send_with_retry(&transport, &request(), &fast_policy(5))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NonTransientHttp { status: 504, .. }));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_timeouts_are_retried() {
    let transport = ScriptedTransport::new(vec![
        Err(Error::Timeout { timeout_ms: 30_000 }),
        Ok(HttpResponse::new(200, "[]")),
    ]);
    send_with_retry(&transport, &request(), &fast_policy(3))
        .await
        .unwrap();
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_retry_after_hint_sets_the_sleep() {
    tokio::time::pause();
    let transport = ScriptedTransport::new(vec![
        Ok(HttpResponse::new(429, "slow down").with_retry_after(Duration::from_secs(7))),
        Ok(HttpResponse::new(200, "[]")),
    ]);
    let policy = RetryPolicy::new(3, Duration::from_secs(1), Duration::from_secs(30));

    let started = tokio::time::Instant::now();
    send_with_retry(&transport, &request(), &policy).await.unwrap();
    let slept = started.elapsed();

    assert_eq!(transport.calls(), 2);
    assert!(slept >= Duration::from_secs(7), "slept {slept:?}");
    assert!(slept < Duration::from_millis(7_050), "slept {slept:?}");
}

#[tokio::test]
async fn test_other_transport_errors_are_not_retried() {
    let transport = ScriptedTransport::new(vec![Err(Error::decode("garbled"))]);
    let err = send_with_retry(&transport, &request(), &fast_policy(3))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
    assert_eq!(transport.calls(), 1);
}

// ============================================================================
// Reqwest Transport
// ============================================================================

fn transport() -> ReqwestTransport {
    ReqwestTransport::new(&TransportConfig::default()).unwrap()
}

#[tokio::test]
async fn test_reqwest_post_json_body_and_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/items/search"))
        .and(header("Authorization", "Bearer tok"))
        .and(body_json(json!({"offset": 0, "limit": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": 1}]})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let req = HttpRequest::new(Method::POST, format!("{}/v1/items/search", mock_server.uri()))
        .header("Authorization", "Bearer tok")
        .json(json!({"offset": 0, "limit": 2}));
    let resp = transport().send(&req).await.unwrap();

    assert_eq!(resp.status, 200);
    assert_eq!(resp.json().unwrap()["data"][0]["id"], 1);
    assert!(resp.retry_after.is_none());
}

#[tokio::test]
async fn test_reqwest_get_with_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/crm/deals"))
        .and(query_param("limit", "100"))
        .and(query_param("after", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&mock_server)
        .await;

    let req = HttpRequest::new(Method::GET, format!("{}/crm/deals", mock_server.uri()))
        .query("limit", "100")
        .query("after", "abc");
    let resp = transport().send(&req).await.unwrap();
    assert_eq!(resp.status, 200);
}

#[tokio::test]
async fn test_reqwest_reports_status_and_retry_after() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "3"))
        .mount(&mock_server)
        .await;

    let req = HttpRequest::new(Method::POST, format!("{}/limited", mock_server.uri()));
    let resp = transport().send(&req).await.unwrap();
    assert_eq!(resp.status, 429);
    assert_eq!(resp.retry_after, Some(Duration::from_secs(3)));
}

#[tokio::test]
async fn test_reqwest_retry_recovers_from_500() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let req = HttpRequest::new(Method::POST, format!("{}/flaky", mock_server.uri()));
    let resp = send_with_retry(&transport(), &req, &fast_policy(3))
        .await
        .unwrap();
    assert_eq!(resp.json().unwrap()["ok"], true);
}

#[tokio::test]
async fn test_reqwest_timeout_maps_to_timeout_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;

    let req = HttpRequest::new(Method::POST, format!("{}/slow", mock_server.uri()))
        .timeout(Duration::from_millis(50));
    let err = transport().send(&req).await.unwrap_err();
    assert!(matches!(err, Error::Timeout { timeout_ms: 50 }));
    assert!(err.is_transient());
}

#[test]
fn test_rate_limited_transport() {
    let config = TransportConfig {
        rate_limit: Some(RateLimiterConfig::per_second(2)),
        ..TransportConfig::default()
    };
    assert!(ReqwestTransport::new(&config).unwrap().has_rate_limiter());
    assert!(!transport().has_rate_limiter());
}

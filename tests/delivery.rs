mod common;

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use telemetry_bridge::{ClientOptions, DeliveryClient, DeliveryError, RestMethod};

const SHORT_DELAY: Duration = Duration::from_millis(10);

#[tokio::test]
async fn test_first_success_is_returned() {
    let (url, endpoint) = common::serve(|_, _| (StatusCode::OK, "accepted".to_string())).await;
    let mut client = DeliveryClient::new(ClientOptions::new(url, RestMethod::Post)).unwrap();

    let body = client.execute(r#"{"device":"dev-1"}"#).await.unwrap();

    assert_eq!(body, "accepted");
    assert_eq!(client.attempts(), 1);
    assert_eq!(client.status_code(), Some(200));
    assert_eq!(endpoint.hits(), 1);
    assert_eq!(endpoint.received()[0].body, r#"{"device":"dev-1"}"#);
}

#[tokio::test]
async fn test_always_failing_call_makes_max_retries_plus_one_attempts() {
    let (url, endpoint) =
        common::serve(|_, _| (StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string())).await;
    let mut client = DeliveryClient::new(
        ClientOptions::new(url, RestMethod::Post).with_retries(2, SHORT_DELAY),
    )
    .unwrap();

    let err = client.execute("{}").await.unwrap_err();

    assert_eq!(endpoint.hits(), 3);
    assert_eq!(client.attempts(), 3);
    assert_eq!(client.status_code(), Some(500));
    assert_eq!(client.bytes(), b"boom");
    assert_eq!(err.status(), Some(500));
    assert_eq!(
        err.to_string(),
        "httpResponse is not success. Code: 500, and message: boom"
    );
}

#[tokio::test]
async fn test_recovers_on_a_later_attempt() {
    let (url, endpoint) = common::serve(|hit, _| {
        if hit < 2 {
            (StatusCode::SERVICE_UNAVAILABLE, String::new())
        } else {
            (StatusCode::CREATED, "stored".to_string())
        }
    })
    .await;
    let mut client = DeliveryClient::new(
        ClientOptions::new(url, RestMethod::Post).with_retries(3, SHORT_DELAY),
    )
    .unwrap();

    let body = client.execute("{}").await.unwrap();

    assert_eq!(body, "stored");
    assert_eq!(client.attempts(), 3);
    assert_eq!(client.status_code(), Some(201));
    assert_eq!(endpoint.hits(), 3);
}

#[tokio::test]
async fn test_no_retries_by_default() {
    let (url, endpoint) = common::serve(|_, _| (StatusCode::BAD_GATEWAY, String::new())).await;
    let mut client = DeliveryClient::new(ClientOptions::new(url, RestMethod::Post)).unwrap();

    assert!(client.execute("{}").await.is_err());
    assert_eq!(endpoint.hits(), 1);
}

#[tokio::test]
async fn test_stop_before_execute_makes_no_call() {
    let (url, endpoint) = common::serve(|_, _| (StatusCode::OK, String::new())).await;
    let mut client = DeliveryClient::new(
        ClientOptions::new(url.clone(), RestMethod::Put)
            .with_retries(2, SHORT_DELAY)
            .with_request_id("req-1"),
    )
    .unwrap();
    client.stop_retries();

    let err = client.execute("{}").await.unwrap_err();

    assert!(matches!(err, DeliveryError::Stopped { .. }));
    assert_eq!(err.to_string(), format!("[PUT][req-1]:{url} retries stopped"));
    assert_eq!(client.attempts(), 0);
    assert_eq!(endpoint.hits(), 0);
}

#[tokio::test]
async fn test_stop_interrupts_retry_wait() {
    let (url, endpoint) =
        common::serve(|_, _| (StatusCode::INTERNAL_SERVER_ERROR, String::new())).await;
    let mut client = DeliveryClient::new(
        ClientOptions::new(url, RestMethod::Post).with_retries(5, Duration::from_secs(30)),
    )
    .unwrap();
    let stop = client.stop_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        stop.stop();
    });

    let started = Instant::now();
    let err = client.execute("{}").await.unwrap_err();

    assert!(matches!(err, DeliveryError::Stopped { .. }));
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(endpoint.hits(), 1);
    assert_eq!(client.attempts(), 1);
}

#[tokio::test]
async fn test_request_carries_method_headers_and_credentials() {
    let (url, endpoint) = common::serve(|_, _| (StatusCode::OK, String::new())).await;
    let mut client = DeliveryClient::new(
        ClientOptions::new(url, RestMethod::Patch)
            .with_header("X-Tenant", "acme")
            .with_credentials("key-1", "pass-1"),
    )
    .unwrap();

    client.execute(r#"{"a":1}"#).await.unwrap();

    let received = endpoint.received();
    let request = &received[0];
    assert_eq!(request.method, axum::http::Method::PATCH);
    assert_eq!(request.headers["content-type"], "application/json");
    assert_eq!(request.headers["x-tenant"], "acme");
    assert_eq!(request.headers["x-apikey"], "key-1");
    assert_eq!(request.headers["x-apipass"], "pass-1");
    assert_eq!(request.body, r#"{"a":1}"#);
}

#[tokio::test]
async fn test_only_bytes_keeps_body_on_client() {
    let (url, _endpoint) = common::serve(|_, _| (StatusCode::OK, "raw-bytes".to_string())).await;
    let mut client =
        DeliveryClient::new(ClientOptions::new(url, RestMethod::Get).only_bytes()).unwrap();

    let body = client.execute("").await.unwrap();

    assert_eq!(body, "");
    assert_eq!(client.bytes(), b"raw-bytes");
}

#[tokio::test]
async fn test_unreachable_target_is_retried_as_transport_error() {
    let url = common::closed_url().await;
    let mut client = DeliveryClient::new(
        ClientOptions::new(url, RestMethod::Post).with_retries(1, SHORT_DELAY),
    )
    .unwrap();

    let err = client.execute("{}").await.unwrap_err();

    assert!(matches!(err, DeliveryError::Transport(_)));
    assert_eq!(client.attempts(), 2);
    assert_eq!(client.status_code(), None);
}

#[tokio::test]
async fn test_slow_answer_hits_attempt_timeout() {
    let (url, endpoint) = common::serve_with_delay(Duration::from_millis(500), |_, _| {
        (StatusCode::OK, String::new())
    })
    .await;
    let mut client = DeliveryClient::new(
        ClientOptions::new(url, RestMethod::Post).with_timeout(Duration::from_millis(50)),
    )
    .unwrap();

    let err = client.execute("{}").await.unwrap_err();

    match err {
        DeliveryError::Transport(e) => assert!(e.is_timeout()),
        other => panic!("expected timeout, got {other}"),
    }
    assert_eq!(endpoint.hits(), 1);
}

#[tokio::test]
async fn test_invalid_header_fails_without_attempt_or_wait() {
    let (url, endpoint) = common::serve(|_, _| (StatusCode::OK, String::new())).await;
    let mut client = DeliveryClient::new(
        ClientOptions::new(url, RestMethod::Post)
            .with_header("bad header", "x")
            .with_retries(3, Duration::from_secs(5)),
    )
    .unwrap();

    let started = Instant::now();
    let err = client.execute("{}").await.unwrap_err();

    assert!(matches!(err, DeliveryError::InvalidHeader(ref name) if name == "bad header"));
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(client.attempts(), 0);
    assert_eq!(endpoint.hits(), 0);
}

#[tokio::test]
async fn test_transport_failure_clears_previous_body() {
    let (url, endpoint) = common::serve_with_delays(
        |hit| {
            if hit == 0 {
                Duration::ZERO
            } else {
                Duration::from_millis(500)
            }
        },
        |_, _| (StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string()),
    )
    .await;
    let mut client = DeliveryClient::new(
        ClientOptions::new(url, RestMethod::Post)
            .with_timeout(Duration::from_millis(100))
            .with_retries(1, SHORT_DELAY),
    )
    .unwrap();

    let err = client.execute("{}").await.unwrap_err();

    assert!(matches!(err, DeliveryError::Transport(_)));
    assert_eq!(endpoint.hits(), 2);
    assert_eq!(client.attempts(), 2);
    assert_eq!(client.status_code(), None);
    assert!(client.bytes().is_empty());
}

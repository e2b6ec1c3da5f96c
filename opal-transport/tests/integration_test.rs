//! Integration tests for opal-transport

use bytes::Bytes;
use http::{HeaderValue, Method};
use opal_core::{Body, Context, Transport, TransportError};
use opal_transport::*;
use std::time::Duration;
use wiremock::matchers::{basic_auth, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(method: Method, uri: &str, body: Body) -> http::Request<Body> {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .body(body)
        .unwrap()
}

fn transport(
    server: &MockServer,
    build: impl FnOnce(TransportConfigBuilder) -> TransportConfigBuilder,
) -> ReqwestTransport {
    let config = build(TransportConfig::builder().base_url(server.uri())).build();
    ReqwestTransport::new(config).unwrap()
}

#[tokio::test]
async fn test_round_trip_streams_response_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movies/_doc/1"))
        .and(query_param("realtime", "false"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-opaque-id", "job-1")
                .set_body_string(r#"{"_id":"1","found":true}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport(&server, |b| b);
    let response = transport
        .perform(request(Method::GET, "/movies/_doc/1?realtime=false", Body::empty()))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["x-opaque-id"], "job-1");
    let body = response.into_body();
    assert!(body.is_stream());
    assert_eq!(
        body.collect().await.unwrap(),
        Bytes::from_static(br#"{"_id":"1","found":true}"#)
    );
}

#[tokio::test]
async fn test_request_body_and_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/movies"))
        .and(header("content-type", "application/json"))
        .and(body_string(r#"{"settings":{"number_of_shards":1}}"#))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"acknowledged":true}"#))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport(&server, |b| b);
    let mut req = request(
        Method::PUT,
        "/movies",
        Body::from(r#"{"settings":{"number_of_shards":1}}"#),
    );
    req.headers_mut()
        .insert("content-type", HeaderValue::from_static("application/json"));

    let response = transport.perform(req).await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_base_path_prefix_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/_cluster/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let config = TransportConfig::builder()
        .base_url(format!("{}/search", server.uri()))
        .build();
    let transport = ReqwestTransport::new(config).unwrap();
    let response = transport
        .perform(request(Method::GET, "/_cluster/health", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_basic_auth_and_default_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(basic_auth("admin", "secret"))
        .and(header("x-team", "search"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport(&server, |b| {
        b.basic_auth("admin", "secret").default_header("x-team", "search")
    });
    let response = transport
        .perform(request(Method::GET, "/", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_request_headers_win_over_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let transport = transport(&server, |b| {
        b.basic_auth("admin", "secret").default_header("x-team", "search")
    });
    let mut req = request(Method::GET, "/", Body::empty());
    req.headers_mut()
        .insert("x-team", HeaderValue::from_static("ingest"));
    req.headers_mut()
        .insert("authorization", HeaderValue::from_static("Bearer token"));
    transport.perform(req).await.unwrap();

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].headers["x-team"], "ingest");
    assert_eq!(received[0].headers["authorization"], "Bearer token");
    assert!(
        received[0].headers["user-agent"]
            .to_str()
            .unwrap()
            .starts_with("opal-rs/")
    );
}

#[tokio::test]
async fn test_retry_on_status_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_cluster/health"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/_cluster/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"green"}"#))
        .mount(&server)
        .await;

    let transport = transport(&server, |b| b.retry(RetryConfig::immediate(3)));
    let response = transport
        .perform(request(Method::GET, "/_cluster/health", Body::empty()))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_retry_replays_buffered_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let transport = transport(&server, |b| b.retry(RetryConfig::immediate(1)));
    transport
        .perform(request(Method::POST, "/_search", Body::from(r#"{"size":0}"#)))
        .await
        .unwrap();

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].body, received[1].body);
    assert_eq!(received[1].body, br#"{"size":0}"#.to_vec());
}

#[tokio::test]
async fn test_exhausted_retries_return_last_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let transport = transport(&server, |b| b.retry(RetryConfig::immediate(2)));
    let response = transport
        .perform(request(Method::GET, "/", Body::empty()))
        .await
        .unwrap();

    assert_eq!(response.status(), 503);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_streaming_body_is_sent_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let transport = transport(&server, |b| b.retry(RetryConfig::immediate(3)));
    let chunks = futures::stream::iter(vec![
        Ok::<_, std::io::Error>(Bytes::from_static(b"{\"index\":{}}\n")),
        Ok(Bytes::from_static(b"{\"title\":\"Alien\"}\n")),
    ]);
    let response = transport
        .perform(request(Method::POST, "/_bulk", Body::from_stream(chunks)))
        .await
        .unwrap();

    assert_eq!(response.status(), 503);
    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(
        received[0].body,
        b"{\"index\":{}}\n{\"title\":\"Alien\"}\n".to_vec()
    );
}

#[tokio::test]
async fn test_no_retry_without_config() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let transport = transport(&server, |b| b);
    let response = transport
        .perform(request(Method::GET, "/", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), 503);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_timeout_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let transport = transport(&server, |b| b.timeout(Duration::from_millis(100)));
    let err = transport
        .perform(request(Method::GET, "/", Body::empty()))
        .await
        .unwrap_err();
    assert!(err.is_timeout(), "unexpected error: {err:?}");
}

#[tokio::test]
async fn test_connection_refused_is_classified() {
    let config = TransportConfig::builder()
        .base_url("http://127.0.0.1:1")
        .connect_timeout(Duration::from_secs(1))
        .build();
    let transport = ReqwestTransport::new(config).unwrap();
    let err = transport
        .perform(request(Method::GET, "/", Body::empty()))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Connect(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn test_context_cancels_backoff() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let transport = transport(&server, |b| {
        b.retry(RetryConfig::constant(5, Duration::from_secs(30)))
    });
    let ctx = Context::background().with_timeout(Duration::from_millis(200));
    let mut req = request(Method::GET, "/", Body::empty());
    req.extensions_mut().insert(ctx);

    let err = transport.perform(req).await.unwrap_err();
    assert!(err.is_cancellation());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

//! The dispatcher: descriptor in, typed result or error out.

use crate::body::BoxError;
use crate::context::Context;
use crate::endpoint::Endpoint;
use crate::error::{Error, LocalError, LocalErrorKind, Result, TransportError};
use crate::parse::parse_error;
use crate::response::{Reply, Response};
use crate::transport::Transport;
use http::HeaderMap;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Drives every call: build, send, classify, decode.
///
/// Steps of one call run strictly in order. The dispatcher holds no
/// per-call state, so one instance serves any number of concurrent calls.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    default_headers: Arc<HeaderMap>,
}

impl Dispatcher {
    /// Create a dispatcher over `transport`.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::from_arc(Arc::new(transport))
    }

    /// Create a dispatcher over a shared transport.
    pub fn from_arc(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            default_headers: Arc::new(HeaderMap::new()),
        }
    }

    /// Headers applied to every request beneath the descriptor's own.
    pub fn with_default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = Arc::new(headers);
        self
    }

    /// The underlying transport.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// The default headers.
    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// Dispatch a call that has no typed response.
    ///
    /// Error-class responses become [`Error::Status`] with the body unread.
    pub async fn perform<E: Endpoint>(&self, ctx: &Context, endpoint: E) -> Result<Response> {
        let response = self.exchange(ctx, endpoint).await?;
        if response.is_error() {
            return Err(Error::Status {
                response: Box::new(response),
            });
        }
        Ok(response)
    }

    /// Dispatch a call and decode its JSON body into `T`.
    ///
    /// Error-class responses are parsed into a server or local error.
    pub async fn perform_json<E, T>(&self, ctx: &Context, endpoint: E) -> Result<Reply<T>>
    where
        E: Endpoint,
        T: DeserializeOwned,
    {
        let mut response = self.exchange(ctx, endpoint).await?;

        if response.is_error() {
            let error = parse_error(&mut response, ctx).await;
            debug!(status = %response.status(), error = %error, "Server returned an error");
            return Err(Error::from_response(error, response));
        }

        let status = response.status_code().as_u16();
        let read = ctx
            .run(response.bytes())
            .await
            .map_err(BoxError::from)
            .and_then(|result| result);
        let bytes = match read {
            Ok(bytes) => bytes,
            Err(e) => {
                return Err(Error::Local {
                    error: LocalError::with_cause(status, LocalErrorKind::ReadFailed, e),
                    response: Box::new(response),
                });
            }
        };

        match serde_json::from_slice::<T>(&bytes) {
            Ok(body) => Ok(Reply { body, response }),
            Err(source) => Err(Error::Decode {
                source,
                response: Box::new(response),
            }),
        }
    }

    /// Build the request, attach the context and perform the round-trip.
    async fn exchange<E: Endpoint>(&self, ctx: &Context, endpoint: E) -> Result<Response> {
        let mut request = endpoint.to_request()?;

        for name in self.default_headers.keys() {
            if !request.headers().contains_key(name) {
                for value in self.default_headers.get_all(name) {
                    request.headers_mut().append(name.clone(), value.clone());
                }
            }
        }
        request.extensions_mut().insert(ctx.clone());

        let method = request.method().clone();
        let uri = request.uri().clone();
        debug!(method = %method, uri = %uri, "Dispatching request");
        for (name, value) in request.headers() {
            trace!(header = %name, value = ?value, "Request header");
        }

        let start = Instant::now();
        let response = ctx
            .run(self.transport.perform(request))
            .await
            .map_err(TransportError::from)
            .and_then(|result| result)
            .inspect_err(|e| debug!(method = %method, uri = %uri, error = %e, "Transport failed"))?;

        let response = Response::from_http(response);
        debug!(
            method = %method,
            uri = %uri,
            status = %response.status(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Received response"
        );
        if response.has_warnings() {
            for warning in response.warnings() {
                warn!(uri = %uri, warning, "Server warning");
            }
        }

        Ok(response)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("default_headers", &self.default_headers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::context::ContextError;
    use crate::error::BuildError;
    use crate::mock::{MockResponse, MockTransport};
    use crate::params::Query;
    use crate::request::{build_request, PathBuilder};
    use bytes::Bytes;
    use http::{HeaderValue, Method};
    use serde::Deserialize;
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct GetDoc {
        index: String,
        id: String,
        header: HeaderMap,
    }

    impl Endpoint for GetDoc {
        fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
            let path = PathBuilder::new()
                .part("index", &self.index)
                .literal("_doc")
                .part("id", &self.id)
                .build()?;
            build_request(Method::GET, &path, None, &Query::new(), &self.header)
        }

        fn headers_mut(&mut self) -> &mut HeaderMap {
            &mut self.header
        }
    }

    fn get_doc() -> GetDoc {
        GetDoc {
            index: "movies".to_string(),
            id: "1".to_string(),
            ..Default::default()
        }
    }

    #[derive(Debug, Deserialize)]
    struct Doc {
        #[serde(rename = "_id")]
        id: String,
        found: bool,
    }

    #[tokio::test]
    async fn test_success_decodes_and_caches_body() {
        let transport = MockTransport::new();
        transport.push(MockResponse::new(200).body(r#"{"_id":"1","found":true}"#));
        let dispatcher = Dispatcher::new(transport.clone());

        let reply: Reply<Doc> = dispatcher
            .perform_json(&Context::background(), get_doc())
            .await
            .unwrap();
        assert_eq!(reply.id, "1");
        assert!(reply.found);
        assert_eq!(
            reply.response.cached_body().unwrap(),
            &Bytes::from_static(br#"{"_id":"1","found":true}"#)
        );

        let recorded = transport.last_request().unwrap();
        assert_eq!(recorded.method, Method::GET);
        assert_eq!(recorded.uri, "/movies/_doc/1");
        assert!(recorded.had_context);
    }

    #[tokio::test]
    async fn test_build_error_sends_nothing() {
        let transport = MockTransport::new();
        let dispatcher = Dispatcher::new(transport.clone());

        let err = dispatcher
            .perform(&Context::background(), GetDoc::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Build(BuildError::MissingPart("index"))));
        assert!(err.response().is_none());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_has_no_envelope() {
        let transport = MockTransport::new();
        transport.push_error(TransportError::other("connection refused"));
        let dispatcher = Dispatcher::new(transport);

        let err = dispatcher
            .perform(&Context::background(), get_doc())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert!(err.response().is_none());
    }

    #[tokio::test]
    async fn test_error_without_sink_is_plain_status() {
        let transport = MockTransport::new();
        transport.push(MockResponse::new(404).body(r#"{"error":{"type":"x","reason":"y"}}"#));
        let dispatcher = Dispatcher::new(transport);

        let err = dispatcher
            .perform(&Context::background(), get_doc())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "status: 404 Not Found");
        let response = err.into_response().unwrap();
        assert!(response.has_unread_body());
    }

    #[tokio::test]
    async fn test_error_with_sink_is_parsed() {
        let transport = MockTransport::new();
        transport.push(MockResponse::new(404).body(
            r#"{"error":{"type":"index_not_found_exception","reason":"no such index [movies]","index":"movies"},"status":404}"#,
        ));
        let dispatcher = Dispatcher::new(transport);

        let err = dispatcher
            .perform_json::<_, Doc>(&Context::background(), get_doc())
            .await
            .unwrap_err();
        let server = err.as_server_error().unwrap();
        assert_eq!(server.status, 404);
        assert_eq!(server.index.as_deref(), Some("movies"));
        assert!(err.to_string().contains("no such index [movies]"));
        assert!(err.response().unwrap().cached_body().is_some());
    }

    #[tokio::test]
    async fn test_decode_error_keeps_envelope() {
        let transport = MockTransport::new();
        transport.push(MockResponse::new(200).body("not json"));
        let dispatcher = Dispatcher::new(transport);

        let err = dispatcher
            .perform_json::<_, Doc>(&Context::background(), get_doc())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
        assert_eq!(err.status(), Some(http::StatusCode::OK));
        assert!(err.to_string().starts_with("status: 200, failed to decode"));
    }

    #[tokio::test]
    async fn test_read_failure_on_success() {
        let transport = MockTransport::new();
        transport.push(MockResponse::new(200).failing_body("reset by peer"));
        let dispatcher = Dispatcher::new(transport);

        let err = dispatcher
            .perform_json::<_, Doc>(&Context::background(), get_doc())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Local {
                error: LocalError {
                    kind: LocalErrorKind::ReadFailed,
                    ..
                },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_redirect_is_not_an_error() {
        let transport = MockTransport::new();
        transport.push(MockResponse::new(304).no_body());
        let dispatcher = Dispatcher::new(transport);

        let response = dispatcher
            .perform(&Context::background(), get_doc())
            .await
            .unwrap();
        assert_eq!(response.status(), "304 Not Modified");
    }

    #[tokio::test]
    async fn test_default_headers_beneath_descriptor_headers() {
        let transport = MockTransport::new();
        transport.push(MockResponse::new(200).no_body());
        let mut defaults = HeaderMap::new();
        defaults.insert("x-team", HeaderValue::from_static("search"));
        defaults.insert("x-opaque-id", HeaderValue::from_static("default"));
        let dispatcher = Dispatcher::new(transport.clone()).with_default_headers(defaults);

        let endpoint = get_doc().with_opaque_id("job-42").unwrap();
        dispatcher
            .perform(&Context::background(), endpoint)
            .await
            .unwrap();

        let recorded = transport.last_request().unwrap();
        assert_eq!(recorded.headers["x-team"], "search");
        assert_eq!(recorded.headers["x-opaque-id"], "job-42");
        assert_eq!(recorded.headers.get_all("x-opaque-id").iter().count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_during_perform() {
        let transport = MockTransport::new().with_delay(Duration::from_secs(60));
        transport.push(MockResponse::new(200).body("{}"));
        let dispatcher = Dispatcher::new(transport);

        let ctx = Context::background().with_timeout(Duration::from_millis(100));
        let err = dispatcher
            .perform_json::<_, serde_json::Value>(&ctx, get_doc())
            .await
            .unwrap_err();
        assert!(err.is_cancellation());
        assert!(matches!(
            err,
            Error::Transport(TransportError::Context(ContextError::DeadlineExceeded))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_during_body_read() {
        let transport = MockTransport::new();
        transport.push(MockResponse::new(200).stalled_body());
        let dispatcher = Dispatcher::new(transport);

        let ctx = Context::background().with_timeout(Duration::from_millis(100));
        let err = dispatcher
            .perform_json::<_, serde_json::Value>(&ctx, get_doc())
            .await
            .unwrap_err();
        assert!(err.is_cancellation());
        assert_eq!(err.status(), Some(http::StatusCode::OK));
        assert!(err.to_string().contains("context deadline exceeded"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_while_reading_error_body() {
        let transport = MockTransport::new();
        transport.push(MockResponse::new(500).stalled_body());
        let dispatcher = Dispatcher::new(transport);

        let ctx = Context::background().with_timeout(Duration::from_millis(100));
        let err = dispatcher
            .perform_json::<_, serde_json::Value>(&ctx, get_doc())
            .await
            .unwrap_err();
        assert!(err.is_cancellation());
        assert!(matches!(err, Error::Local { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_before_dispatch() {
        let transport = MockTransport::new();
        transport.push(MockResponse::new(200).body("{}"));
        let dispatcher = Dispatcher::new(transport.clone());

        let ctx = Context::background();
        ctx.cancel();
        let err = dispatcher.perform(&ctx, get_doc()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(TransportError::Context(ContextError::Cancelled))
        ));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_calls_share_dispatcher() {
        let transport = MockTransport::new();
        for i in 0..8 {
            transport.push(MockResponse::new(200).body(format!(r#"{{"_id":"{i}","found":true}}"#)));
        }
        let dispatcher = Dispatcher::new(transport.clone());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let dispatcher = dispatcher.clone();
            handles.push(tokio::spawn(async move {
                dispatcher
                    .perform_json::<_, Doc>(&Context::background(), get_doc())
                    .await
                    .map(|reply| reply.found)
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().unwrap());
        }
        assert_eq!(transport.requests().len(), 8);
    }
}

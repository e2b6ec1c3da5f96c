//! Error-response parsing.
//!
//! 405 responses carry `{"error": "<message>", "status": 405}`; every other
//! error status carries `{"error": {"type": .., "reason": .., ..}, "status": ..}`.
//! The schema is chosen by status code alone, never by sniffing the body.

use crate::body::BoxError;
use crate::context::Context;
use crate::error::{
    CausedBy, LocalError, LocalErrorKind, ResponseError, RootCause, ServerError, StringError,
};
use crate::response::Response;
use http::StatusCode;
use serde::Deserialize;

#[derive(Deserialize)]
struct StringErrorBody {
    error: String,
    #[serde(default)]
    status: Option<u16>,
}

#[derive(Deserialize)]
struct ServerErrorBody {
    #[serde(default)]
    error: Option<ServerErrorDetail>,
    #[serde(default)]
    status: Option<u16>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ServerErrorDetail {
    #[serde(rename = "type")]
    error_type: Option<String>,
    reason: Option<String>,
    index: Option<String>,
    index_uuid: Option<String>,
    root_cause: Vec<RootCause>,
    caused_by: Option<Box<CausedBy>>,
}

/// Turn an error-class response into a [`ResponseError`].
///
/// Reads the body (honoring `ctx`) and leaves the bytes cached on the
/// response.
pub async fn parse_error(response: &mut Response, ctx: &Context) -> ResponseError {
    let status = response.status_code().as_u16();

    if response.cached_body().is_none() && response.body_is_empty() {
        return ResponseError::Local(LocalError::new(status, LocalErrorKind::EmptyBody));
    }

    let read = ctx
        .run(response.bytes())
        .await
        .map_err(BoxError::from)
        .and_then(|r| r);
    let bytes = match read {
        Ok(bytes) => bytes,
        Err(e) => {
            return ResponseError::Local(LocalError::with_cause(
                status,
                LocalErrorKind::ReadFailed,
                e,
            ));
        }
    };

    if bytes.is_empty() {
        return ResponseError::Local(LocalError::new(status, LocalErrorKind::EmptyBody));
    }

    if response.status_code() == StatusCode::METHOD_NOT_ALLOWED {
        return match serde_json::from_slice::<StringErrorBody>(&bytes) {
            Ok(body) => ResponseError::ServerString(StringError {
                status: body.status.unwrap_or(status),
                message: body.error,
            }),
            Err(e) => ResponseError::Local(LocalError::with_cause(
                status,
                LocalErrorKind::DecodeFailed,
                e,
            )),
        };
    }

    let body = match serde_json::from_slice::<ServerErrorBody>(&bytes) {
        Ok(body) => body,
        Err(e) => {
            return ResponseError::Local(LocalError::with_cause(
                status,
                LocalErrorKind::DecodeFailed,
                e,
            ));
        }
    };

    let detail = body.error.unwrap_or_default();
    if detail.error_type.is_none() && detail.reason.is_none() && detail.root_cause.is_empty() {
        return ResponseError::Local(LocalError::new(status, LocalErrorKind::UnknownShape));
    }

    ResponseError::Server(ServerError {
        status: body.status.unwrap_or(status),
        error_type: detail.error_type.unwrap_or_default(),
        reason: detail.reason.unwrap_or_default(),
        index: detail.index,
        index_uuid: detail.index_uuid,
        root_causes: detail.root_cause,
        caused_by: detail.caused_by,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use bytes::Bytes;
    use http::HeaderMap;

    fn response(status: u16, body: Body) -> Response {
        Response::new(StatusCode::from_u16(status).unwrap(), HeaderMap::new(), body)
    }

    async fn parse(status: u16, body: &'static str) -> ResponseError {
        let mut resp = response(status, Body::from(body));
        parse_error(&mut resp, &Context::background()).await
    }

    #[tokio::test]
    async fn test_structured_error() {
        let err = parse(
            400,
            r#"{"error":{"root_cause":[{"type":"resource_already_exists_exception","reason":"index [x] already exists","index":"x","index_uuid":"U"}],"type":"resource_already_exists_exception","reason":"index [x] already exists","index":"x","index_uuid":"U"},"status":400}"#,
        )
        .await;
        let ResponseError::Server(err) = err else {
            panic!("expected server error, got {err:?}");
        };
        assert_eq!(err.status, 400);
        assert_eq!(err.error_type, "resource_already_exists_exception");
        assert_eq!(err.index.as_deref(), Some("x"));
        assert_eq!(err.index_uuid.as_deref(), Some("U"));
        assert_eq!(err.root_causes.len(), 1);
        assert_eq!(err.root_causes[0].reason, "index [x] already exists");
    }

    #[tokio::test]
    async fn test_caused_by_is_kept() {
        let err = parse(
            400,
            r#"{"error":{"type":"search_phase_execution_exception","reason":"all shards failed","caused_by":{"type":"query_shard_exception","reason":"bad field"}},"status":400}"#,
        )
        .await;
        let ResponseError::Server(err) = err else {
            panic!("expected server error");
        };
        assert_eq!(err.caused_by.unwrap().error_type, "query_shard_exception");
        assert!(err.root_causes.is_empty());
    }

    #[tokio::test]
    async fn test_method_not_allowed_uses_string_schema() {
        let err = parse(
            405,
            r#"{"error":"Incorrect HTTP method for uri [/_doc] and method [POST], allowed: [HEAD, DELETE, PUT, GET]","status":405}"#,
        )
        .await;
        let ResponseError::ServerString(err) = err else {
            panic!("expected string error");
        };
        assert_eq!(err.status, 405);
        assert!(err.message.starts_with("Incorrect HTTP method"));
    }

    #[tokio::test]
    async fn test_string_body_at_other_status_is_not_sniffed() {
        let err = parse(400, r#"{"error":"plain message","status":400}"#).await;
        let ResponseError::Local(err) = err else {
            panic!("expected local error");
        };
        assert!(matches!(
            err.kind,
            LocalErrorKind::DecodeFailed | LocalErrorKind::UnknownShape
        ));
    }

    #[tokio::test]
    async fn test_object_body_at_405_fails_to_decode() {
        let err = parse(405, r#"{"error":{"type":"x","reason":"y"},"status":405}"#).await;
        let ResponseError::Local(err) = err else {
            panic!("expected local error");
        };
        assert_eq!(err.kind, LocalErrorKind::DecodeFailed);
    }

    #[tokio::test]
    async fn test_empty_body() {
        let err = parse(400, "").await;
        let ResponseError::Local(err) = err else {
            panic!("expected local error");
        };
        assert_eq!(err.kind, LocalErrorKind::EmptyBody);

        let mut taken = response(503, Body::from("{}"));
        taken.take_body();
        let err = parse_error(&mut taken, &Context::background()).await;
        assert!(matches!(
            err,
            ResponseError::Local(LocalError { kind: LocalErrorKind::EmptyBody, .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_stream_is_empty_body() {
        let stream = futures::stream::empty::<Result<Bytes, std::io::Error>>();
        let mut resp = response(500, Body::from_stream(stream));
        let err = parse_error(&mut resp, &Context::background()).await;
        assert!(matches!(
            err,
            ResponseError::Local(LocalError { kind: LocalErrorKind::EmptyBody, .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_shape() {
        let err = parse(500, r#"{"message":"something else"}"#).await;
        assert!(matches!(
            err,
            ResponseError::Local(LocalError { kind: LocalErrorKind::UnknownShape, .. })
        ));

        let err = parse(500, r#"{"error":{},"status":500}"#).await;
        assert!(matches!(
            err,
            ResponseError::Local(LocalError { kind: LocalErrorKind::UnknownShape, .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let err = parse(502, "<html>Bad Gateway</html>").await;
        assert!(matches!(
            err,
            ResponseError::Local(LocalError { kind: LocalErrorKind::DecodeFailed, .. })
        ));
    }

    #[tokio::test]
    async fn test_read_failure() {
        let chunks = vec![Err::<Bytes, _>(std::io::Error::other("reset by peer"))];
        let mut resp = response(500, Body::from_stream(futures::stream::iter(chunks)));
        let err = parse_error(&mut resp, &Context::background()).await;
        let ResponseError::Local(err) = err else {
            panic!("expected local error");
        };
        assert_eq!(err.kind, LocalErrorKind::ReadFailed);
        assert!(err.to_string().contains("reset by peer"));
    }

    #[tokio::test]
    async fn test_cancelled_read() {
        let ctx = Context::background();
        ctx.cancel();
        let stream = futures::stream::pending::<Result<Bytes, std::io::Error>>();
        let mut resp = response(500, Body::from_stream(stream));
        let err = parse_error(&mut resp, &ctx).await;
        let ResponseError::Local(err) = err else {
            panic!("expected local error");
        };
        assert_eq!(err.kind, LocalErrorKind::ReadFailed);
        assert!(err.is_cancellation());
    }

    #[tokio::test]
    async fn test_body_stays_cached() {
        let mut resp = response(
            404,
            Body::from(
                r#"{"error":{"type":"index_not_found_exception","reason":"no such index"},"status":404}"#,
            ),
        );
        let _ = parse_error(&mut resp, &Context::background()).await;
        assert!(resp.cached_body().is_some());
        // parsing again works from the cache
        let again = parse_error(&mut resp, &Context::background()).await;
        assert!(matches!(again, ResponseError::Server(_)));
    }
}

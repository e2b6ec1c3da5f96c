//! Request and response bodies.

use crate::error::BuildError;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt, TryStreamExt};
use serde::Serialize;
use std::fmt;
use std::pin::Pin;
use std::sync::Mutex;

/// Boxed error used for body and transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A boxed stream of body chunks.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>;

/// An HTTP body.
///
/// Buffered bodies can be cloned and replayed; streaming bodies are
/// read at most once.
#[derive(Default)]
pub struct Body {
    kind: Kind,
}

#[derive(Default)]
enum Kind {
    #[default]
    Empty,
    Full(Bytes),
    // Only ever taken by value, never locked.
    Stream(Mutex<BodyStream>),
}

impl Body {
    /// An empty body.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Serialize `value` as a JSON body.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, BuildError> {
        let bytes = serde_json::to_vec(value).map_err(BuildError::Serialize)?;
        Ok(Self::from(bytes))
    }

    /// Wrap a stream of chunks.
    pub fn from_stream<S, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        Self {
            kind: Kind::Stream(Mutex::new(Box::pin(
                stream.map_err(|e| Into::<BoxError>::into(e)),
            ))),
        }
    }

    /// Whether the body is known to contain no bytes.
    ///
    /// Streaming bodies are never known to be empty until read.
    pub fn is_empty(&self) -> bool {
        match &self.kind {
            Kind::Empty => true,
            Kind::Full(bytes) => bytes.is_empty(),
            Kind::Stream(_) => false,
        }
    }

    /// Whether the body is a stream.
    pub fn is_stream(&self) -> bool {
        matches!(self.kind, Kind::Stream(_))
    }

    /// The buffered bytes, if the body is not a stream.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match &self.kind {
            Kind::Full(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Clone a buffered body. Returns `None` for streams.
    pub fn try_clone(&self) -> Option<Body> {
        match &self.kind {
            Kind::Empty => Some(Body::empty()),
            Kind::Full(bytes) => Some(Body::from(bytes.clone())),
            Kind::Stream(_) => None,
        }
    }

    /// Read the whole body into memory.
    pub async fn collect(self) -> Result<Bytes, BoxError> {
        match self.kind {
            Kind::Empty => Ok(Bytes::new()),
            Kind::Full(bytes) => Ok(bytes),
            Kind::Stream(stream) => {
                let mut stream = stream.into_inner().unwrap_or_else(|e| e.into_inner());
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                Ok(buf.freeze())
            }
        }
    }

    /// Turn the body into a stream of chunks.
    pub fn into_stream(self) -> BodyStream {
        match self.kind {
            Kind::Empty => Box::pin(futures::stream::empty()),
            Kind::Full(bytes) => Box::pin(futures::stream::once(async move { Ok(bytes) })),
            Kind::Stream(stream) => stream.into_inner().unwrap_or_else(|e| e.into_inner()),
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Empty => f.write_str("Body::Empty"),
            Kind::Full(bytes) => f.debug_tuple("Body::Full").field(&bytes.len()).finish(),
            Kind::Stream(_) => f.write_str("Body::Stream"),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self {
            kind: Kind::Full(bytes),
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from(Bytes::from(bytes))
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Self::from(Bytes::from(s))
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Self::from(Bytes::from_static(s.as_bytes()))
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Self::from(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_stream() {
        let chunks = vec![
            Ok::<_, std::io::Error>(Bytes::from_static(b"{\"a\":")),
            Ok(Bytes::from_static(b"1}")),
        ];
        let body = Body::from_stream(futures::stream::iter(chunks));
        assert!(body.is_stream());
        assert!(!body.is_empty());
        assert!(body.try_clone().is_none());
        assert_eq!(body.collect().await.unwrap(), Bytes::from_static(b"{\"a\":1}"));
    }

    #[tokio::test]
    async fn test_collect_stream_error() {
        let chunks = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::other("connection reset")),
        ];
        let body = Body::from_stream(futures::stream::iter(chunks));
        let err = body.collect().await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_buffered_body_is_replayable() {
        let body = Body::from("{\"query\":{}}");
        let copy = body.try_clone().unwrap();
        assert_eq!(copy.as_bytes(), body.as_bytes());
        assert!(Body::empty().is_empty());
        assert!(Body::from(Vec::new()).is_empty());
    }

    #[test]
    fn test_json_body() {
        let body = Body::json(&serde_json::json!({"title": "Moneyball"})).unwrap();
        assert_eq!(
            body.as_bytes().unwrap().as_ref(),
            br#"{"title":"Moneyball"}"#
        );
    }
}

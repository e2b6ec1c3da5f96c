//! The descriptor contract.

use crate::body::Body;
use crate::error::BuildError;
use crate::response::OPAQUE_ID;
use http::{HeaderMap, HeaderName, HeaderValue};

/// A typed description of one endpoint call.
///
/// The dispatcher only ever asks a descriptor for its HTTP request; adding
/// an endpoint means implementing this trait for one more type.
///
/// ```
/// use opal_core::{build_request, Body, BuildError, Endpoint, PathBuilder, Query};
/// use http::{HeaderMap, Method};
///
/// #[derive(Debug, Default)]
/// struct RefreshReq {
///     indices: Vec<String>,
///     header: HeaderMap,
/// }
///
/// impl Endpoint for RefreshReq {
///     fn to_request(self) -> Result<http::Request<Body>, BuildError> {
///         let path = PathBuilder::new()
///             .optional_list(&self.indices)
///             .literal("_refresh")
///             .build()?;
///         build_request(Method::POST, &path, None, &Query::new(), &self.header)
///     }
///
///     fn headers_mut(&mut self) -> &mut HeaderMap {
///         &mut self.header
///     }
/// }
///
/// let request = RefreshReq::default().to_request().unwrap();
/// assert_eq!(request.uri(), "/_refresh");
/// ```
pub trait Endpoint: Send {
    /// Build the outgoing request. Consumes the descriptor, since the body
    /// may be a one-shot stream.
    fn to_request(self) -> Result<http::Request<Body>, BuildError>;

    /// Headers sent with this call, applied over the client defaults.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Set a header on this call.
    fn with_header(mut self, name: &str, value: &str) -> Result<Self, BuildError>
    where
        Self: Sized,
    {
        let name = HeaderName::try_from(name)?;
        let value = HeaderValue::try_from(value)?;
        self.headers_mut().insert(name, value);
        Ok(self)
    }

    /// Tag this call with an `X-Opaque-Id` so the server can correlate its
    /// tasks and logs with the caller.
    fn with_opaque_id(self, id: &str) -> Result<Self, BuildError>
    where
        Self: Sized,
    {
        self.with_header(OPAQUE_ID, id)
    }
}

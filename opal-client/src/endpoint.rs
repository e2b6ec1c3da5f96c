//! Shared plumbing for descriptor implementations.

use http::{HeaderMap, Method};
use opal_core::{build_request, Body, BuildError, Params};

/// Build a request from a descriptor's parts.
pub(crate) fn request<P: Params>(
    method: Method,
    path: &str,
    body: Option<Body>,
    params: &P,
    header: &HeaderMap,
) -> Result<http::Request<Body>, BuildError> {
    build_request(method, path, body, &params.to_query(), header)
}

/// `headers_mut` for descriptors that keep their headers in `header`.
macro_rules! header_field {
    () => {
        fn headers_mut(&mut self) -> &mut ::http::HeaderMap {
            &mut self.header
        }
    };
}

pub(crate) use header_field;

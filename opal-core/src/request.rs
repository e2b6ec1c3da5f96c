//! Request building.
//!
//! [`build_request`] turns `(method, path, body, query, headers)` into an
//! `http::Request` with an origin-form URI (`/path?query`). The transport
//! resolves it against its base URL.

use crate::body::Body;
use crate::error::BuildError;
use crate::params::Query;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Method, Uri};

/// Content type applied to bodies that do not set one.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Build a ready-to-send request.
///
/// - the query is URL-encoded and appended to `path`;
/// - caller headers are applied as given;
/// - a body without a `Content-Type` header gets `application/json`.
///
/// `path` is used verbatim; escape identifiers with [`PathBuilder`].
pub fn build_request(
    method: Method,
    path: &str,
    body: Option<Body>,
    query: &Query,
    headers: &HeaderMap,
) -> Result<http::Request<Body>, BuildError> {
    let uri = if query.is_empty() {
        Uri::try_from(path)?
    } else {
        Uri::try_from(format!("{path}?{}", query.to_query_string()))?
    };

    let mut request = http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())?;

    *request.headers_mut() = headers.clone();

    if let Some(body) = body {
        if !request.headers().contains_key(CONTENT_TYPE) {
            request
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        }
        *request.body_mut() = body;
    }

    Ok(request)
}

/// Characters left unescaped in path segments: separators and wildcards
/// that are legal inside a segment.
const SEGMENT_SAFE: &[(&str, char)] = &[
    ("%2C", ','),
    ("%2A", '*'),
    ("%3A", ':'),
    ("%40", '@'),
    ("%21", '!'),
    ("%24", '$'),
    ("%27", '\''),
    ("%28", '('),
    ("%29", ')'),
    ("%2B", '+'),
    ("%3B", ';'),
    ("%3D", '='),
    ("%26", '&'),
];

/// Percent-escape a caller-supplied path segment.
///
/// Identifiers that are already path-safe are returned unchanged; `/`,
/// `?`, `#`, `%` and whitespace are escaped.
pub fn escape_segment(segment: &str) -> String {
    let mut escaped = urlencoding::encode(segment).into_owned();
    if escaped.contains('%') {
        for (encoded, literal) in SEGMENT_SAFE {
            if escaped.contains(encoded) {
                escaped = escaped.replace(encoded, &literal.to_string());
            }
        }
    }
    escaped
}

/// Assembles endpoint paths from literal and caller-supplied segments.
///
/// Optional segments that are empty are skipped, so no `//` runs appear.
/// Required segments that are empty fail the build, as do the dot
/// segments `.` and `..`.
///
/// ```
/// use opal_core::PathBuilder;
///
/// let path = PathBuilder::new()
///     .list("index", &["movies".to_string(), "books".to_string()])
///     .literal("_alias")
///     .optional("")
///     .build()
///     .unwrap();
/// assert_eq!(path, "/movies,books/_alias");
/// ```
#[derive(Debug, Default)]
pub struct PathBuilder {
    path: String,
    error: Option<BuildError>,
}

impl PathBuilder {
    /// Start an empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a literal segment such as `_search`.
    pub fn literal(mut self, segment: &str) -> Self {
        self.path.push('/');
        self.path.push_str(segment);
        self
    }

    /// Append a required segment.
    pub fn part(mut self, name: &'static str, value: &str) -> Self {
        if value.is_empty() {
            self.error.get_or_insert(BuildError::MissingPart(name));
            return self;
        }
        if value == "." || value == ".." {
            self.error.get_or_insert(BuildError::InvalidPart(name));
            return self;
        }
        self.path.push('/');
        self.path.push_str(&escape_segment(value));
        self
    }

    /// Append a segment if it is non-empty.
    pub fn optional(self, value: &str) -> Self {
        if value.is_empty() {
            self
        } else {
            self.part("segment", value)
        }
    }

    /// Append a required comma-joined list.
    pub fn list(self, name: &'static str, values: &[String]) -> Self {
        let joined = join(values);
        self.part(name, &joined)
    }

    /// Append a comma-joined list if it is non-empty.
    pub fn optional_list(self, values: &[String]) -> Self {
        let joined = join(values);
        self.optional(&joined)
    }

    /// Finish the path. An empty path becomes `/`.
    pub fn build(self) -> Result<String, BuildError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.path.is_empty() {
            Ok("/".to_string())
        } else {
            Ok(self.path)
        }
    }
}

fn join(values: &[String]) -> String {
    values
        .iter()
        .filter(|v| !v.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

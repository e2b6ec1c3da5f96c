//! Query-parameter encoding.
//!
//! Every endpoint carries a flat parameters struct. Each field knows how to
//! render itself as a single query value through [`Param`], and the
//! [`params!`](crate::params!) macro stitches the fields of a struct (plus
//! the common `pretty`, `human`, `error_trace` and `filter_path` parameters)
//! into a [`Query`].
//!
//! The encoding rules distinguish "absent" from "false/zero":
//!
//! | Field type | Omitted when | Encoded as |
//! |---|---|---|
//! | `Option<bool>` | `None` | `true` / `false` |
//! | `bool` | `false` | `true` |
//! | `Option<integer>` | `None` | decimal |
//! | `String` | empty | as-is |
//! | `Vec<T>` | empty | comma-joined |
//! | `Duration` | zero | `<n>ms`, or `<n>nanos` below one millisecond |
//! | `Option<DateTime<Utc>>` | `None` | RFC 3339 in UTC |
//! | `Option<serde_json::Value>` | `None` / `null` | textual form |

use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

/// Encoded query parameters.
///
/// Keys are kept sorted so two equal parameter structs always produce the
/// same query string. Empty values are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: BTreeMap<String, String>,
}

impl Query {
    /// Create an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode `value` under `name`, skipping it when it is absent.
    pub fn push<P: Param + ?Sized>(&mut self, name: &str, value: &P) {
        if let Some(encoded) = value.encode() {
            self.insert(name, encoded);
        }
    }

    /// Insert a pre-encoded value. Empty values are dropped.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            self.pairs.insert(name.into(), value);
        }
    }

    /// Get an encoded value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs.get(name).map(String::as_str)
    }

    /// Number of encoded parameters.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether no parameter was encoded.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterate over `(name, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Consume the query into its underlying map.
    pub fn into_map(self) -> BTreeMap<String, String> {
        self.pairs
    }

    /// Render as an `application/x-www-form-urlencoded` query string.
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in &self.pairs {
            serializer.append_pair(name, value);
        }
        serializer.finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Query {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut query = Query::new();
        for (k, v) in iter {
            query.insert(k, v);
        }
        query
    }
}

/// A parameters struct that can encode itself into a [`Query`].
pub trait Params {
    /// Append every present field to `query`.
    fn encode_into(&self, query: &mut Query);

    /// Encode into a fresh query.
    fn to_query(&self) -> Query {
        let mut query = Query::new();
        self.encode_into(&mut query);
        query
    }
}

/// A parameter field: encodes to a query value, or `None` when absent.
pub trait Param {
    /// Encode the field.
    fn encode(&self) -> Option<String>;
}

/// A scalar value that may appear inside an `Option` or a list.
pub trait ParamValue {
    /// Render the scalar. `None` means the value carries no information
    /// (an empty string, a zero duration) and must be omitted.
    fn to_param(&self) -> Option<String>;
}

/// Render a duration the way the server parses time values.
///
/// Whole milliseconds are used from one millisecond upwards; anything
/// shorter is sent in nanoseconds. Microsecond units are not accepted by
/// the server and are never produced.
pub fn format_duration(duration: Duration) -> String {
    if duration >= Duration::from_millis(1) {
        format!("{}ms", duration.as_millis())
    } else {
        format!("{}nanos", duration.as_nanos())
    }
}

/// Render a timestamp as RFC 3339 in UTC.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

impl ParamValue for bool {
    fn to_param(&self) -> Option<String> {
        Some(self.to_string())
    }
}

macro_rules! integer_param {
    ($($ty:ty),*) => {
        $(
            impl ParamValue for $ty {
                fn to_param(&self) -> Option<String> {
                    Some(self.to_string())
                }
            }
        )*
    };
}

integer_param!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl ParamValue for f64 {
    fn to_param(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl ParamValue for String {
    fn to_param(&self) -> Option<String> {
        (!self.is_empty()).then(|| self.clone())
    }
}

impl ParamValue for &str {
    fn to_param(&self) -> Option<String> {
        (!self.is_empty()).then(|| (*self).to_string())
    }
}

impl ParamValue for Duration {
    fn to_param(&self) -> Option<String> {
        (!self.is_zero()).then(|| format_duration(*self))
    }
}

impl ParamValue for DateTime<Utc> {
    fn to_param(&self) -> Option<String> {
        Some(format_timestamp(self))
    }
}

impl ParamValue for serde_json::Value {
    fn to_param(&self) -> Option<String> {
        match self {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => s.to_param(),
            other => Some(other.to_string()),
        }
    }
}

impl<T: ParamValue> Param for Option<T> {
    fn encode(&self) -> Option<String> {
        self.as_ref().and_then(ParamValue::to_param)
    }
}

/// A plain `bool` is a flag: sent only when set.
impl Param for bool {
    fn encode(&self) -> Option<String> {
        self.then(|| "true".to_string())
    }
}

impl Param for String {
    fn encode(&self) -> Option<String> {
        self.to_param()
    }
}

impl Param for Duration {
    fn encode(&self) -> Option<String> {
        self.to_param()
    }
}

impl<T: ParamValue> Param for Vec<T> {
    fn encode(&self) -> Option<String> {
        let joined = self
            .iter()
            .filter_map(ParamValue::to_param)
            .collect::<Vec<_>>()
            .join(",");
        (!joined.is_empty()).then_some(joined)
    }
}

/// Declare a parameters struct.
///
/// Fields are encoded under their own name unless a key is given with
/// `=> "key"`. The common `pretty`, `human`, `error_trace` and
/// `filter_path` fields are appended to every struct.
///
/// ```
/// use opal_core::params;
/// use opal_core::params::Params;
/// use std::time::Duration;
///
/// params! {
///     /// Parameters for a lookup.
///     pub struct LookupParams {
///         realtime: Option<bool>,
///         timeout: Option<Duration>,
///         source: Option<bool> => "_source",
///     }
/// }
///
/// let params = LookupParams {
///     realtime: Some(false),
///     source: Some(true),
///     ..Default::default()
/// };
/// let query = params.to_query();
/// assert_eq!(query.get("realtime"), Some("false"));
/// assert_eq!(query.get("_source"), Some("true"));
/// assert_eq!(query.get("timeout"), None);
/// ```
#[macro_export]
macro_rules! params {
    (@key $field:ident $key:literal) => {
        $key
    };
    (@key $field:ident) => {
        stringify!($field)
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident : $ty:ty $(=> $key:literal)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )*
            /// Pretty-format the returned JSON.
            pub pretty: bool,
            /// Return statistics in human-readable units.
            pub human: bool,
            /// Include stack traces in returned errors.
            pub error_trace: bool,
            /// Only return the listed response paths.
            pub filter_path: ::std::vec::Vec<::std::string::String>,
        }

        impl $crate::params::Params for $name {
            fn encode_into(&self, query: &mut $crate::params::Query) {
                $(
                    query.push($crate::params!(@key $field $($key)?), &self.$field);
                )*
                query.push("pretty", &self.pretty);
                query.push("human", &self.human);
                query.push("error_trace", &self.error_trace);
                query.push("filter_path", &self.filter_path);
            }
        }
    };
}

/// Declare an enumerated parameter value.
///
/// ```
/// use opal_core::param_enum;
/// use opal_core::params::ParamValue;
///
/// param_enum! {
///     /// When to refresh.
///     pub enum Refresh {
///         True => "true",
///         WaitFor => "wait_for",
///     }
/// }
///
/// assert_eq!(Refresh::WaitFor.to_param().as_deref(), Some("wait_for"));
/// ```
#[macro_export]
macro_rules! param_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $value:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant,
            )*
        }

        impl $name {
            /// The wire form of this value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $value, )*
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $crate::params::ParamValue for $name {
            fn to_param(&self) -> ::std::option::Option<::std::string::String> {
                ::std::option::Option::Some(self.as_str().to_string())
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    crate::params! {
        struct SampleParams {
            allow_no_indices: Option<bool>,
            verbose: bool,
            size: Option<i64>,
            routing: String,
            sort: Vec<String>,
            scroll: Option<Duration>,
            timeout: Duration,
            since: Option<DateTime<Utc>>,
            version: Option<serde_json::Value>,
            source: Option<bool> => "_source",
        }
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let query = SampleParams::default().to_query();
        assert!(query.is_empty());
    }

    #[test]
    fn test_false_and_zero_are_sent_when_set() {
        let params = SampleParams {
            allow_no_indices: Some(false),
            size: Some(0),
            ..Default::default()
        };
        let query = params.to_query();
        assert_eq!(query.get("allow_no_indices"), Some("false"));
        assert_eq!(query.get("size"), Some("0"));
        assert_eq!(query.len(), 2);
    }

    #[test]
    fn test_flag_only_sent_when_true() {
        let mut params = SampleParams::default();
        assert_eq!(params.to_query().get("verbose"), None);
        params.verbose = true;
        assert_eq!(params.to_query().get("verbose"), Some("true"));
    }

    #[test]
    fn test_duration_encoding() {
        assert_eq!(format_duration(Duration::from_secs(10)), "10000ms");
        assert_eq!(format_duration(Duration::from_millis(1)), "1ms");
        assert_eq!(format_duration(Duration::from_micros(1500)), "1ms");
        assert_eq!(format_duration(Duration::from_nanos(999_999)), "999999nanos");
        assert_eq!(format_duration(Duration::from_nanos(1)), "1nanos");

        assert_eq!(Duration::ZERO.encode(), None);
        assert_eq!(Some(Duration::ZERO).encode(), None);
        assert_eq!(Some(Duration::from_millis(250)).encode().as_deref(), Some("250ms"));
    }

    #[test]
    fn test_list_and_string_encoding() {
        let params = SampleParams {
            routing: "user-1".to_string(),
            sort: vec!["title:asc".to_string(), "date:desc".to_string()],
            ..Default::default()
        };
        let query = params.to_query();
        assert_eq!(query.get("routing"), Some("user-1"));
        assert_eq!(query.get("sort"), Some("title:asc,date:desc"));

        let empty: Vec<String> = vec![String::new()];
        assert_eq!(empty.encode(), None);
    }

    #[test]
    fn test_timestamp_is_utc_rfc3339() {
        let params = SampleParams {
            since: Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()),
            ..Default::default()
        };
        assert_eq!(params.to_query().get("since"), Some("2024-03-01T12:30:00Z"));
    }

    #[test]
    fn test_opaque_values() {
        let mut params = SampleParams {
            version: Some(serde_json::json!(7)),
            ..Default::default()
        };
        assert_eq!(params.to_query().get("version"), Some("7"));

        params.version = Some(serde_json::json!("abc"));
        assert_eq!(params.to_query().get("version"), Some("abc"));

        params.version = Some(serde_json::Value::Null);
        assert_eq!(params.to_query().get("version"), None);
    }

    #[test]
    fn test_renamed_key_and_common_params() {
        let params = SampleParams {
            source: Some(false),
            pretty: true,
            filter_path: vec!["hits.hits._id".to_string(), "took".to_string()],
            ..Default::default()
        };
        let query = params.to_query();
        assert_eq!(query.get("_source"), Some("false"));
        assert_eq!(query.get("pretty"), Some("true"));
        assert_eq!(query.get("filter_path"), Some("hits.hits._id,took"));
        assert_eq!(query.get("human"), None);
        assert_eq!(query.get("error_trace"), None);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let a = SampleParams {
            sort: vec!["a".to_string()],
            size: Some(3),
            ..Default::default()
        };
        let b = a.clone();
        assert_eq!(a.to_query(), b.to_query());
        assert_eq!(a.to_query().to_query_string(), "size=3&sort=a");
    }

    #[test]
    fn test_query_string_is_url_encoded() {
        let query: Query = [("q", "title:rust & go")].into_iter().collect();
        assert_eq!(query.to_query_string(), "q=title%3Arust+%26+go");
    }
}

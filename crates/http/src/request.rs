//! The inbound request: start line, headers, path parameters and a body sink.

use crate::body::Body;
use crate::headers::Headers;
use http::{Method, Version};
use std::collections::HashMap;
use std::str::FromStr;

/// A single captured path parameter's raw value, with typed-access sugar.
///
/// The original exposed this as `Parameters::Field::as<T>()`, returning `std::optional<T>` for
/// any type with an `operator>>` overload. `FromStr` is the idiomatic equivalent: any type that
/// implements it (all integer and float primitives, `bool`, `String`, and user types) gets
/// `parse::<T>()` for free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamValue(String);

impl ParamValue {
    pub fn new(raw: impl Into<String>) -> Self {
        ParamValue(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the raw segment into `T`, returning `None` on failure rather than an error: a
    /// malformed parameter is a routing-level concern the handler resolves by falling back to
    /// a default, not a protocol error.
    pub fn parse<T: FromStr>(&self) -> Option<T> {
        self.0.parse().ok()
    }
}

/// Path parameters captured while matching a route, keyed by parameter name (without the `:`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    inner: HashMap<String, ParamValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(name.into(), ParamValue::new(value));
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.inner.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// A single query-string key/value pair. Query parameters are parsed independently of path
/// parameters: a route's `:id` segment and its `?id=` query key never collide because they live
/// in separate maps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    inner: HashMap<String, String>,
}

impl Query {
    /// Parses a raw query string (the part after `?`, without the leading `?`).
    ///
    /// Percent-decoding and `+`-as-space are not performed: the spec scopes this to plain
    /// key=value pairs, matching the original's minimal query parser.
    pub fn parse(raw: &str) -> Self {
        let mut inner = HashMap::new();
        if raw.is_empty() {
            return Query { inner };
        }
        for pair in raw.split('&') {
            if pair.is_empty() {
                continue;
            }
            match pair.split_once('=') {
                Some((k, v)) => {
                    inner.insert(k.to_string(), v.to_string());
                }
                None => {
                    inner.insert(pair.to_string(), String::new());
                }
            }
        }
        Query { inner }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// An inbound HTTP request.
///
/// `path` is the normalized request path (no query string, no trailing slash except for
/// root). `params` is populated by the router once the matching route is determined; it is
/// empty at parse time.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub version: Version,
    pub path: String,
    pub query: Query,
    pub headers: Headers,
    pub params: Params,
    pub body: Body,
}

impl Request {
    pub fn new(method: Method, version: Version, path: impl Into<String>) -> Self {
        Request {
            method,
            version,
            path: path.into(),
            query: Query::default(),
            headers: Headers::new(),
            params: Params::new(),
            body: Body::None,
        }
    }

    /// Collapses consecutive `/` and strips a trailing `/` (except for the root path `/`
    /// itself). Applied unconditionally, independent of whether a query string is present —
    /// this is the one place this crate's behavior deliberately diverges from the literal
    /// original, whose `format_path` only normalized when no query string followed.
    pub fn normalize_path(raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        let mut last_was_slash = false;
        for c in raw.chars() {
            if c == '/' {
                if last_was_slash {
                    continue;
                }
                last_was_slash = true;
            } else {
                last_was_slash = false;
            }
            out.push(c);
        }
        if out.len() > 1 && out.ends_with('/') {
            out.pop();
        }
        if out.is_empty() {
            out.push('/');
        }
        out
    }

    pub fn content_length(&self) -> Option<usize> {
        self.headers.get("content-length").and_then(|v| v.parse().ok())
    }

    pub fn is_keep_alive(&self, default_keep_alive: bool) -> bool {
        match self.headers.get("connection") {
            Some(v) if v.eq_ignore_ascii_case("close") => false,
            Some(v) if v.eq_ignore_ascii_case("keep-alive") => true,
            _ => default_keep_alive,
        }
    }
}

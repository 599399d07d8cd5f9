//! The outbound response and its builder.

use crate::body::Body;
use crate::error::SendError;
use crate::headers::Headers;
use bytes::{Bytes, BytesMut};
use http::{StatusCode, Version};
use triomphe::Arc;

/// The literal string the original library wrote into every `Server` response header.
const SERVER_HEADER: &str = "RoutineHttpLibrary";

/// An outbound HTTP response.
///
/// The body is held behind a [`triomphe::Arc`] rather than `std::sync::Arc`: responses are
/// built on a worker thread and then handed to the I/O side for writing, and `triomphe`'s
/// thin, single-word pointer avoids the weak-count slot this crate never uses.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub version: Version,
    pub headers: Headers,
    pub body: Arc<Body>,
}

impl Response {
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::new()
    }

    /// Fills in the headers the wire format always sends: `Server`, `Date`, and, when a body is
    /// present, `Content-Type` (defaulted to `text/plain` if unset) and `Content-Length`.
    ///
    /// `date` is supplied by the caller (a `DateService` that keeps a formatted date string
    /// fresh in the background) rather than computed here, so this crate's response assembly
    /// does not need to know how the date is kept fresh.
    pub fn fill_default_headers(&mut self, date: &str) {
        self.headers.insert("Server", SERVER_HEADER);
        self.headers.insert("Date", date);

        let body_len = self.body.size();
        if body_len > 0 && !self.headers.contains("content-type") {
            self.headers.insert("Content-Type", mime::TEXT_PLAIN.as_ref());
        }
        self.headers.insert("Content-Length", body_len.to_string());
    }

    /// Serializes the status line, headers and body into wire bytes.
    ///
    /// Returns `bytes::Bytes` rather than `Vec<u8>` so the I/O side can hand the buffer to a
    /// vectored write without an extra copy, matching how the rest of this crate family moves
    /// wire data.
    pub fn encode(&self) -> Result<Bytes, SendError> {
        let mut out = BytesMut::with_capacity(256 + self.body.size());
        let version_str = match self.version {
            Version::HTTP_10 => "HTTP/1.0",
            Version::HTTP_11 => "HTTP/1.1",
            other => return Err(SendError::invalid_body(format!("unsupported version {other:?}"))),
        };
        out.extend_from_slice(version_str.as_bytes());
        out.extend_from_slice(b" ");
        out.extend_from_slice(self.status.as_str().as_bytes());
        out.extend_from_slice(b" ");
        out.extend_from_slice(self.status.canonical_reason().unwrap_or("").as_bytes());
        out.extend_from_slice(b"\r\n");

        for (name, value) in &self.headers {
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.body.read());
        Ok(out.freeze())
    }
}

/// A fluent builder for [`Response`], mirroring the `ServerBuilder`/`SchedulerBuilder`
/// construction style used throughout this crate family.
#[derive(Debug, Default)]
pub struct ResponseBuilder {
    status: Option<StatusCode>,
    version: Option<Version>,
    headers: Headers,
    body: Option<Body>,
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.headers.insert("Content-Type", mime::TEXT_PLAIN.as_ref());
        self.body = Some(Body::Memory(body.into().into_bytes()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.headers.insert("Content-Type", mime::APPLICATION_JSON.as_ref());
        self.body = Some(Body::Json(Some(body)));
        self
    }

    pub fn build(self) -> Response {
        Response {
            status: self.status.unwrap_or(StatusCode::OK),
            version: self.version.unwrap_or(Version::HTTP_11),
            headers: self.headers,
            body: Arc::new(self.body.unwrap_or(Body::None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_headers_fill_content_type_and_length() {
        let mut response = Response::builder().text("hello").build();
        response.fill_default_headers("Mon, 01 Jan 2024 00:00:00 GMT");

        assert_eq!(response.headers.get("server"), Some(SERVER_HEADER));
        assert_eq!(response.headers.get("content-length"), Some("5"));
        assert_eq!(response.headers.get("content-type"), Some("text/plain"));
    }

    #[test]
    fn explicit_content_type_is_not_overwritten() {
        let mut response = Response::builder()
            .header("Content-Type", "application/xml")
            .body(Body::Memory(b"<a/>".to_vec()))
            .build();
        response.fill_default_headers("Mon, 01 Jan 2024 00:00:00 GMT");

        assert_eq!(response.headers.get("content-type"), Some("application/xml"));
    }

    #[test]
    fn empty_body_has_zero_content_length_and_no_content_type() {
        let mut response = Response::builder().status(StatusCode::NO_CONTENT).build();
        response.fill_default_headers("Mon, 01 Jan 2024 00:00:00 GMT");

        assert_eq!(response.headers.get("content-length"), Some("0"));
        assert_eq!(response.headers.get("content-type"), None);
    }

    #[test]
    fn encode_produces_a_well_formed_status_line() {
        let mut response = Response::builder().status(StatusCode::NOT_FOUND).build();
        response.fill_default_headers("Mon, 01 Jan 2024 00:00:00 GMT");
        let bytes = response.encode().unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();

        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
    }
}

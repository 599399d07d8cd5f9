//! Parses a buffered header section into a [`Request`].
//!
//! Limits mirror the teacher's header decoder (`MAX_HEADER_NUM`), widened on the byte budget
//! per this library's own default (16 KiB rather than the teacher's 8 KiB).

use crate::error::ParseError;
use crate::headers::Headers;
use crate::request::{Query, Request};
use http::{Method, Version};
use std::mem::MaybeUninit;
use std::str::FromStr;

/// Maximum number of headers a single request may carry.
pub const MAX_HEADER_NUM: usize = 64;

/// Maximum size, in bytes, of the request line plus header section.
pub const MAX_HEADER_BYTES: usize = 16 * 1024;

/// The parsed head of a request: everything up to (not including) the body.
pub struct ParsedHead {
    pub request: Request,
    /// Byte offset into the input buffer where the body begins.
    pub body_offset: usize,
    pub content_length: Option<usize>,
    pub is_chunked: bool,
}

/// Attempts to parse a complete request line + header section from `buf`.
///
/// Returns `Ok(None)` if `buf` does not yet contain a complete header section (the caller
/// should read more bytes and retry) or `Err` if the section is malformed or exceeds a limit.
pub fn parse_request_line_and_headers(buf: &[u8]) -> Result<Option<ParsedHead>, ParseError> {
    if buf.len() > MAX_HEADER_BYTES {
        // Even if httparse would eventually find the terminator, the section as received so
        // far has already blown the budget.
        if !contains_header_terminator(buf) {
            return Err(ParseError::too_large_header(buf.len(), MAX_HEADER_BYTES));
        }
    }

    let mut header_storage: [MaybeUninit<httparse::Header>; MAX_HEADER_NUM] =
        unsafe { MaybeUninit::uninit().assume_init() };
    let mut parsed = httparse::Request::new(&mut []);

    let status = parsed
        .parse_with_uninit_headers(buf, &mut header_storage)
        .map_err(|e| match e {
            httparse::Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
            other => ParseError::invalid_start_line(other.to_string()),
        })?;

    let body_offset = match status {
        httparse::Status::Complete(offset) => offset,
        httparse::Status::Partial => return Ok(None),
    };

    if body_offset > MAX_HEADER_BYTES {
        return Err(ParseError::too_large_header(body_offset, MAX_HEADER_BYTES));
    }

    let method_str = parsed.method.ok_or(ParseError::InvalidMethod)?;
    let method = Method::from_str(method_str).map_err(|_| ParseError::InvalidMethod)?;

    let version = match parsed.version {
        Some(0) => Version::HTTP_10,
        Some(1) => Version::HTTP_11,
        _ => return Err(ParseError::InvalidVersion),
    };

    let target = parsed.path.ok_or(ParseError::InvalidTarget)?;
    let (raw_path, raw_query) = match target.split_once('?') {
        Some((p, q)) => (p, q),
        None => (target, ""),
    };
    let path = Request::normalize_path(raw_path);

    let mut headers = Headers::new();
    for header in parsed.headers.iter() {
        let value = std::str::from_utf8(header.value)
            .map_err(|_| ParseError::invalid_start_line("non-utf8 header value"))?;
        headers.insert(header.name, value);
    }

    if headers.value_eq_ignore_case("transfer-encoding", "chunked") {
        return Err(ParseError::ChunkedNotSupported);
    }

    let content_length = match headers.get("content-length") {
        Some(v) => Some(
            v.trim()
                .parse::<usize>()
                .map_err(|_| ParseError::invalid_content_length(v))?,
        ),
        None => None,
    };

    let mut request = Request::new(method, version, path);
    request.query = Query::parse(raw_query);
    request.headers = headers;

    Ok(Some(ParsedHead {
        request,
        body_offset,
        content_length,
        is_chunked: false,
    }))
}

fn contains_header_terminator(buf: &[u8]) -> bool {
    buf.windows(4).any(|w| w == b"\r\n\r\n")
}

//! Error types for HTTP wire-protocol handling
//!
//! This module provides error types for handling various error conditions that may occur
//! during HTTP request parsing and response encoding.
//!
//! The error types form a hierarchy where [`HttpError`] is the top-level error that can
//! contain either a [`ParseError`] or [`SendError`], mirroring the two directions of the
//! wire: reading a request, writing a response.

use std::io;
use thiserror::Error;

/// The top-level error type for HTTP wire operations.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Errors that occur during request parsing
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    /// Errors that occur during response generation and sending
    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },
}

/// Errors that occur during HTTP request parsing.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Header size exceeds the maximum allowed size
    #[error("header section too large, current: {current_size} exceeds the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    /// Number of headers exceeds the maximum allowed
    #[error("header count exceeds the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    /// Malformed start line (not three space-delimited tokens)
    #[error("invalid request line: {reason}")]
    InvalidStartLine { reason: String },

    /// Invalid or unsupported HTTP method
    #[error("invalid http method")]
    InvalidMethod,

    /// Invalid request target / URI
    #[error("invalid request target")]
    InvalidTarget,

    /// Unsupported HTTP version
    #[error("unsupported http version")]
    InvalidVersion,

    /// Invalid Content-Length header
    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    /// `Transfer-Encoding: chunked` was present; this server does not support it
    #[error("chunked transfer-encoding is not supported")]
    ChunkedNotSupported,

    /// I/O error while reading from the socket
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_start_line<S: ToString>(reason: S) -> Self {
        Self::InvalidStartLine { reason: reason.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(reason: S) -> Self {
        Self::InvalidContentLength { reason: reason.to_string() }
    }
}

/// Errors that occur while generating and sending an HTTP response.
#[derive(Error, Debug)]
pub enum SendError {
    /// Invalid response body
    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    /// I/O error while writing to the socket
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_body<S: ToString>(reason: S) -> Self {
        Self::InvalidBody { reason: reason.to_string() }
    }
}

/// Non-fatal error raised when a body sink fails to accept a write.
///
/// This never aborts the connection — the spec requires body-parse errors (e.g. a `Json`
/// sink receiving malformed JSON) to be reported but not to fail the request.
#[derive(Error, Debug, Clone)]
pub enum BodyError {
    #[error("body storage of kind {kind:?} does not accept writes")]
    WriteRejected { kind: &'static str },

    #[error("failed to parse body as json: {reason}")]
    InvalidJson { reason: String },
}

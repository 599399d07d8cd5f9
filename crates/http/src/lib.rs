//! Wire protocol and codec for the routine HTTP server.
//!
//! This crate owns everything that can be described without reference to sockets or threads:
//! the request/response types, the header collection, the polymorphic body storage, and the
//! one-shot parser/encoder that moves between bytes and those types. Connection lifecycle,
//! routing and scheduling live in `routine-web`.

pub mod body;
pub mod codec;
pub mod error;
pub mod headers;
pub mod request;
pub mod response;

pub use body::{Body, BodyKind};
pub use error::{BodyError, HttpError, ParseError, SendError};
pub use headers::Headers;
pub use request::{ParamValue, Params, Query, Request};
pub use response::{Response, ResponseBuilder};

/// Re-exported so downstream crates match on the same `Method`/`Version`/`StatusCode` types
/// this crate's `Request`/`Response` are built from, without a direct `http` dependency.
pub use http::{Method, StatusCode, Version};

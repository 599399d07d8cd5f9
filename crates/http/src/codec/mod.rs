//! One-shot wire codec: parse a buffered header section into a [`Request`], encode a
//! [`Response`] into bytes.
//!
//! The teacher's codec is a streaming `tokio_util::codec::Decoder`/`Encoder` pair driven
//! incrementally off a `Framed` socket. This crate's connection state machine instead reads the
//! full header section (bounded by [`MAX_HEADER_BYTES`](request_parser::MAX_HEADER_BYTES)) into
//! one contiguous buffer before parsing begins, so a plain parse function over `&[u8]` is a
//! better fit than an incremental `Decoder` — there is no partial-header state to carry between
//! calls.

pub mod request_parser;

pub use request_parser::{parse_request_line_and_headers, ParsedHead};

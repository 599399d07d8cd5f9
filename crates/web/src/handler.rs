//! The request handler contract.
//!
//! Grounded on the original's `RequestHandler` virtual class rather than the teacher's
//! `async_trait` extractor system: the spec's contract is a synchronous two-phase call,
//! `prepare` on the I/O thread and `process` on a worker thread, and neither phase needs to be
//! `async` — `prepare` only inspects headers and optionally installs a body sink, `process`
//! runs to completion on its own worker thread rather than yielding to a reactor.

use routine_http::{Body, Method, Request, Response};
use std::sync::Arc;

/// Implemented once per route. A fresh instance is produced per request by a [`HandlerFactory`],
/// so a handler may hold per-request mutable state without synchronization.
pub trait RequestHandler: Send {
    /// Runs on the connection's I/O thread while headers are still being read.
    ///
    /// The default installs a [`Body::memory()`] sink for any method other than HEAD; override
    /// to install a [`routine_http::Body::Json`] sink instead, or to short-circuit with a
    /// response before the body is even read (e.g. a size check against `Content-Length`).
    fn prepare(&mut self, request: &mut Request) -> Option<Response> {
        if request.method != Method::HEAD {
            request.body = Body::memory();
        }
        None
    }

    /// Runs on a worker thread once the full request (headers + body) has been read.
    fn process(&mut self, request: Request) -> Option<Response>;
}

/// Produces one [`RequestHandler`] instance per matched request.
///
/// Mirrors the original's `Handler_creator_ptr` (`std::function<unique_ptr<RequestHandler>()>`):
/// the router stores one factory per route and calls it on every match.
pub trait HandlerFactory: Send + Sync {
    fn create(&self) -> Box<dyn RequestHandler>;
}

impl<F, H> HandlerFactory for F
where
    F: Fn() -> H + Send + Sync,
    H: RequestHandler + 'static,
{
    fn create(&self) -> Box<dyn RequestHandler> {
        Box::new((self)())
    }
}

pub type SharedHandlerFactory = Arc<dyn HandlerFactory>;

//! The per-connection state machine.
//!
//! Grounded on `original_source/include/net/http_session.hpp` /
//! `source/net/http_session.cpp`: `do_read_headers` → `on_read_headers` → (`do_read_body` |
//! skip) → `on_request_ready` (hands off to the scheduler) → `send_response` → loop or close.
//! The original's `HttpSession` is a `shared_from_this` object whose callbacks close over a
//! shared pointer to itself; here the whole lifecycle is one `async fn` owning its socket and
//! buffer by value; there is nothing to share because there is nothing running concurrently
//! with it.

use crate::date::DateService;
use crate::handler::RequestHandler;
use crate::scheduler::Scheduler;
use routine_http::codec::request_parser::{parse_request_line_and_headers, ParsedHead};
use routine_http::{Body, BodyKind, ParseError, Response, StatusCode};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace, warn};

/// Mirrors the spec's named connection states. Most transitions live in the control flow of
/// [`run`]; this enum exists so each phase can be logged and reasoned about by name, the way
/// the original's method names (`do_read_headers`, `on_request_ready`, ...) double as state
/// labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    ReadingHeaders,
    PreparingBody,
    ReadingBody,
    Queued,
    Processing,
    Writing,
    Closing,
    Closed,
}

/// Per-connection tunables threaded down from [`crate::server::ServerBuilder`].
#[derive(Debug, Clone, Copy)]
pub struct ConnectionConfig {
    pub io_timeout: Duration,
    pub default_keep_alive: bool,
}

/// Read buffer chunk size for a single socket read.
const READ_CHUNK: usize = 4096;

/// A small set of error kinds that end the connection but are not worth reporting above
/// debug — a write racing a peer that already went away.
fn is_benign(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotConnected | io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset | io::ErrorKind::UnexpectedEof
    )
}

/// Drives one accepted socket through its full request/response lifecycle, looping for
/// keep-alive connections until the client or an error ends it.
pub async fn run(mut stream: TcpStream, scheduler: Arc<Scheduler>, date_service: Arc<DateService>, config: ConnectionConfig) {
    let mut state = ConnectionState::ReadingHeaders;
    let mut leftover: Vec<u8> = Vec::new();

    loop {
        state = ConnectionState::ReadingHeaders;
        trace!(?state, "awaiting request");

        let head = match read_head(&mut stream, &mut leftover, config.io_timeout).await {
            Ok(Some(head)) => head,
            Ok(None) => {
                debug!("peer closed connection before sending a request");
                break;
            }
            Err(ConnectionError::Parse(ParseError::ChunkedNotSupported)) => {
                write_and_maybe_continue(
                    &mut stream,
                    response_for_status(StatusCode::NOT_IMPLEMENTED, "chunked transfer-encoding is not supported"),
                    &date_service,
                    config.io_timeout,
                )
                .await;
                break;
            }
            Err(ConnectionError::Parse(ParseError::TooLargeHeader { .. })) => {
                write_and_maybe_continue(
                    &mut stream,
                    response_for_status(StatusCode::from_u16(431).unwrap(), "request header fields too large"),
                    &date_service,
                    config.io_timeout,
                )
                .await;
                break;
            }
            Err(ConnectionError::Parse(_)) => {
                write_and_maybe_continue(
                    &mut stream,
                    response_for_status(StatusCode::BAD_REQUEST, "malformed request"),
                    &date_service,
                    config.io_timeout,
                )
                .await;
                break;
            }
            Err(ConnectionError::TimedOut) => {
                debug!("timed out waiting for request headers");
                break;
            }
            Err(ConnectionError::Io(e)) if is_benign(&e) => {
                debug!(error = %e, "benign io error reading headers");
                break;
            }
            Err(ConnectionError::Io(e)) => {
                warn!(error = %e, "io error reading headers");
                break;
            }
        };

        let ParsedHead { mut request, content_length, .. } = head;

        let Some((factory, params)) = scheduler.route_request(&request) else {
            let msg = format!("requested resource '{}' has no registered handler", request.path);
            warn!(path = %request.path, "route miss");
            let keep_alive = request.is_keep_alive(config.default_keep_alive);
            write_response(&mut stream, response_for_status(StatusCode::NOT_FOUND, &msg), &date_service, config.io_timeout).await.ok();
            if !keep_alive {
                break;
            }
            continue;
        };
        request.params = params;

        let mut handler = factory.create();

        state = ConnectionState::PreparingBody;
        if let Some(response) = handler.prepare(&mut request) {
            let keep_alive = request.is_keep_alive(config.default_keep_alive);
            if write_response(&mut stream, response, &date_service, config.io_timeout).await.is_err() || !keep_alive {
                break;
            }
            continue;
        }

        if request.body.kind() == BodyKind::None {
            request.body = default_body_sink(&request);
        }

        if let Some(len) = content_length {
            state = ConnectionState::ReadingBody;
            match read_body(&mut stream, &mut leftover, len, config.io_timeout).await {
                Ok(body_bytes) => {
                    if let Err(e) = request.body.write(&body_bytes) {
                        warn!(error = %e, path = %request.path, "request body rejected by its sink");
                    }
                }
                Err(ConnectionError::TimedOut) => {
                    debug!("timed out reading request body");
                    break;
                }
                Err(ConnectionError::Io(e)) if is_benign(&e) => {
                    debug!(error = %e, "benign io error reading body");
                    break;
                }
                Err(e) => {
                    warn!(error = ?e, "error reading request body");
                    break;
                }
            }
        }

        // Captured before the request moves into the worker closure: the handoff described in
        // the shared-resource policy moves the request by value, so whatever the I/O side
        // needs from it afterward has to be read out first.
        let keep_alive = request.is_keep_alive(config.default_keep_alive);

        state = ConnectionState::Queued;
        trace!(?state, path = %request.path, "handing request to worker pool");

        let (tx, rx) = tokio::sync::oneshot::channel();
        let path_for_error = request.path.clone();
        scheduler.prepare_task(move || {
            let response = handler.process(request).unwrap_or_else(|| {
                let msg = format!("handler for '{path_for_error}' produced no response");
                response_for_status(StatusCode::INTERNAL_SERVER_ERROR, &msg)
            });
            let _ = tx.send(response);
        });

        state = ConnectionState::Processing;
        let response = match rx.await {
            Ok(response) => response,
            Err(_) => response_for_status(StatusCode::INTERNAL_SERVER_ERROR, "worker task dropped"),
        };

        state = ConnectionState::Writing;
        trace!(?state, "writing response");

        match write_response(&mut stream, response, &date_service, config.io_timeout).await {
            Ok(()) if keep_alive => continue,
            _ => break,
        }
    }

    state = ConnectionState::Closing;
    trace!(?state, "closing connection");
    let _ = stream.shutdown().await;
    state = ConnectionState::Closed;
    trace!(?state, "connection closed");
}

#[derive(Debug)]
enum ConnectionError {
    Parse(ParseError),
    Io(io::Error),
    TimedOut,
}

impl From<ParseError> for ConnectionError {
    fn from(e: ParseError) -> Self {
        ConnectionError::Parse(e)
    }
}

impl From<io::Error> for ConnectionError {
    fn from(e: io::Error) -> Self {
        ConnectionError::Io(e)
    }
}

/// Reads and parses the request line + header section, re-arming the per-operation timeout
/// around each individual socket read rather than the whole loop.
async fn read_head(stream: &mut TcpStream, leftover: &mut Vec<u8>, timeout: Duration) -> Result<Option<ParsedHead>, ConnectionError> {
    let mut buf = std::mem::take(leftover);

    loop {
        if let Some(head) = parse_request_line_and_headers(&buf)? {
            let remainder = buf.split_off(head.body_offset);
            *leftover = remainder;
            return Ok(Some(head));
        }

        let mut chunk = [0u8; READ_CHUNK];
        let n = match tokio::time::timeout(timeout, stream.read(&mut chunk)).await {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(ConnectionError::TimedOut),
        };
        if n == 0 {
            return if buf.is_empty() { Ok(None) } else { Err(io::Error::from(io::ErrorKind::UnexpectedEof).into()) };
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

/// Reads the request body: if the bytes already carried over from the header read satisfy
/// `content_length`, no further socket read is issued, matching the original's
/// `buffer_.size() <= content_length` fast path.
async fn read_body(stream: &mut TcpStream, leftover: &mut Vec<u8>, content_length: usize, timeout: Duration) -> Result<Vec<u8>, ConnectionError> {
    let mut buf = std::mem::take(leftover);

    while buf.len() < content_length {
        let mut chunk = [0u8; READ_CHUNK];
        let to_read = (content_length - buf.len()).min(READ_CHUNK);
        let n = match tokio::time::timeout(timeout, stream.read(&mut chunk[..to_read])).await {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(ConnectionError::TimedOut),
        };
        if n == 0 {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body = buf[..content_length].to_vec();
    *leftover = buf.split_off(content_length);
    Ok(body)
}

/// Installs a body sink by `Content-Type` when a handler's `prepare` left none installed
/// (the default `prepare` already installs a `Memory` sink for non-HEAD methods, so this only
/// matters for handlers that override `prepare` and return `None` without installing one, or
/// for HEAD requests).
fn default_body_sink(request: &routine_http::Request) -> Body {
    let is_json = request
        .headers
        .get("content-type")
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|base| base.trim().eq_ignore_ascii_case(mime::APPLICATION_JSON.as_ref()));

    if is_json {
        Body::json()
    } else {
        Body::memory()
    }
}

fn response_for_status(status: StatusCode, message: &str) -> Response {
    Response::builder().status(status).text(message.to_string()).build()
}

async fn write_response(stream: &mut TcpStream, mut response: Response, date_service: &DateService, timeout: Duration) -> io::Result<()> {
    let date = date_service.current();
    response.fill_default_headers(&date);
    let bytes = match response.encode() {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "failed to encode response");
            return Err(io::Error::new(io::ErrorKind::InvalidData, e.to_string()));
        }
    };

    match tokio::time::timeout(timeout, stream.write_all(&bytes)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(io::Error::from(io::ErrorKind::TimedOut)),
    }
}

async fn write_and_maybe_continue(stream: &mut TcpStream, response: Response, date_service: &DateService, timeout: Duration) {
    if let Err(e) = write_response(stream, response, date_service, timeout).await {
        if !is_benign(&e) {
            warn!(error = %e, "failed to write error response");
        }
    }
}

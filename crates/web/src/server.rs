//! Server construction and the accept loop.
//!
//! Grounded on the teacher's `crates/web/src/server.rs`: the `ServerBuilder`/`ServerBuildError`
//! shape, the `TcpListener::bind` + `tokio::select! { ctrl_c, accept }` loop, and spawning one
//! task per accepted connection all carry over directly. What changes is what gets spawned:
//! the teacher hands the socket to a `HttpConnection` built around its streaming codec; this
//! server hands it to [`crate::connection::run`], the named-state connection machine described
//! in this crate's module docs, driven by a [`Scheduler`] rather than the teacher's `Handler`
//! trait object.

use crate::connection::{self, ConnectionConfig};
use crate::date::DateService;
use crate::error::ServerBuildError;
use crate::router::Router;
use crate::scheduler::{Scheduler, SchedulerBuilder};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_IO_THREADS: usize = 2;
const DEFAULT_CPU_THREADS: usize = 4;
const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Fluent builder for [`Server`], mirroring the construction style used by
/// [`crate::scheduler::SchedulerBuilder`] and [`crate::router::RouterBuilder`].
pub struct ServerBuilder {
    router: Option<Router>,
    address: Option<SocketAddr>,
    io_threads: usize,
    cpu_threads: usize,
    io_timeout: Duration,
    default_keep_alive: bool,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        ServerBuilder {
            router: None,
            address: None,
            io_threads: DEFAULT_IO_THREADS,
            cpu_threads: DEFAULT_CPU_THREADS,
            io_timeout: DEFAULT_IO_TIMEOUT,
            default_keep_alive: true,
        }
    }
}

impl ServerBuilder {
    fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, address: SocketAddr) -> Self {
        self.address = Some(address);
        self
    }

    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    pub fn io_threads(mut self, n: usize) -> Self {
        self.io_threads = n;
        self
    }

    pub fn cpu_threads(mut self, n: usize) -> Self {
        self.cpu_threads = n;
        self
    }

    pub fn io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    pub fn default_keep_alive(mut self, keep_alive: bool) -> Self {
        self.default_keep_alive = keep_alive;
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let router = self.router.ok_or(ServerBuildError::MissingRouter)?;
        let address = self.address.ok_or(ServerBuildError::MissingAddress)?;

        let scheduler = SchedulerBuilder::new()
            .router(router)
            .io_threads(self.io_threads)
            .cpu_threads(self.cpu_threads)
            .io_timeout(self.io_timeout)
            .build()
            .map_err(ServerBuildError::Bind)?;

        Ok(Server {
            scheduler: Arc::new(scheduler),
            address,
            connection_config: ConnectionConfig {
                io_timeout: self.io_timeout,
                default_keep_alive: self.default_keep_alive,
            },
        })
    }
}

/// An embeddable HTTP/1.1 server: a bound listener driven by a [`Scheduler`].
pub struct Server {
    scheduler: Arc<Scheduler>,
    address: SocketAddr,
    connection_config: ConnectionConfig,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Installs a default `tracing_subscriber` if the embedder has not already installed one,
    /// binds the listener, and accepts connections until `ctrl_c` or a fatal bind error.
    ///
    /// Each accepted socket is spawned as its own task onto the scheduler's reactor runtime;
    /// `start` itself runs on whatever runtime the caller is already in (the scheduler owns an
    /// independent one for connection work).
    pub async fn start(self) {
        let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
        let _ = tracing::subscriber::set_global_default(subscriber);

        info!(address = %self.address, "starting server");
        let listener = match TcpListener::bind(self.address).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(error = %e, "failed to bind listener");
                return;
            }
        };

        let date_service = Arc::new(DateService::spawn(self.scheduler.reactor()));
        let scheduler = self.scheduler;
        let config = self.connection_config;

        loop {
            let (stream, _peer) = tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("received shutdown signal");
                    break;
                }
                result = listener.accept() => {
                    match result {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            warn!(error = %e, "failed to accept connection");
                            continue;
                        }
                    }
                }
            };

            let _ = stream.set_nodelay(true);
            let scheduler = Arc::clone(&scheduler);
            let date_service = Arc::clone(&date_service);

            scheduler.reactor().spawn(connection::run(stream, scheduler.clone(), date_service, config));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{HandlerFactory, RequestHandler};
    use crate::router::RouterBuilder;
    use http::{Method, StatusCode};
    use routine_http::{Request, Response};

    struct Pong;
    impl RequestHandler for Pong {
        fn process(&mut self, _request: Request) -> Option<Response> {
            Some(Response::builder().status(StatusCode::OK).text("pong").build())
        }
    }

    #[test]
    fn build_fails_without_router() {
        let result = Server::builder().bind("127.0.0.1:0".parse().unwrap()).build();
        assert!(matches!(result, Err(ServerBuildError::MissingRouter)));
    }

    #[test]
    fn build_fails_without_address() {
        let factory: Arc<dyn HandlerFactory> = Arc::new(|| Pong);
        let router = RouterBuilder::new().route(Method::GET, "/ping", factory).unwrap().build();
        let result = Server::builder().router(router).build();
        assert!(matches!(result, Err(ServerBuildError::MissingAddress)));
    }

    #[test]
    fn build_succeeds_with_router_and_address() {
        let factory: Arc<dyn HandlerFactory> = Arc::new(|| Pong);
        let router = RouterBuilder::new().route(Method::GET, "/ping", factory).unwrap().build();
        let server = Server::builder().router(router).bind("127.0.0.1:0".parse().unwrap()).build();
        assert!(server.is_ok());
    }
}

//! The scheduler, router and connection engine of the routine HTTP server.
//!
//! This crate builds on [`routine_http`]'s wire protocol with everything that needs sockets
//! and threads: the [`router::Router`] route registry, the [`handler::RequestHandler`]
//! contract, the hand-rolled [`worker_pool::WorkerPool`], the [`scheduler::Scheduler`] that
//! ties a reactor runtime to that pool, the per-connection state machine in [`connection`], and
//! the [`server::Server`] that ties all of it to a listening socket.

pub mod connection;
pub mod date;
pub mod error;
pub mod handler;
pub mod router;
pub mod scheduler;
pub mod server;
pub mod worker_pool;

pub use error::{RouteError, SchedulerError, ServerBuildError};
pub use handler::{HandlerFactory, RequestHandler, SharedHandlerFactory};
pub use router::{Router, RouterBuilder};
pub use scheduler::{Scheduler, SchedulerBuilder};
pub use server::{Server, ServerBuilder};
pub use worker_pool::WorkerPool;

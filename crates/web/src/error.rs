//! Error types for routing, scheduling and server construction.

use thiserror::Error;

/// Errors raised while registering or resolving routes.
#[derive(Debug, Error)]
pub enum RouteError {
    /// A dynamic segment registration conflicts with an existing sibling parameter of a
    /// different name at the same position (e.g. registering `/users/{id}` after
    /// `/users/{name}`). The original rejects this the same way, at registration time.
    #[error("path segment at {position} already has a parameter named `{{{existing}}}`, cannot also register `{{{attempted}}}`")]
    ConflictingParameterName { position: usize, existing: String, attempted: String },

    /// The same method + path was registered twice.
    #[error("route already registered: {method} {path}")]
    DuplicateRoute { method: String, path: String },

    /// An empty path segment that is neither the root path nor a valid literal/parameter.
    #[error("invalid route path: {path}")]
    InvalidPath { path: String },
}

/// Errors raised by the worker pool.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("worker pool has already been stopped")]
    PoolStopped,

    #[error("cannot resize pool below 1 worker")]
    ResizeBelowMinimum,
}

/// Errors raised while building a [`crate::server::Server`].
#[derive(Debug, Error)]
pub enum ServerBuildError {
    #[error("no router configured; call ServerBuilder::router")]
    MissingRouter,

    #[error("no bind address configured; call ServerBuilder::bind")]
    MissingAddress,

    #[error("failed to bind listener: {0}")]
    Bind(#[from] std::io::Error),
}

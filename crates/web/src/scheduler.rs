//! The scheduler: a reactor plus a worker pool.
//!
//! Grounded on `original_source/include/scheduler.hpp` / `source/scheduler.cpp`, with one
//! deliberate redesign. The original's `run()` spawns `io_bound_threads` tasks that each loop
//! `while (true) { context.run(); }` on a hand-rolled IO thread pool. Transliterating that into
//! `loop { runtime.block_on(pending) }` would just be the busy-poll in a Rust accent. A
//! `tokio::runtime::Runtime` built with `io_bound_threads` worker threads already **is** that
//! pool — its own scheduler drives the reactor internally the moment tasks are spawned onto it,
//! and keeping the `Runtime` handle alive for the scheduler's lifetime is the idiomatic
//! equivalent of the work-guard the original's busy loop provided by never returning.
//!
//! The worker pool (`cpu_bound_threads` in the original) stays exactly as hand-rolled as the
//! original: see [`crate::worker_pool::WorkerPool`].

use crate::error::SchedulerError;
use crate::handler::SharedHandlerFactory;
use crate::router::Router;
use crate::worker_pool::WorkerPool;
use routine_http::{Params, Request};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Owns the async reactor (a `tokio::runtime::Runtime`) and the synchronous worker pool, and
/// routes requests against the configured [`Router`].
pub struct Scheduler {
    runtime: tokio::runtime::Runtime,
    router: Arc<Router>,
    worker_pool: WorkerPool,
    io_timeout: Duration,
}

impl Scheduler {
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    pub fn io_timeout(&self) -> Duration {
        self.io_timeout
    }

    pub fn set_io_timeout(&mut self, timeout: Duration) {
        self.io_timeout = timeout;
    }

    /// A handle into the reactor runtime, used by the connection loop to spawn one task per
    /// accepted socket.
    pub fn reactor(&self) -> &tokio::runtime::Handle {
        self.runtime.handle()
    }

    /// Resolves a request to its handler factory and captured path parameters.
    pub fn route_request(&self, request: &Request) -> Option<(SharedHandlerFactory, Params)> {
        self.router.route_request(request)
    }

    /// Hands a unit of CPU-bound work (running a handler's `process` phase) to the worker pool.
    pub fn prepare_task(&self, job: impl FnOnce() + Send + 'static) {
        self.worker_pool.push(job);
    }

    pub fn resize_workers(&mut self, n: usize) -> Result<(), SchedulerError> {
        if n == 0 {
            return Err(SchedulerError::ResizeBelowMinimum);
        }
        let current = self.worker_pool.threads_count();
        if n > current {
            self.worker_pool.run(n - current);
        } else if n < current {
            self.worker_pool.stop(current - n);
        }
        Ok(())
    }

    /// Stops every worker thread. The reactor `Runtime` is shut down when `self` drops.
    pub fn join_threads(&mut self) {
        trace!("joining worker threads");
        self.worker_pool.join();
    }
}

/// Builder for [`Scheduler`], paralleling `ServerBuilder`/`RouterBuilder`.
pub struct SchedulerBuilder {
    router: Option<Router>,
    io_threads: usize,
    cpu_threads: usize,
    io_timeout: Duration,
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        SchedulerBuilder {
            router: None,
            io_threads: 2,
            cpu_threads: 4,
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }
}

impl SchedulerBuilder {
    pub fn new() -> Self {
        Self::default()
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

    /// Builds and starts the scheduler: spins up the reactor `Runtime` with `io_threads` worker
    /// threads and the CPU worker pool with `cpu_threads` workers.
    pub fn build(self) -> std::io::Result<Scheduler> {
        trace!(io_threads = self.io_threads, cpu_threads = self.cpu_threads, "starting scheduler");

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.io_threads.max(1))
            .enable_all()
            .thread_name("routine-reactor")
            .build()?;

        let mut worker_pool = WorkerPool::new();
        worker_pool.run(self.cpu_threads);

        Ok(Scheduler {
            runtime,
            router: Arc::new(self.router.unwrap_or_default()),
            worker_pool,
            io_timeout: self.io_timeout,
        })
    }
}

//! A hand-rolled CPU worker pool.
//!
//! Grounded directly on `original_source/include/thread_pool.hpp` and
//! `source/thread_pool.cpp`. This is deliberately NOT `tokio::task::spawn_blocking` or
//! `rayon`: the spec's placement and resize semantics are specific enough (least-loaded
//! placement with a particular tie-break, queue redistribution on shrink, loss reporting when
//! the pool empties out entirely) that handing them to a generic executor would silently
//! change behavior at the edges a caller might depend on.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};

type Job = Box<dyn FnOnce() + Send + 'static>;

const WORKER_POLL_INTERVAL: Duration = Duration::from_millis(100);

struct Shared {
    queue: Mutex<VecDeque<Job>>,
    cv: Condvar,
    stopped: AtomicBool,
}

impl Shared {
    fn queue_len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }
}

struct Worker {
    handle: Option<JoinHandle<()>>,
    shared: Arc<Shared>,
}

impl Worker {
    fn spawn(index: usize) -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            cv: Condvar::new(),
            stopped: AtomicBool::new(false),
        });
        let worker_shared = Arc::clone(&shared);

        let handle = std::thread::Builder::new()
            .name(format!("routine-worker-{index}"))
            .spawn(move || {
                debug!(worker = index, "worker thread started");
                loop {
                    let mut guard = worker_shared.queue.lock().unwrap();
                    loop {
                        if !guard.is_empty() || worker_shared.stopped.load(Ordering::Acquire) {
                            break;
                        }
                        let (next_guard, _timeout) =
                            worker_shared.cv.wait_timeout(guard, WORKER_POLL_INTERVAL).unwrap();
                        guard = next_guard;
                    }

                    if worker_shared.stopped.load(Ordering::Acquire) {
                        return;
                    }
                    if guard.is_empty() {
                        continue;
                    }

                    let task = guard.pop_front().unwrap();
                    drop(guard);
                    task();
                }
            })
            .expect("failed to spawn worker thread");

        Worker { handle: Some(handle), shared }
    }

    fn stop(&mut self) {
        self.shared.stopped.store(true, Ordering::Release);
        self.shared.cv.notify_all();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn drain(&self) -> VecDeque<Job> {
        std::mem::take(&mut *self.shared.queue.lock().unwrap())
    }
}

/// A hand-rolled thread pool with least-loaded task placement.
///
/// `push` scans workers for the first with an empty queue; failing that, the worker with the
/// smallest queue, ties going to the lowest index — matching the original's scan exactly.
pub struct WorkerPool {
    workers: Vec<Worker>,
}

impl Default for WorkerPool {
    fn default() -> Self {
        WorkerPool { workers: Vec::new() }
    }
}

impl WorkerPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `n` new worker threads.
    pub fn run(&mut self, n: usize) {
        let start = self.workers.len();
        for i in 0..n {
            self.workers.push(Worker::spawn(start + i));
        }
    }

    /// Stops the first `n` workers (clamped to the pool size), joining their threads, and
    /// redistributes any work still queued on them to the survivors. If no workers survive,
    /// the lost task count is logged as a warning rather than silently dropped.
    pub fn stop(&mut self, n: usize) {
        let n = n.min(self.workers.len());
        info!(count = n, "stopping workers");

        let mut stopped: Vec<Worker> = self.workers.drain(0..n).collect();
        for worker in &mut stopped {
            worker.stop();
        }

        if self.workers.is_empty() {
            let losses: usize = stopped.iter().map(|w| w.drain().len()).sum();
            if losses > 0 {
                warn!(losses, "all workers stopped, tasks lost");
            }
            return;
        }

        for worker in &stopped {
            for task in worker.drain() {
                self.push(task);
            }
        }
    }

    /// Enqueues a job on the least-loaded worker. If the pool has no workers, the original logs
    /// an error and runs the job inline on the calling thread rather than losing it; the same
    /// fallback is kept here.
    pub fn push(&self, job: impl FnOnce() + Send + 'static) {
        if self.workers.is_empty() {
            error!("no available worker threads, running inline; call WorkerPool::run(n) first");
            job();
            return;
        }

        let mut best_index = 0;
        let mut best_len = self.workers[0].shared.queue_len();
        for (i, worker) in self.workers.iter().enumerate() {
            let len = worker.shared.queue_len();
            if len == 0 {
                best_index = i;
                break;
            }
            if len < best_len {
                best_index = i;
                best_len = len;
            }
        }

        let worker = &self.workers[best_index];
        worker.shared.queue.lock().unwrap().push_back(Box::new(job));
        worker.shared.cv.notify_all();
        debug!(worker = best_index, "job pushed");
    }

    pub fn tasks_count(&self) -> usize {
        self.workers.iter().map(|w| w.shared.queue_len()).sum()
    }

    pub fn threads_count(&self) -> usize {
        self.workers.len()
    }

    /// Stops every remaining worker, joining its thread.
    pub fn join(&mut self) {
        self.stop(self.workers.len());
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn runs_pushed_jobs() {
        let mut pool = WorkerPool::new();
        pool.run(2);

        let (tx, rx) = mpsc::channel();
        for i in 0..10 {
            let tx = tx.clone();
            pool.push(move || tx.send(i).unwrap());
        }

        let mut results: Vec<i32> = (0..10).map(|_| rx.recv_timeout(Duration::from_secs(1)).unwrap()).collect();
        results.sort();
        assert_eq!(results, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn pushes_inline_with_no_workers() {
        let pool = WorkerPool::new();
        let (tx, rx) = mpsc::channel();
        pool.push(move || tx.send(42).unwrap());
        assert_eq!(rx.recv().unwrap(), 42);
    }

    #[test]
    fn resize_down_redistributes_queued_work() {
        let mut pool = WorkerPool::new();
        pool.run(4);
        assert_eq!(pool.threads_count(), 4);

        pool.stop(2);
        assert_eq!(pool.threads_count(), 2);

        let (tx, rx) = mpsc::channel();
        pool.push(move || tx.send(()).unwrap());
        rx.recv_timeout(Duration::from_secs(1)).unwrap();
    }

    #[test]
    fn stopping_every_worker_does_not_panic() {
        let mut pool = WorkerPool::new();
        pool.run(2);
        pool.stop(2);
        assert_eq!(pool.threads_count(), 0);
    }
}

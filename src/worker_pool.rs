//! # Worker Pool Module
//!
//! A bounded set of OS worker threads consuming a single FIFO task queue.
//! Every accepted request becomes one task; workers pull tasks in enqueue
//! order and run them to completion.
//!
//! ## Features
//!
//! - **Fixed worker set**: N threads, defaulting to the host's available
//!   parallelism
//! - **FIFO queue**: one unbounded MPMC channel shared by all workers
//! - **Panic isolation**: a panicking task never takes its worker down
//! - **Metrics**: queue depth, dispatch count, and completion count
//! - **Orderly shutdown**: the queue drains, then every worker is joined
//!
//! ## Configuration
//!
//! - `SWITCHYARD_WORKERS`: number of worker threads (default: available
//!   parallelism)
//! - `SWITCHYARD_STACK_SIZE`: worker thread stack size, decimal or `0x` hex
//!   (default: 2 MiB)
//! - `SWITCHYARD_QUEUE_BOUND`: queue depth that triggers a warning; the queue
//!   itself is not bounded (default: 1024)

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::{env, fmt};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, error, info, warn};

/// A unit of work: one request's dispatch pipeline, ready to run.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Configuration for a worker pool.
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// Number of worker threads.
    pub num_workers: usize,
    /// Queue depth that triggers a warning. Reporting only; enqueue never
    /// blocks or sheds.
    pub queue_bound: usize,
    /// Stack size for worker threads in bytes.
    pub stack_size: usize,
}

impl WorkerPoolConfig {
    /// Load configuration from environment variables, falling back to
    /// [`WorkerPoolConfig::default`] for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let num_workers = env::var("SWITCHYARD_WORKERS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.num_workers);

        let queue_bound = env::var("SWITCHYARD_QUEUE_BOUND")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.queue_bound);

        let stack_size = env::var("SWITCHYARD_STACK_SIZE")
            .ok()
            .and_then(|s| parse_stack_size(&s))
            .unwrap_or(defaults.stack_size);

        Self {
            num_workers,
            queue_bound,
            stack_size,
        }
    }
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        let num_workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            num_workers,
            queue_bound: 1024,
            stack_size: 0x20_0000, // 2 MiB
        }
    }
}

fn parse_stack_size(s: &str) -> Option<usize> {
    if let Some(hex) = s.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}

/// Counters for observing a worker pool.
#[derive(Debug, Default)]
pub struct WorkerPoolMetrics {
    queue_depth: AtomicUsize,
    dispatched_count: AtomicU64,
    completed_count: AtomicU64,
}

impl WorkerPoolMetrics {
    /// Record an enqueue; returns the new approximate queue depth.
    fn record_dispatch(&self) -> usize {
        self.dispatched_count.fetch_add(1, Ordering::Relaxed);
        self.queue_depth.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn record_completion(&self) {
        self.completed_count.fetch_add(1, Ordering::Relaxed);
        self.queue_depth.fetch_sub(1, Ordering::Relaxed);
    }

    /// Tasks currently queued or running (approximate).
    pub fn queue_depth(&self) -> usize {
        self.queue_depth.load(Ordering::Relaxed)
    }

    /// Total tasks accepted by the pool.
    pub fn dispatched_count(&self) -> u64 {
        self.dispatched_count.load(Ordering::Relaxed)
    }

    /// Total tasks that finished (including panicked ones).
    pub fn completed_count(&self) -> u64 {
        self.completed_count.load(Ordering::Relaxed)
    }
}

/// Error returned by [`WorkerPool::enqueue`] after shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolClosed;

impl fmt::Display for PoolClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker pool is shut down")
    }
}

impl std::error::Error for PoolClosed {}

/// A fixed set of worker threads sharing one FIFO task queue.
///
/// Tasks are fire-and-forget: the pool never propagates their results or
/// panics, and there is no per-task cancellation. Shutdown is process-scoped:
/// the queue stops accepting work, drains, and every worker is joined.
pub struct WorkerPool {
    config: WorkerPoolConfig,
    sender: Mutex<Option<Sender<Task>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    metrics: Arc<WorkerPoolMetrics>,
}

impl WorkerPool {
    /// Spawn the worker threads and return the pool.
    pub fn new(config: WorkerPoolConfig) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded::<Task>();
        let metrics = Arc::new(WorkerPoolMetrics::default());

        info!(
            num_workers = config.num_workers,
            queue_bound = config.queue_bound,
            stack_size = config.stack_size,
            "starting worker pool"
        );

        let mut workers = Vec::with_capacity(config.num_workers);
        for worker_id in 0..config.num_workers {
            let rx = rx.clone();
            let metrics = Arc::clone(&metrics);
            let builder = thread::Builder::new()
                .name(format!("switchyard-worker-{worker_id}"))
                .stack_size(config.stack_size);
            match builder.spawn(move || worker_loop(worker_id, rx, metrics)) {
                Ok(handle) => workers.push(handle),
                Err(e) => error!(worker_id, error = %e, "failed to spawn worker thread"),
            }
        }

        Self {
            config,
            sender: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
            metrics,
        }
    }

    /// Queue a task. Never blocks; fails only after [`WorkerPool::shutdown`].
    pub fn enqueue(&self, task: Task) -> Result<(), PoolClosed> {
        let sender = self.sender.lock().unwrap();
        let Some(sender) = sender.as_ref() else {
            return Err(PoolClosed);
        };
        let depth = self.metrics.record_dispatch();
        if depth > self.config.queue_bound {
            warn!(
                depth,
                bound = self.config.queue_bound,
                "task queue depth exceeds configured bound"
            );
        }
        sender.send(task).map_err(|_| {
            self.metrics.record_completion();
            PoolClosed
        })
    }

    /// The pool's metrics handle.
    pub fn metrics(&self) -> Arc<WorkerPoolMetrics> {
        Arc::clone(&self.metrics)
    }

    /// The configuration the pool was built with.
    pub fn config(&self) -> &WorkerPoolConfig {
        &self.config
    }

    /// Stop accepting work, let queued tasks drain, and join every worker.
    ///
    /// Safe to call more than once; later calls are no-ops.
    pub fn shutdown(&self) {
        let sender = self.sender.lock().unwrap().take();
        if sender.is_none() {
            return;
        }
        drop(sender);

        let workers = std::mem::take(&mut *self.workers.lock().unwrap());
        for handle in workers {
            if handle.join().is_err() {
                error!("worker thread panicked during shutdown");
            }
        }
        debug!("worker pool drained and joined");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(worker_id: usize, rx: Receiver<Task>, metrics: Arc<WorkerPoolMetrics>) {
    debug!(worker_id, "worker thread started");
    for task in rx.iter() {
        if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
            error!(worker_id, "task panicked");
        }
        metrics.record_completion();
    }
    debug!(worker_id, "worker thread exiting");
}

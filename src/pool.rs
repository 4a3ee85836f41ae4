use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{
    atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering},
    Arc, Mutex, PoisonError,
};
use std::thread;

use tracing::{debug, debug_span, error, info, trace, warn};

use super::{
    errors::{PoolError, TaskError},
    handle::{result_channel, Handle},
    model::{PoolMetrics, PoolState, Task},
    queue::BoundedQueue,
};

/// Pool sizing. Worker count and queue capacity are both clamped to at
/// least one at construction.
#[derive(Debug, Clone)]
pub struct Config {
    pub workers: usize,
    pub queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        let num_cpus = num_cpus::get();
        Self {
            workers: num_cpus,
            queue_capacity: num_cpus * 16,
        }
    }
}

impl Config {
    pub fn cpu_bound() -> Self {
        let num_cpus = num_cpus::get();
        Self {
            workers: num_cpus,
            queue_capacity: num_cpus * 10,
        }
    }

    pub fn io_bound() -> Self {
        let num_cpus = num_cpus::get();
        Self {
            workers: num_cpus * 2,
            queue_capacity: num_cpus * 32,
        }
    }
}

struct PoolShared {
    queue: BoundedQueue<Task>,
    state: AtomicU8,
    next_task_id: AtomicU64,
    total_submitted: Arc<AtomicUsize>,
    completed_tasks: Arc<AtomicUsize>,
    failed_tasks: Arc<AtomicUsize>,
}

/// Fixed-size pool of worker threads draining a shared bounded queue.
///
/// Submission blocks once `queue_capacity` tasks are pending; that bound is
/// the pool's only backpressure mechanism. Task failures stay inside the
/// failing task's result channel and never take a worker down.
pub struct WorkerPool {
    shared: Arc<PoolShared>,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
    config: Config,
}

impl WorkerPool {
    /// Starts a pool with `workers` threads and a queue bound of
    /// `queue_capacity` pending tasks.
    pub fn new(workers: usize, queue_capacity: usize) -> Self {
        Self::with_config(Config {
            workers,
            queue_capacity,
        })
    }

    pub fn with_config(config: Config) -> Self {
        let config = Config {
            workers: config.workers.max(1),
            ..config
        };
        let shared = Arc::new(PoolShared {
            queue: BoundedQueue::new(config.queue_capacity),
            state: AtomicU8::new(PoolState::Running.as_u8()),
            next_task_id: AtomicU64::new(0),
            total_submitted: Arc::new(AtomicUsize::new(0)),
            completed_tasks: Arc::new(AtomicUsize::new(0)),
            failed_tasks: Arc::new(AtomicUsize::new(0)),
        });

        let mut workers = Vec::with_capacity(config.workers);
        for id in 0..config.workers {
            let ctx = WorkerContext {
                id,
                shared: shared.clone(),
            };
            let handle = thread::Builder::new()
                .name(format!("bounded-pool-{id}"))
                .spawn(move || ctx.run())
                .expect("failed to spawn worker thread");
            workers.push(handle);
        }
        debug!(workers = config.workers, capacity = shared.queue.capacity(), "pool started");

        Self {
            shared,
            workers: Mutex::new(workers),
            config,
        }
    }

    pub fn state(&self) -> PoolState {
        PoolState::from_u8(self.shared.state.load(Ordering::Acquire))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            workers: self.config.workers,
            queued_tasks: self.shared.queue.len(),
            total_submitted: self.shared.total_submitted.load(Ordering::Relaxed),
            completed_tasks: self.shared.completed_tasks.load(Ordering::Relaxed),
            failed_tasks: self.shared.failed_tasks.load(Ordering::Relaxed),
        }
    }

    /// Enqueues fire-and-forget work. A panicking body is caught, counted as
    /// failed and logged; there is no other way to observe its outcome.
    pub fn submit<F>(&self, f: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        let completed = self.shared.completed_tasks.clone();
        let failed = self.shared.failed_tasks.clone();
        self.enqueue(move || match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(()) => {
                completed.fetch_add(1, Ordering::Relaxed);
            }
            Err(payload) => {
                failed.fetch_add(1, Ordering::Relaxed);
                warn!(panic = %panic_message(payload), "task panicked");
            }
        })
    }

    /// Enqueues `f` and returns a handle that resolves to its return value,
    /// or to `TaskError::Panic` if the body panics. Returns immediately once
    /// the task is buffered; blocks only while the queue is full.
    pub fn submit_with_result<T, F>(&self, f: F) -> Result<Handle<T>, PoolError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (mut promise, handle) = result_channel();
        let completed = self.shared.completed_tasks.clone();
        let failed = self.shared.failed_tasks.clone();
        self.enqueue(move || match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => {
                completed.fetch_add(1, Ordering::Relaxed);
                let _ = promise.set_value(value);
            }
            Err(payload) => {
                failed.fetch_add(1, Ordering::Relaxed);
                let _ = promise.set_error(TaskError::Panic(panic_message(payload)));
            }
        })?;
        Ok(handle)
    }

    /// Like [`submit_with_result`](Self::submit_with_result) for bodies that
    /// return `Result`. An `Err` is captured as `TaskError::Failed` and
    /// surfaces only through the returned handle, mirroring how a panic does.
    pub fn submit_fallible<T, E, F>(&self, f: F) -> Result<Handle<T>, PoolError>
    where
        T: Send + 'static,
        E: fmt::Display,
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        let (mut promise, handle) = result_channel();
        let completed = self.shared.completed_tasks.clone();
        let failed = self.shared.failed_tasks.clone();
        self.enqueue(move || match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(value)) => {
                completed.fetch_add(1, Ordering::Relaxed);
                let _ = promise.set_value(value);
            }
            Ok(Err(e)) => {
                failed.fetch_add(1, Ordering::Relaxed);
                let _ = promise.set_error(TaskError::Failed(e.to_string()));
            }
            Err(payload) => {
                failed.fetch_add(1, Ordering::Relaxed);
                let _ = promise.set_error(TaskError::Panic(panic_message(payload)));
            }
        })?;
        Ok(handle)
    }

    fn enqueue<F>(&self, body: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.state() != PoolState::Running {
            return Err(PoolError::Stopped);
        }
        let id = self.shared.next_task_id.fetch_add(1, Ordering::Relaxed);
        let task = Task::new(id, body);
        // The state can leave Running while we block on a full queue; the
        // queue closing underneath us surfaces as a failed push.
        self.shared
            .queue
            .push(task)
            .map_err(|_| PoolError::Stopped)?;
        self.shared.total_submitted.fetch_add(1, Ordering::Relaxed);
        trace!(task = id, "task enqueued");
        Ok(())
    }

    /// Stops the pool and joins every worker before returning.
    ///
    /// Graceful shutdown closes the queue and lets workers drain what is
    /// already buffered; forced shutdown additionally discards unstarted
    /// tasks (their handles resolve to `TaskError::ChannelClosed`). Neither
    /// mode interrupts a task mid-execution, and task errors are never
    /// re-raised here. Idempotent: a later call finds nothing left to join
    /// and returns once the pool is stopped.
    pub fn shutdown(&self, graceful: bool) {
        let target = if graceful {
            PoolState::Draining
        } else {
            PoolState::Stopped
        };
        let prev = self
            .shared
            .state
            .fetch_max(target.as_u8(), Ordering::AcqRel);
        let first = prev == PoolState::Running.as_u8();

        self.shared.queue.close();
        if !graceful {
            let discarded = self.shared.queue.drain();
            if !discarded.is_empty() {
                warn!(discarded = discarded.len(), "dropping unstarted tasks");
            }
        }

        // Concurrent callers serialize here; whoever arrives second joins an
        // empty list after the first caller has finished joining.
        let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
        for worker in workers.drain(..) {
            if worker.join().is_err() {
                // Task bodies are panic-wrapped, so this indicates a bug in
                // the worker loop itself.
                error!("worker thread panicked");
            }
        }
        self.shared
            .state
            .store(PoolState::Stopped.as_u8(), Ordering::Release);
        if first {
            info!(graceful, "pool stopped");
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown(true);
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("state", &self.state())
            .field("workers", &self.config.workers)
            .field("queue_capacity", &self.config.queue_capacity)
            .finish()
    }
}

/// Per-worker context, owned by the worker thread for its whole life.
struct WorkerContext {
    id: usize,
    shared: Arc<PoolShared>,
}

impl WorkerContext {
    fn run(self) {
        let span = debug_span!("worker", id = self.id);
        let _enter = span.enter();
        debug!("worker started");
        // None is the end-of-stream sentinel: queue closed and drained.
        while let Some(task) = self.shared.queue.pop() {
            trace!(task = task.id(), "running task");
            // The body carries its own panic capture and result routing, so
            // a failing task comes back here instead of unwinding the loop.
            task.run();
        }
        debug!("end of stream, worker exiting");
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

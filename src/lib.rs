//! Bounded blocking task queue and a fixed-size worker pool on top of it.
//!
//! # Features
//! - FIFO queue with a hard capacity bound; full-queue backpressure on submitters
//! - Drainable close: buffered work finishes, then consumers see end-of-stream
//! - One-shot result handles with panic and error capture per task
//! - Graceful or forced shutdown, always joining every worker
//! - Failing tasks never take a worker down

pub mod errors;
pub mod handle;
pub mod model;
pub mod pool;
pub mod queue;
pub mod result;

pub use handle::{result_channel, Handle, Promise};
pub use pool::{Config, WorkerPool};
pub use queue::BoundedQueue;

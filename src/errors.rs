use thiserror::Error;

/// The queue no longer accepts pushes. Expected at shutdown, not fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("queue is closed")]
pub struct Closed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Submission rejected because the pool is no longer running.
    #[error("pool is stopped")]
    Stopped,
}

/// Outcome-side errors, delivered through a task's result handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("task failed: {0}")]
    Failed(String),
    #[error("task panicked: {0}")]
    Panic(String),
    /// The write side was dropped before any result was set. Seen by handles
    /// whose task was discarded by a forced shutdown.
    #[error("result channel dropped before a result was set")]
    ChannelClosed,
    #[error("result already set")]
    AlreadySet,
    #[error("result already consumed")]
    AlreadyConsumed,
    #[error("timed out waiting for result")]
    Timeout,
}

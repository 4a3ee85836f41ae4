use std::fmt;

/// An opaque unit of work: a boxed zero-argument body plus an id used for
/// tracing. Built by the pool at submission time; any result routing and panic
/// capture is already baked into the body.
pub struct Task {
    id: u64,
    body: Box<dyn FnOnce() + Send + 'static>,
}

impl Task {
    pub(crate) fn new<F>(id: u64, body: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            id,
            body: Box::new(body),
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Consumes the task and runs its body to completion.
    #[inline]
    pub fn run(self) {
        (self.body)();
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("id", &self.id).finish()
    }
}

/// Pool lifecycle. Transitions are monotonic:
/// Running -> Draining -> Stopped, or Running -> Stopped when forced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PoolState {
    Running,
    Draining,
    Stopped,
}

impl PoolState {
    pub(crate) const fn as_u8(self) -> u8 {
        match self {
            PoolState::Running => 0,
            PoolState::Draining => 1,
            PoolState::Stopped => 2,
        }
    }

    pub(crate) const fn from_u8(v: u8) -> Self {
        match v {
            0 => PoolState::Running,
            1 => PoolState::Draining,
            _ => PoolState::Stopped,
        }
    }
}

/// Advisory snapshot of the pool's counters. Loads are relaxed; values can be
/// momentarily inconsistent with each other under load.
#[derive(Debug, Clone)]
pub struct PoolMetrics {
    pub workers: usize,
    pub queued_tasks: usize,
    pub total_submitted: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
}

impl PoolMetrics {
    pub fn queue_pressure(&self) -> f64 {
        self.queued_tasks as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.completed_tasks + self.failed_tasks;
        if total == 0 {
            return 1.0;
        }
        self.completed_tasks as f64 / total as f64
    }
}

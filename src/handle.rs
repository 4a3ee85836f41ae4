use std::mem;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::errors::TaskError;
use super::result::TaskResult;

enum State<T> {
    Pending,
    Ready(TaskResult<T>),
    /// The read side already took the result.
    Taken,
    /// The write side dropped without ever setting a result.
    Abandoned,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    ready: Condvar,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Creates a one-shot channel for a single task outcome.
///
/// The `Promise` is moved into the executing task and written exactly once;
/// the `Handle` stays with the submitter and is read exactly once. Move
/// semantics carry most of the one-shot contract; `AlreadySet` and
/// `AlreadyConsumed` are the runtime backstop.
pub fn result_channel<T>() -> (Promise<T>, Handle<T>) {
    let shared = Arc::new(Shared {
        state: Mutex::new(State::Pending),
        ready: Condvar::new(),
    });
    (
        Promise {
            shared: shared.clone(),
            set: false,
        },
        Handle { shared },
    )
}

/// Write side of a one-shot result channel.
pub struct Promise<T> {
    shared: Arc<Shared<T>>,
    set: bool,
}

impl<T> Promise<T> {
    pub fn set_value(&mut self, value: T) -> Result<(), TaskError> {
        self.set(Ok(value))
    }

    pub fn set_error(&mut self, error: TaskError) -> Result<(), TaskError> {
        self.set(Err(error))
    }

    fn set(&mut self, outcome: TaskResult<T>) -> Result<(), TaskError> {
        let mut state = self.shared.lock();
        match *state {
            State::Pending => {
                *state = State::Ready(outcome);
                self.set = true;
                drop(state);
                self.shared.ready.notify_one();
                Ok(())
            }
            _ => Err(TaskError::AlreadySet),
        }
    }
}

impl<T> Drop for Promise<T> {
    fn drop(&mut self) {
        if self.set {
            return;
        }
        let mut state = self.shared.lock();
        if let State::Pending = *state {
            *state = State::Abandoned;
            drop(state);
            self.shared.ready.notify_one();
        }
    }
}

/// Read side of a one-shot result channel, returned to the submitter.
///
/// A handle that is never read silently discards whatever outcome the task
/// produced, errors included. That is an accepted trade-off of the design,
/// not a bug: the outcome belongs to whoever holds the handle, and nobody
/// else ever observes it.
pub struct Handle<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Handle<T> {
    /// Blocks until the task resolves the channel, then returns the outcome.
    /// A second call returns `Err(AlreadyConsumed)`; a channel whose write
    /// side vanished without a result returns `Err(ChannelClosed)`.
    pub fn get(&mut self) -> TaskResult<T> {
        let mut state = self.shared.lock();
        while matches!(*state, State::Pending) {
            state = self
                .shared
                .ready
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        Self::take(&mut state)
    }

    /// Like [`get`](Self::get), but gives up with `Err(Timeout)` once `timeout`
    /// has elapsed. The handle stays readable after a timeout.
    pub fn get_timeout(&mut self, timeout: Duration) -> TaskResult<T> {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.lock();
        while matches!(*state, State::Pending) {
            let now = Instant::now();
            if now >= deadline {
                return Err(TaskError::Timeout);
            }
            let (guard, _) = self
                .shared
                .ready
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }
        Self::take(&mut state)
    }

    pub fn is_ready(&self) -> bool {
        !matches!(*self.shared.lock(), State::Pending)
    }

    fn take(state: &mut State<T>) -> TaskResult<T> {
        match mem::replace(state, State::Taken) {
            State::Ready(outcome) => outcome,
            State::Taken => Err(TaskError::AlreadyConsumed),
            State::Abandoned => Err(TaskError::ChannelClosed),
            // Callers only reach here once the state left Pending.
            State::Pending => unreachable!("result taken while still pending"),
        }
    }
}

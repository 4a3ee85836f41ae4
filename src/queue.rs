use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use super::errors::Closed;

struct Inner<T> {
    buf: VecDeque<T>,
    closed: bool,
}

/// Thread-safe bounded FIFO with a terminal closed state.
///
/// One mutex guards the buffer and the closed flag; two condvars signal the
/// two wait conditions (not-full for producers, not-empty-or-closed for
/// consumers). Wake policy: one waiter per successful push/pop, all waiters on
/// close. Waiters always retest their predicate after waking, so spurious
/// wakeups are harmless.
pub struct BoundedQueue<T> {
    inner: Mutex<Inner<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Creates a queue holding at most `capacity` items. A capacity of zero is
    /// clamped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(Inner {
                buf: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        }
    }

    // Nothing panics while holding the lock, so poisoning is unreachable;
    // recover the guard instead of propagating a panic.
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `item` at the tail, blocking while the queue is full. Returns
    /// `Err(Closed)` without enqueuing if the queue is closed, or becomes
    /// closed while waiting for space.
    pub fn push(&self, item: T) -> Result<(), Closed> {
        let mut inner = self.lock();
        while inner.buf.len() == self.capacity && !inner.closed {
            inner = self
                .not_full
                .wait(inner)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if inner.closed {
            return Err(Closed);
        }
        inner.buf.push_back(item);
        drop(inner);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Removes and returns the head, blocking while the queue is empty and
    /// open. Returns `None` once the queue is closed and drained; that answer
    /// never reverses.
    pub fn pop(&self) -> Option<T> {
        let mut inner = self.lock();
        loop {
            if let Some(item) = inner.buf.pop_front() {
                drop(inner);
                self.not_full.notify_one();
                return Some(item);
            }
            if inner.closed {
                return None;
            }
            inner = self
                .not_empty
                .wait(inner)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Marks the queue closed and wakes every blocked producer and consumer.
    /// Idempotent. Items already buffered remain poppable.
    pub fn close(&self) {
        let mut inner = self.lock();
        if inner.closed {
            return;
        }
        inner.closed = true;
        drop(inner);
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    /// Removes all buffered items at once without waking consumers per item.
    /// Used by forced shutdown to discard unstarted work.
    pub fn drain(&self) -> Vec<T> {
        let mut inner = self.lock();
        let drained: Vec<T> = inner.buf.drain(..).collect();
        drop(inner);
        if !drained.is_empty() {
            self.not_full.notify_all();
        }
        drained
    }

    pub fn len(&self) -> usize {
        self.lock().buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().buf.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

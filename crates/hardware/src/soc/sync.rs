//! Wait groups.
//!
//! A counter the host can block on until it drops to zero. The system keeps two:
//! one counting harts whose step loop is alive, one counting harts that are
//! executing instructions (not stopped and not in the nop loop).

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Counter with blocking wait-for-zero.
#[derive(Debug, Default)]
pub struct WaitGroup {
    count: Mutex<usize>,
    zero: Condvar,
}

impl WaitGroup {
    /// Creates a wait group with a zero count.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Increments the counter.
    pub fn add(&self) {
        *self.lock() += 1;
    }

    /// Decrements the counter, waking every waiter when it reaches zero.
    ///
    /// # Panics
    ///
    /// If the counter is already zero.
    pub fn done(&self) {
        let mut count = self.lock();
        assert!(*count > 0, "WaitGroup::done called more often than add");
        *count -= 1;
        if *count == 0 {
            self.zero.notify_all();
        }
    }

    /// Current value of the counter.
    pub fn count(&self) -> usize {
        *self.lock()
    }

    /// Blocks until the counter is zero.
    pub fn wait(&self) {
        let guard = self.lock();
        drop(
            self.zero
                .wait_while(guard, |count| *count > 0)
                .unwrap_or_else(PoisonError::into_inner),
        );
    }

    /// Blocks until the counter is zero or `timeout` elapses.
    ///
    /// # Returns
    ///
    /// `true` if the counter reached zero.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.lock();
        let (guard, _) = self
            .zero
            .wait_timeout_while(guard, timeout, |count| *count > 0)
            .unwrap_or_else(PoisonError::into_inner);
        *guard == 0
    }
}

//! Manual-reset event primitive.
//!
//! A `Gate` is a boolean condition signal whose transitions are entirely
//! explicit: nothing changes it but a caller of [`Gate::signal`] or
//! [`Gate::reset`]. Waiters block until it is signaled and are woken with a
//! broadcast, so there is no lost-wakeup window between a waiter deciding to
//! wait and actually registering on the condition variable — that decision
//! and the registration happen atomically under the same mutex hold.

use std::sync::{Condvar, Mutex};

/// A manual-reset event, robust against spurious and lost wakeups.
///
/// All state transitions happen under `inner`'s mutex, which gives every
/// thread's view of `signaled` a total order consistent with its own
/// program order. A poisoned mutex (a prior holder panicked while locked)
/// is treated as the unrecoverable programming error the design calls for:
/// every lock site panics rather than propagating a `PoisonError`.
#[derive(Debug, Default)]
pub struct Gate {
    inner: Mutex<bool>,
    cond: Condvar,
}

impl Gate {
    /// Creates a new, unsignaled gate.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    /// Sets the gate, waking every current and future waiter until the next
    /// [`Gate::reset`]. Idempotent.
    pub fn signal(&self) {
        let mut signaled = self.inner.lock().expect("gate mutex poisoned");
        *signaled = true;
        // Broadcast, not notify_one: an arbitrary number of threads may be
        // parked in `wait`, and every one of them must observe the set.
        self.cond.notify_all();
    }

    /// Clears the gate. Idempotent.
    pub fn reset(&self) {
        let mut signaled = self.inner.lock().expect("gate mutex poisoned");
        *signaled = false;
    }

    /// Blocks until the gate is signaled.
    ///
    /// Filters spurious wakeups with a `while` loop around the wait, so this
    /// never returns before an actual `signal` call set the flag.
    pub fn wait(&self) {
        let mut signaled = self.inner.lock().expect("gate mutex poisoned");
        while !*signaled {
            signaled = self.cond.wait(signaled).expect("gate mutex poisoned");
        }
    }

    /// Returns the current state without waiting.
    pub fn is_signaled(&self) -> bool {
        *self.inner.lock().expect("gate mutex poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::Gate;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn wait_returns_immediately_once_signaled() {
        let gate = Gate::new();
        gate.signal();
        gate.wait(); // must not block
    }

    #[test]
    fn reset_then_wait_blocks_until_signaled_again() {
        let gate = Arc::new(Gate::new());
        gate.signal();
        gate.wait();
        gate.reset();

        let waiter = Arc::clone(&gate);
        let handle = thread::spawn(move || {
            waiter.wait();
        });

        // Give the waiter thread a chance to actually park before signaling.
        thread::sleep(Duration::from_millis(20));
        assert!(!handle.is_finished());

        gate.signal();
        handle.join().expect("waiter thread panicked");
    }

    #[test]
    fn signal_is_idempotent() {
        let gate = Gate::new();
        gate.signal();
        gate.signal();
        assert!(gate.is_signaled());
    }

    #[test]
    fn concurrent_waiters_all_wake_on_one_signal() {
        let gate = Arc::new(Gate::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let g = Arc::clone(&gate);
                thread::spawn(move || g.wait())
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        gate.signal();

        for h in handles {
            h.join().expect("waiter thread panicked");
        }
    }
}

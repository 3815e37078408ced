//! Counting rendezvous used by the worker pools to hand rounds back and forth.

#[cfg(feature = "loom")]
pub(crate) use loom::sync::{Condvar, Mutex, MutexGuard};
#[cfg(not(feature = "loom"))]
pub(crate) use std::sync::{Condvar, Mutex, MutexGuard};

use std::sync::PoisonError;

/// A counter protected by a mutex whose changes are broadcast on a condition variable.
///
/// Workers announce themselves with [`Rendezvous::arrive_and_wait_for_release`] and block
/// until a coordinator that waited for all of them with
/// [`Rendezvous::await_count_then_reset`] sets the counter back to the release value.
pub struct Rendezvous {
    count: Mutex<usize>,
    changed: Condvar,
}

impl Rendezvous {
    pub fn new() -> Self {
        Rendezvous {
            count: Mutex::new(0),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_until<'a>(
        &self,
        mut count: MutexGuard<'a, usize>,
        condition: impl Fn(usize) -> bool,
    ) -> MutexGuard<'a, usize> {
        while !condition(*count) {
            count = self
                .changed
                .wait(count)
                .unwrap_or_else(PoisonError::into_inner);
        }

        count
    }

    /// Increments the counter and blocks until it equals `release_value`.
    pub fn arrive_and_wait_for_release(&self, release_value: usize) {
        let mut count = self.lock();
        *count += 1;
        self.changed.notify_all();
        let _count = self.wait_until(count, |count| count == release_value);
    }

    /// Blocks until `target` parties arrived, then resets the counter to 0 and wakes them.
    pub fn await_count_then_reset(&self, target: usize) {
        let count = self.lock();
        let mut count = self.wait_until(count, |count| count == target);
        *count = 0;
        self.changed.notify_all();
    }

    /// Blocks until `target` parties arrived and keeps the counter locked, so the caller
    /// can publish state the parties read once released.
    pub fn await_count_locked(&self, target: usize) -> RendezvousGuard<'_> {
        let count = self.lock();
        RendezvousGuard {
            count: self.wait_until(count, |count| count == target),
            changed: &self.changed,
        }
    }

    /// Returns the current counter value.
    pub fn count(&self) -> usize {
        *self.lock()
    }
}

impl Default for Rendezvous {
    fn default() -> Self {
        Rendezvous::new()
    }
}

/// Holds the lock of a [`Rendezvous`]; unlocks on drop.
pub struct RendezvousGuard<'a> {
    count: MutexGuard<'a, usize>,
    changed: &'a Condvar,
}

impl RendezvousGuard<'_> {
    /// Assigns the counter and wakes all waiting parties.
    /// They observe the new value once the guard is dropped.
    pub fn set(&mut self, value: usize) {
        *self.count = value;
        self.changed.notify_all();
    }

    pub fn get(&self) -> usize {
        *self.count
    }
}

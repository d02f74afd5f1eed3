//! Termination gate.
//!
//! The gate starts available. The first spawn of a session reserves it, the
//! policy engine releases it when the last runnable thread terminates with an
//! empty ready queue, and the shutdown drain consumes it. A drain against a
//! session that never spawned passes straight through.

use parking_lot::{Condvar, Mutex};

/// One-shot latch between the scheduler and the shutdown drain.
#[derive(Debug)]
pub struct TerminationGate {
    available: Mutex<bool>,
    cvar: Condvar,
}

impl Default for TerminationGate {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminationGate {
    /// Creates an available gate.
    #[must_use]
    pub fn new() -> Self {
        Self {
            available: Mutex::new(true),
            cvar: Condvar::new(),
        }
    }

    /// Takes the gate if it is available.
    ///
    /// Returns false if someone else (a drain in progress, or live work)
    /// already holds it.
    pub fn try_reserve(&self) -> bool {
        let mut available = self.available.lock();
        if *available {
            *available = false;
            true
        } else {
            false
        }
    }

    /// Makes the gate available again and wakes a waiting drain.
    pub fn release(&self) {
        let mut available = self.available.lock();
        debug_assert!(!*available, "termination gate released twice");
        *available = true;
        self.cvar.notify_one();
    }

    /// Blocks until the gate is available, then consumes it.
    pub fn wait(&self) {
        let mut available = self.available.lock();
        while !*available {
            self.cvar.wait(&mut available);
        }
        *available = false;
    }

    /// Returns true if the gate is currently available.
    #[must_use]
    pub fn is_available(&self) -> bool {
        *self.available.lock()
    }
}

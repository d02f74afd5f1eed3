//! Single-permit execution token.
//!
//! A [`Handshake`] starts closed. [`wait`](Handshake::wait) blocks the calling
//! OS thread until the token is opened by [`grant`](Handshake::grant), then
//! closes it again on the way out. A grant that lands before the wait is kept,
//! so the grant/wait pair cannot lose a wakeup regardless of which side gets
//! there first.

use parking_lot::{Condvar, Mutex};

/// Binary handshake gating whether one OS thread may proceed.
#[derive(Debug, Default)]
pub struct Handshake {
    open: Mutex<bool>,
    cvar: Condvar,
}

impl Handshake {
    /// Creates a closed token.
    #[must_use]
    pub fn closed() -> Self {
        Self::default()
    }

    /// Opens the token, waking the waiter if there is one.
    ///
    /// Granting an already open token is a no-op.
    pub fn grant(&self) {
        let mut open = self.open.lock();
        if !*open {
            *open = true;
            self.cvar.notify_one();
        }
    }

    /// Blocks until the token is open, then closes it.
    pub fn wait(&self) {
        let mut open = self.open.lock();
        while !*open {
            self.cvar.wait(&mut open);
        }
        *open = false;
    }

    /// Returns true if a grant is pending.
    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.open.lock()
    }
}

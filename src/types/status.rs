//! Logical thread lifecycle status.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a logical thread.
///
/// ```text
/// New -> Ready -> Running -> Terminated
///          ^        |  ^
///          |        v  |
///          +---- Blocked
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThreadStatus {
    /// Created, OS thread parked, not yet queued.
    New,
    /// Waiting in the ready queue.
    Ready,
    /// Holds the CPU token.
    Running,
    /// Waiting for a device to be signalled.
    Blocked,
    /// Handler returned (or panicked).
    Terminated,
}

impl ThreadStatus {
    /// Returns true if the thread can still run user code.
    #[must_use]
    pub const fn is_alive(self) -> bool {
        !matches!(self, Self::Terminated)
    }

    /// Returns true if losing the CPU is mandatory for this status.
    #[must_use]
    pub const fn must_yield(self) -> bool {
        matches!(self, Self::Blocked | Self::Terminated)
    }

    /// Short upper-case label used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Ready => "READY",
            Self::Running => "RUNNING",
            Self::Blocked => "BLOCKED",
            Self::Terminated => "TERMINATED",
        }
    }
}

impl fmt::Display for ThreadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

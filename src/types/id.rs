//! Logical thread identifiers.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Opaque handle for a logical thread.
///
/// Identifiers are dense: the n-th thread created in a session gets index
/// `n`. They are only meaningful within the session that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ThreadId(u32);

impl ThreadId {
    /// Sentinel returned by [`Scheduler::spawn_or_invalid`] when a spawn is
    /// rejected.
    ///
    /// [`Scheduler::spawn_or_invalid`]: crate::Scheduler::spawn_or_invalid
    pub const INVALID: Self = Self(u32::MAX);

    /// Creates an identifier from a raw registry index.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) const fn from_index(index: usize) -> Self {
        if index >= u32::MAX as usize {
            Self::INVALID
        } else {
            Self(index as u32)
        }
    }

    /// Returns the registry index of this thread.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns true unless this is [`ThreadId::INVALID`].
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "T{}", self.0)
        } else {
            f.write_str("T<invalid>")
        }
    }
}

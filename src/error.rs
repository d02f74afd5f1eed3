//! Error types and error handling strategy for lockstep.
//!
//! Error handling follows these principles:
//!
//! - Errors are explicit and typed (no stringly-typed errors)
//! - A rejected call never mutates scheduler state
//! - Resource failures the scheduler cannot recover from (OS thread
//!   creation) are fatal faults, not error values
//! - Handler panics are isolated and turned into thread termination
//!
//! # Error Categories
//!
//! - **Configuration**: bad quantum, bad device count, double init
//! - **Invalid argument**: out-of-range priority or device
//! - **Context**: the call was made against an uninitialised scheduler or
//!   from an OS thread that does not hold the CPU token
//!
//! There is no retry classification: scheduling decisions are deterministic,
//! so nothing here is transient.

use crate::types::DeviceId;

/// High-level error category for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Scheduler configuration was rejected.
    Configuration,
    /// A per-call argument was out of range.
    InvalidArgument,
    /// The call was made in the wrong scheduler or thread context.
    Context,
}

/// The error type for scheduler operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Error {
    /// `init` was called on a scheduler that is already active.
    #[error("scheduler already initialized")]
    AlreadyInitialized,

    /// The time quantum must be at least one tick.
    #[error("time quantum must be > 0")]
    ZeroQuantum,

    /// More devices were requested than the scheduler supports.
    #[error("device count {requested} exceeds maximum {max}")]
    TooManyDevices {
        /// Requested device count.
        requested: u32,
        /// Supported maximum.
        max: u32,
    },

    /// The scheduler has not been initialised (or was already drained).
    #[error("scheduler not initialized")]
    NotInitialized,

    /// Spawn priority above the supported maximum.
    #[error("priority {priority} out of range (max {max})")]
    PriorityOutOfRange {
        /// Requested priority.
        priority: u32,
        /// Highest valid priority.
        max: u32,
    },

    /// Device id outside `0..device_count`.
    #[error("device {device} out of range (device count {count})")]
    DeviceOutOfRange {
        /// Requested device.
        device: DeviceId,
        /// Configured device count.
        count: u32,
    },

    /// The calling OS thread is not the logical thread holding the CPU.
    #[error("operation requires the calling thread to be the running logical thread")]
    NotScheduled,

    /// A drain already consumed the termination gate for this session.
    #[error("scheduler is shutting down")]
    ShuttingDown,
}

impl Error {
    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::AlreadyInitialized | Self::ZeroQuantum | Self::TooManyDevices { .. } => {
                ErrorCategory::Configuration
            }
            Self::PriorityOutOfRange { .. } | Self::DeviceOutOfRange { .. } => {
                ErrorCategory::InvalidArgument
            }
            Self::NotInitialized | Self::NotScheduled | Self::ShuttingDown => {
                ErrorCategory::Context
            }
        }
    }

    /// Returns true for argument validation failures.
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self.category(), ErrorCategory::InvalidArgument)
    }

    /// Returns true for configuration failures.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self.category(), ErrorCategory::Configuration)
    }
}

/// A specialized Result type for scheduler operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        assert_eq!(Error::ZeroQuantum.category(), ErrorCategory::Configuration);
        assert_eq!(
            Error::TooManyDevices {
                requested: 300,
                max: 256
            }
            .category(),
            ErrorCategory::Configuration
        );
        assert!(Error::DeviceOutOfRange {
            device: 3,
            count: 1
        }
        .is_invalid_argument());
        assert!(Error::PriorityOutOfRange {
            priority: 9,
            max: 5
        }
        .is_invalid_argument());
        assert_eq!(Error::NotScheduled.category(), ErrorCategory::Context);
        assert!(!Error::NotInitialized.is_configuration());
    }

    #[test]
    fn display_includes_bounds() {
        let err = Error::DeviceOutOfRange {
            device: 4,
            count: 2,
        };
        assert_eq!(err.to_string(), "device 4 out of range (device count 2)");
        let err = Error::PriorityOutOfRange {
            priority: 6,
            max: 5,
        };
        assert_eq!(err.to_string(), "priority 6 out of range (max 5)");
    }
}

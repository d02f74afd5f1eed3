//! Core types for the lockstep scheduler.
//!
//! - [`id`]: Logical thread identifiers and the invalid sentinel
//! - [`status`]: Lifecycle status of a logical thread
//!
//! The bounds a caller validates against live here too, so the public
//! declaration surface is a single `use lockstep::types::*`.

pub mod id;
pub mod status;

pub use id::ThreadId;
pub use status::ThreadStatus;

/// Highest priority a logical thread may be spawned with (inclusive).
pub const MAX_PRIORITY: u32 = 5;

/// Upper bound on the number of devices a scheduler may be configured with.
pub const MAX_DEVICES: u32 = 256;

/// Identifier of a device/I/O event a logical thread may block on.
pub type DeviceId = u32;

//! Lockstep: a deterministic priority round-robin scheduler for logical
//! threads.
//!
//! Each logical thread is backed by a real OS thread, yet exactly one of them
//! executes user code at any instant. The scheduler passes a single CPU
//! baton between threads through per-thread handshake tokens, choosing the
//! next holder by fixed priority, a per-dispatch time quantum counted in
//! yield points, and device blocking.
//!
//! # Core Guarantees
//!
//! - **Single runner**: at most one logical thread holds the CPU token
//! - **Strict priority**: a ready thread with higher priority preempts the
//!   runner at the next scheduling point, whatever quantum is left
//! - **Round robin among equals**: an expired quantum rotates the runner
//!   behind a ready peer of equal priority, FIFO within the priority
//! - **No starvation of the runner by lower priorities**: an expired
//!   quantum is refilled when only lower priority threads are ready
//! - **Drain**: shutdown returns only after every handler has completed
//!
//! # Module Structure
//!
//! - [`types`]: thread ids, statuses, bounds
//! - [`config`]: session configuration and env overrides
//! - [`error`]: error types
//! - [`sync`]: handshake token and termination gate
//! - [`runtime`]: the scheduler, its policy engine and reports
//!
//! # Example
//!
//! ```ignore
//! use lockstep::Scheduler;
//!
//! let sched = Scheduler::new();
//! sched.init(2, 1)?;
//! let s = sched.clone();
//! sched.spawn(move |prio| {
//!     let s2 = s.clone();
//!     s.spawn(move |_| s2.yield_now(), prio).ok();
//!     s.yield_now();
//! }, 3)?;
//! let report = sched.drain_and_shutdown().expect("initialized");
//! assert_eq!(report.stats.spawned, 2);
//! ```

pub mod config;
pub mod error;
pub mod runtime;
pub mod sync;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::{ConfigError, SchedulerConfig};
pub use error::{Error, ErrorCategory, Result};
pub use runtime::{
    DispatchReason, DispatchRecord, Scheduler, SchedulerStats, SessionReport, ThreadSnapshot,
};
pub use types::{DeviceId, ThreadId, ThreadStatus, MAX_DEVICES, MAX_PRIORITY};

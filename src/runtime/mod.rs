//! Scheduler runtime.
//!
//! - [`scheduler`]: the [`Scheduler`] handle, lifecycle API, ready queue and
//!   policy engine
//! - [`report`]: statistics, dispatch log and session reports
//!
//! Thread records and the per-session state are internal.

pub mod report;
pub mod scheduler;
pub(crate) mod state;
pub(crate) mod thread;

pub use report::{DispatchReason, DispatchRecord, SchedulerStats, SessionReport, ThreadSnapshot};
pub use scheduler::Scheduler;

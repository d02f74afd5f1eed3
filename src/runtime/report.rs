//! Scheduler statistics and session reports.
//!
//! Everything here is plain data, serialisable so test harnesses can dump
//! it as an artifact.

use crate::types::{DeviceId, ThreadId, ThreadStatus};
use serde::{Deserialize, Serialize};

/// Counters for one scheduling session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Logical threads created.
    pub spawned: u64,
    /// Times the CPU token moved to a thread (including the first dispatch).
    pub dispatches: u64,
    /// Dispatches caused by a strictly higher priority thread.
    pub preemptions: u64,
    /// Dispatches caused by quantum expiry against an equal priority peer.
    pub rotations: u64,
    /// Quantum refills granted to a thread with no equal or higher peer.
    pub quantum_refills: u64,
    /// Calls to `block_on_device`.
    pub blocks: u64,
    /// Threads moved out of BLOCKED by `wake_device`.
    pub wakeups: u64,
    /// Handlers that panicked.
    pub panics: u64,
}

/// Why a thread was handed the CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DispatchReason {
    /// Nothing was running yet.
    Initial,
    /// The previous runner blocked or terminated.
    Handoff,
    /// A strictly higher priority thread was ready.
    Preempted,
    /// The previous runner's quantum expired with an equal priority peer ready.
    RoundRobin,
}

/// One entry in the dispatch log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRecord {
    /// Monotonic scheduling step at which the dispatch happened.
    pub step: u64,
    /// Thread that received the CPU.
    pub thread: ThreadId,
    /// Its priority.
    pub priority: u32,
    /// Why it was dispatched.
    pub reason: DispatchReason,
}

/// Point-in-time view of one logical thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSnapshot {
    /// Thread identifier.
    pub id: ThreadId,
    /// Lifecycle status.
    pub status: ThreadStatus,
    /// Fixed priority.
    pub priority: u32,
    /// Remaining quantum ticks.
    pub time_left: u32,
    /// Device the thread is blocked on, if any.
    pub device: Option<DeviceId>,
}

/// Summary returned by [`Scheduler::drain_and_shutdown`].
///
/// [`Scheduler::drain_and_shutdown`]: crate::Scheduler::drain_and_shutdown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Final counters.
    pub stats: SchedulerStats,
    /// Dispatch log (empty unless `record_dispatches` was enabled).
    pub dispatches: Vec<DispatchRecord>,
    /// Threads whose OS threads were joined, in registry order.
    pub joined: Vec<ThreadId>,
    /// Threads left BLOCKED with nobody able to wake them; their OS threads
    /// were detached.
    pub stranded: Vec<ThreadId>,
}

impl SessionReport {
    /// Returns the dispatched thread ids in order.
    #[must_use]
    pub fn dispatch_order(&self) -> Vec<ThreadId> {
        self.dispatches.iter().map(|d| d.thread).collect()
    }
}

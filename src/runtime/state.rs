//! Scheduler context for one session.
//!
//! [`SchedulerState`] is everything the baton holder may read or mutate:
//! the running thread, the ready queue, the registry of every thread created
//! in the session, and the termination gate. It lives behind the scheduler's
//! state mutex, but correctness comes from the baton: only the thread holding
//! the open token (or the policy engine acting on its behalf) touches it.

use crate::config::SchedulerConfig;
use crate::runtime::report::{DispatchReason, DispatchRecord, SchedulerStats, ThreadSnapshot};
use crate::runtime::scheduler::policy::Decision;
use crate::runtime::scheduler::ready_queue::ReadyQueue;
use crate::runtime::thread::ThreadRecord;
use crate::sync::TerminationGate;
use crate::types::{ThreadId, ThreadStatus};
use std::sync::Arc;

#[derive(Debug)]
pub(crate) struct SchedulerState {
    pub(crate) config: SchedulerConfig,
    pub(crate) epoch: u64,
    pub(crate) running: Option<ThreadId>,
    pub(crate) ready: ReadyQueue,
    pub(crate) registry: Vec<ThreadRecord>,
    pub(crate) gate: Arc<TerminationGate>,
    pub(crate) stats: SchedulerStats,
    pub(crate) dispatch_log: Vec<DispatchRecord>,
    /// Set once a drain is waiting on the gate.
    pub(crate) draining: bool,
    step: u64,
}

impl SchedulerState {
    pub(crate) fn new(config: SchedulerConfig, epoch: u64) -> Self {
        Self {
            config,
            epoch,
            running: None,
            ready: ReadyQueue::new(),
            registry: Vec::new(),
            gate: Arc::new(TerminationGate::new()),
            stats: SchedulerStats::default(),
            dispatch_log: Vec::new(),
            draining: false,
            step: 0,
        }
    }

    pub(crate) fn quantum(&self) -> u32 {
        self.config.quantum
    }

    pub(crate) fn record(&self, id: ThreadId) -> &ThreadRecord {
        &self.registry[id.index()]
    }

    pub(crate) fn record_mut(&mut self, id: ThreadId) -> &mut ThreadRecord {
        &mut self.registry[id.index()]
    }

    /// Adds a NEW record to the registry and returns its id.
    pub(crate) fn register(&mut self, priority: u32) -> ThreadId {
        let id = ThreadId::from_index(self.registry.len());
        self.registry
            .push(ThreadRecord::new(id, priority, self.config.quantum));
        self.stats.spawned += 1;
        id
    }

    /// Marks a thread READY and queues it.
    pub(crate) fn make_ready(&mut self, id: ThreadId) {
        let record = self.record_mut(id);
        record.status = ThreadStatus::Ready;
        let priority = record.priority;
        self.ready.enqueue(id, priority);
    }

    /// Hands the CPU to `id`: RUNNING, full quantum, becomes `running`.
    ///
    /// The caller must already have removed `id` from the ready queue.
    pub(crate) fn dispatch(&mut self, id: ThreadId, reason: DispatchReason) {
        debug_assert!(!self.ready.contains(id), "{id} dispatched while queued");
        let quantum = self.config.quantum;
        let record = self.record_mut(id);
        record.status = ThreadStatus::Running;
        record.time_left = quantum;
        let priority = record.priority;

        self.running = Some(id);
        self.stats.dispatches += 1;
        match reason {
            DispatchReason::Preempted => self.stats.preemptions += 1,
            DispatchReason::RoundRobin => self.stats.rotations += 1,
            DispatchReason::Initial | DispatchReason::Handoff => {}
        }
        let step = self.next_step();
        if self.config.record_dispatches {
            self.dispatch_log.push(DispatchRecord {
                step,
                thread: id,
                priority,
                reason,
            });
        }
        tracing::trace!(thread = %id, priority, ?reason, step, "dispatch");
    }

    /// Opens whatever the decision hands the CPU to.
    ///
    /// Runs under the state lock, so every mutation the decision made is
    /// visible before the woken thread can look.
    pub(crate) fn open(&self, decision: &Decision) {
        match *decision {
            Decision::Dispatch { next, .. } => self.record(next).token.grant(),
            Decision::Continue { current, .. } => self.record(current).token.grant(),
            Decision::Drained { .. } => self.gate.release(),
        }
    }

    /// Charges the running thread one quantum tick.
    pub(crate) fn charge_tick(&mut self) {
        if let Some(id) = self.running {
            let record = self.record_mut(id);
            record.time_left = record.time_left.saturating_sub(1);
        }
    }

    /// True when no logical thread can run: nothing dispatched yet, or the
    /// last runner terminated with an empty ready queue.
    pub(crate) fn is_idle(&self) -> bool {
        self.ready.is_empty()
            && self
                .running
                .map_or(true, |id| self.record(id).status == ThreadStatus::Terminated)
    }

    pub(crate) fn snapshot(&self) -> Vec<ThreadSnapshot> {
        self.registry.iter().map(ThreadRecord::snapshot).collect()
    }

    fn next_step(&mut self) -> u64 {
        let step = self.step;
        self.step += 1;
        step
    }
}

//! Scheduling policy engine.
//!
//! [`decide`] runs at every scheduling point (spawn, yield, block, wake,
//! completion). It looks at the running thread and the head of the ready
//! queue and picks one of:
//!
//! 1. Empty ready queue: the runner keeps the CPU; if it has terminated the
//!    session is drained and the termination gate opens.
//! 2. Nothing dispatched yet: dispatch the head.
//! 3. Runner blocked or terminated: dispatch the head.
//! 4. Head has strictly higher priority: requeue the runner, dispatch the head.
//! 5. Runner's quantum is spent and the head has equal priority: requeue the
//!    runner, dispatch the head.
//! 6. Runner's quantum is spent but the head has lower priority: refill the
//!    runner's quantum and keep it running.
//! 7. Otherwise the runner keeps the CPU.
//!
//! The head is only peeked unless it is dispatched, so a losing contender
//! keeps its exact place in the queue.

use crate::runtime::report::DispatchReason;
use crate::runtime::state::SchedulerState;
use crate::types::{ThreadId, ThreadStatus};

/// Outcome of one scheduling decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    /// The CPU moved to `next`.
    Dispatch {
        next: ThreadId,
        previous: Option<ThreadId>,
        reason: DispatchReason,
    },
    /// The runner keeps the CPU.
    Continue { current: ThreadId, refilled: bool },
    /// The runner terminated and nothing is ready.
    Drained { last: ThreadId },
}

/// Applies one scheduling decision to `state`.
///
/// All bookkeeping (queue moves, status, quantum) is done here; opening the
/// chosen token is left to [`SchedulerState::open`].
pub(crate) fn decide(state: &mut SchedulerState) -> Decision {
    let Some(current) = state.running else {
        let Some(next) = state.ready.pop_highest() else {
            unreachable!("scheduling point with no running thread and an empty ready queue");
        };
        state.dispatch(next, DispatchReason::Initial);
        return Decision::Dispatch {
            next,
            previous: None,
            reason: DispatchReason::Initial,
        };
    };

    let (status, priority, time_left) = {
        let record = state.record(current);
        (record.status, record.priority, record.time_left)
    };

    let Some((_, next_priority)) = state.ready.peek_highest() else {
        if status.is_alive() {
            return Decision::Continue {
                current,
                refilled: false,
            };
        }
        let stranded = state
            .registry
            .iter()
            .filter(|r| r.status == ThreadStatus::Blocked)
            .count();
        if stranded > 0 {
            tracing::warn!(last = %current, stranded, "last runnable thread finished with threads still blocked");
        } else {
            tracing::debug!(last = %current, "ready queue drained");
        }
        return Decision::Drained { last: current };
    };

    let reason = if status.must_yield() {
        DispatchReason::Handoff
    } else if priority < next_priority {
        DispatchReason::Preempted
    } else if time_left == 0 && priority == next_priority {
        DispatchReason::RoundRobin
    } else {
        let refilled = time_left == 0;
        if refilled {
            let quantum = state.quantum();
            state.record_mut(current).time_left = quantum;
            state.stats.quantum_refills += 1;
        }
        tracing::trace!(thread = %current, refilled, "continue");
        return Decision::Continue { current, refilled };
    };

    let Some(next) = state.ready.pop_highest() else {
        unreachable!("peeked ready queue became empty");
    };
    if reason != DispatchReason::Handoff {
        state.make_ready(current);
    }
    state.dispatch(next, reason);
    Decision::Dispatch {
        next,
        previous: Some(current),
        reason,
    }
}

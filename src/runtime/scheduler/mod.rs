//! Priority round-robin scheduler for logical threads.
//!
//! Every logical thread is backed by a real OS thread, but only one of them
//! runs user code at a time: each parks on its own [`Handshake`] and the
//! policy engine opens exactly one token per scheduling point. A thread gives
//! up the CPU only when it calls back into the scheduler (spawn, yield,
//! block, wake, or returning from its handler).
//!
//! ```ignore
//! use lockstep::Scheduler;
//!
//! let sched = Scheduler::new();
//! sched.init(2, 1)?;
//! let s = sched.clone();
//! sched.spawn(move |_prio| {
//!     s.yield_now();
//! }, 3)?;
//! let report = sched.drain_and_shutdown();
//! ```
//!
//! [`Handshake`]: crate::sync::Handshake

pub(crate) mod policy;
pub mod ready_queue;

pub use ready_queue::ReadyQueue;

use crate::config::SchedulerConfig;
use crate::error::{Error, Result};
use crate::runtime::report::{SchedulerStats, SessionReport, ThreadSnapshot};
use crate::runtime::state::SchedulerState;
use crate::runtime::thread::{self, current_marker, Handler, ThreadMarker};
use crate::types::{DeviceId, ThreadId, ThreadStatus, MAX_PRIORITY};
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<Option<SchedulerState>>,
    epochs: AtomicU64,
}

type StateGuard<'a> = MutexGuard<'a, Option<SchedulerState>>;

/// Handle to a scheduler context.
///
/// Cloning is cheap and every clone refers to the same context; handlers
/// capture a clone to call back into the lifecycle API. A context is
/// uninitialised until [`init`](Self::init), and returns to that state after
/// [`drain_and_shutdown`](Self::drain_and_shutdown).
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    shared: Arc<Shared>,
}

impl Scheduler {
    /// Creates an uninitialised scheduler context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session with the given quantum and device count.
    pub fn init(&self, quantum: u32, device_count: u32) -> Result<()> {
        self.init_with(SchedulerConfig::new(quantum, device_count))
    }

    /// Starts a session from a full configuration.
    ///
    /// Fails without touching the context if a session is already active or
    /// the configuration is out of bounds.
    pub fn init_with(&self, config: SchedulerConfig) -> Result<()> {
        let mut guard = self.shared.state.lock();
        if guard.is_some() {
            return Err(Error::AlreadyInitialized);
        }
        config.validate()?;

        let epoch = self.shared.epochs.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            epoch,
            quantum = config.quantum,
            device_count = config.device_count,
            "scheduler initialized"
        );
        *guard = Some(SchedulerState::new(config, epoch));
        Ok(())
    }

    /// Returns true while a session is active.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.shared.state.lock().is_some()
    }

    /// Creates a logical thread running `handler(priority)`.
    ///
    /// Called from the running logical thread, the new thread is queued and
    /// the caller then yields (paying one quantum tick), so a higher priority
    /// child runs immediately. Called from outside the scheduler, it is only
    /// allowed while the session is idle, and dispatches the new thread right
    /// away.
    pub fn spawn<F>(&self, handler: F, priority: u32) -> Result<ThreadId>
    where
        F: FnOnce(u32) + Send + 'static,
    {
        let mut guard = self.shared.state.lock();
        let state = guard.as_mut().ok_or(Error::NotInitialized)?;
        if priority > MAX_PRIORITY {
            return Err(Error::PriorityOutOfRange {
                priority,
                max: MAX_PRIORITY,
            });
        }

        let from_runner = match self.caller(state) {
            Some(id) if state.running == Some(id) => true,
            Some(_) => return Err(Error::NotScheduled),
            None => {
                if !state.is_idle() {
                    return Err(Error::NotScheduled);
                }
                // Reserve the gate so a drain waits for the work started here.
                if state.draining || !state.gate.try_reserve() {
                    return Err(Error::ShuttingDown);
                }
                false
            }
        };

        let id = state.register(priority);
        let join = self.start_os_thread(state, id, priority, Box::new(handler));
        state.record_mut(id).join = Some(join);
        state.make_ready(id);
        tracing::debug!(thread = %id, priority, from_runner, "spawned");

        if from_runner {
            Self::reschedule(guard);
        } else {
            let decision = policy::decide(state);
            state.open(&decision);
        }
        Ok(id)
    }

    /// Like [`spawn`](Self::spawn), but reports rejection as
    /// [`ThreadId::INVALID`].
    pub fn spawn_or_invalid<F>(&self, handler: F, priority: u32) -> ThreadId
    where
        F: FnOnce(u32) + Send + 'static,
    {
        self.spawn(handler, priority).unwrap_or_else(|err| {
            tracing::debug!(error = %err, priority, "spawn rejected");
            ThreadId::INVALID
        })
    }

    /// Gives the scheduler a chance to switch threads.
    ///
    /// Costs the caller one quantum tick. Outside a scheduled context this
    /// logs a warning and does nothing; use [`try_yield_now`](Self::try_yield_now)
    /// to observe that case.
    pub fn yield_now(&self) {
        if let Err(err) = self.try_yield_now() {
            tracing::warn!(error = %err, "yield outside a scheduled context ignored");
        }
    }

    /// Like [`yield_now`](Self::yield_now), but reports misuse.
    pub fn try_yield_now(&self) -> Result<()> {
        let guard = self.shared.state.lock();
        let state = guard.as_ref().ok_or(Error::NotInitialized)?;
        self.require_running(state)?;
        Self::reschedule(guard);
        Ok(())
    }

    /// Blocks the calling thread until `device` is signalled.
    ///
    /// Blocking costs a quantum tick and hands the CPU to the next ready
    /// thread. If nothing else is ready the caller keeps running (still
    /// marked BLOCKED) until a peer becomes runnable.
    pub fn block_on_device(&self, device: DeviceId) -> Result<()> {
        let mut guard = self.shared.state.lock();
        let state = guard.as_mut().ok_or(Error::NotInitialized)?;
        check_device(state, device)?;
        let id = self.require_running(state)?;

        let record = state.record_mut(id);
        record.status = ThreadStatus::Blocked;
        record.device = Some(device);
        state.stats.blocks += 1;
        tracing::debug!(thread = %id, device, "blocked on device");

        Self::reschedule(guard);
        Ok(())
    }

    /// Makes every thread blocked on `device` ready again, then yields.
    ///
    /// Returns the number of threads woken.
    pub fn wake_device(&self, device: DeviceId) -> Result<usize> {
        let mut guard = self.shared.state.lock();
        let state = guard.as_mut().ok_or(Error::NotInitialized)?;
        check_device(state, device)?;
        let caller = self.require_running(state)?;

        let mut woken = 0;
        for index in 0..state.registry.len() {
            let record = &mut state.registry[index];
            if record.status != ThreadStatus::Blocked || record.device != Some(device) {
                continue;
            }
            record.device = None;
            woken += 1;
            let id = record.id;
            if id == caller {
                // Still holding the CPU: the pending block is simply cancelled.
                record.status = ThreadStatus::Running;
            } else {
                state.make_ready(id);
            }
        }
        state.stats.wakeups += woken as u64;
        tracing::debug!(thread = %caller, device, woken, "device signalled");

        Self::reschedule(guard);
        Ok(woken)
    }

    /// Waits for every logical thread to finish, joins their OS threads, and
    /// resets the context so it can be initialised again.
    ///
    /// Returns `None` if no session is active. Must be called from outside
    /// the scheduler; a call from a logical thread is ignored.
    pub fn drain_and_shutdown(&self) -> Option<SessionReport> {
        let gate = {
            let mut guard = self.shared.state.lock();
            let state = guard.as_mut()?;
            if self.caller(state).is_some() {
                tracing::warn!("drain requested from a scheduled thread; ignored");
                return None;
            }
            if state.draining {
                tracing::warn!("drain already in progress; ignored");
                return None;
            }
            state.draining = true;
            Arc::clone(&state.gate)
        };

        tracing::debug!("waiting for termination gate");
        gate.wait();

        let state = self.shared.state.lock().take()?;
        let SchedulerState {
            registry,
            stats,
            dispatch_log,
            epoch,
            ..
        } = state;

        let mut report = SessionReport {
            stats,
            dispatches: dispatch_log,
            ..SessionReport::default()
        };
        for record in registry {
            match record.join {
                Some(handle) if record.status == ThreadStatus::Terminated => {
                    if handle.join().is_err() {
                        tracing::warn!(thread = %record.id, "backing thread exited abnormally");
                    }
                    report.joined.push(record.id);
                }
                // Dropping the handle detaches a thread nobody can wake.
                _ => {
                    tracing::warn!(
                        thread = %record.id,
                        status = %record.status,
                        device = ?record.device,
                        "thread stranded at shutdown; detaching"
                    );
                    report.stranded.push(record.id);
                }
            }
        }

        tracing::debug!(
            epoch,
            joined = report.joined.len(),
            stranded = report.stranded.len(),
            "scheduler drained"
        );
        Some(report)
    }

    /// Returns the logical thread backed by the calling OS thread, if it
    /// belongs to this scheduler's active session.
    #[must_use]
    pub fn current(&self) -> Option<ThreadId> {
        let guard = self.shared.state.lock();
        guard.as_ref().and_then(|state| self.caller(state))
    }

    /// Returns the thread currently holding the CPU.
    #[must_use]
    pub fn running(&self) -> Option<ThreadId> {
        self.shared.state.lock().as_ref().and_then(|s| s.running)
    }

    /// Returns a snapshot of every thread in the active session.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ThreadSnapshot> {
        self.shared
            .state
            .lock()
            .as_ref()
            .map(SchedulerState::snapshot)
            .unwrap_or_default()
    }

    /// Returns the number of threads in the ready queue.
    #[must_use]
    pub fn ready_len(&self) -> usize {
        self.shared.state.lock().as_ref().map_or(0, |s| s.ready.len())
    }

    /// Returns the live counters of the active session.
    #[must_use]
    pub fn stats(&self) -> Option<SchedulerStats> {
        self.shared.state.lock().as_ref().map(|s| s.stats)
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.shared) as usize
    }

    /// Logical thread backed by the caller, if it belongs to `state`.
    fn caller(&self, state: &SchedulerState) -> Option<ThreadId> {
        let marker = current_marker()?;
        (marker.scheduler == self.addr() && marker.epoch == state.epoch).then_some(marker.thread)
    }

    fn require_running(&self, state: &SchedulerState) -> Result<ThreadId> {
        match self.caller(state) {
            Some(id) if state.running == Some(id) => Ok(id),
            _ => Err(Error::NotScheduled),
        }
    }

    /// Charges the running thread a tick, runs the policy engine, and parks
    /// the caller on its token until it is granted the CPU again.
    fn reschedule(mut guard: StateGuard<'_>) {
        let Some(state) = guard.as_mut() else {
            return;
        };
        let Some(current) = state.running else {
            unreachable!("reschedule without a running thread");
        };
        let token = Arc::clone(&state.record(current).token);

        state.charge_tick();
        let decision = policy::decide(state);
        state.open(&decision);
        drop(guard);

        token.wait();
    }

    /// Handler-completion path; never parks.
    fn complete(&self, marker: ThreadMarker, panicked: bool) {
        let mut guard = self.shared.state.lock();
        let Some(state) = guard.as_mut().filter(|s| s.epoch == marker.epoch) else {
            return;
        };
        debug_assert_eq!(state.running, Some(marker.thread));

        let record = state.record_mut(marker.thread);
        record.status = ThreadStatus::Terminated;
        record.device = None;
        if panicked {
            state.stats.panics += 1;
        }
        tracing::trace!(thread = %marker.thread, panicked, "terminated");

        let decision = policy::decide(state);
        state.open(&decision);
    }

    fn start_os_thread(
        &self,
        state: &SchedulerState,
        id: ThreadId,
        priority: u32,
        handler: Handler,
    ) -> std::thread::JoinHandle<()> {
        let marker = ThreadMarker {
            scheduler: self.addr(),
            epoch: state.epoch,
            thread: id,
        };
        let token = Arc::clone(&state.record(id).token);
        let scheduler = self.clone();

        let mut builder = std::thread::Builder::new().name(format!(
            "{}-{}",
            state.config.thread_name_prefix,
            id.index()
        ));
        if let Some(size) = state.config.thread_stack_size {
            builder = builder.stack_size(size);
        }

        let spawned = builder.spawn(move || {
            thread::run_thread(marker, priority, &token, handler, |panicked| {
                scheduler.complete(marker, panicked);
            });
        });
        match spawned {
            Ok(handle) => handle,
            Err(err) => thread::fatal("failed to create backing OS thread", &err),
        }
    }
}

fn check_device(state: &SchedulerState, device: DeviceId) -> Result<()> {
    let count = state.config.device_count;
    if device < count {
        Ok(())
    } else {
        Err(Error::DeviceOutOfRange { device, count })
    }
}

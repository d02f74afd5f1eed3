//! Logical thread records and their backing OS threads.
//!
//! Every logical thread owns one OS thread. The OS thread parks on the
//! record's [`Handshake`] before running anything, so a freshly created
//! thread cannot run until the policy engine dispatches it.

use crate::runtime::report::ThreadSnapshot;
use crate::sync::Handshake;
use crate::types::{DeviceId, ThreadId, ThreadStatus};
use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;

/// User entry point, called once with the thread's priority.
pub(crate) type Handler = Box<dyn FnOnce(u32) + Send + 'static>;

/// Per-thread scheduler bookkeeping.
pub(crate) struct ThreadRecord {
    pub(crate) id: ThreadId,
    pub(crate) status: ThreadStatus,
    pub(crate) time_left: u32,
    pub(crate) priority: u32,
    pub(crate) device: Option<DeviceId>,
    pub(crate) token: Arc<Handshake>,
    pub(crate) join: Option<JoinHandle<()>>,
}

impl fmt::Debug for ThreadRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadRecord")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("time_left", &self.time_left)
            .field("priority", &self.priority)
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

impl ThreadRecord {
    /// Creates a NEW record with a full quantum and a closed token.
    pub(crate) fn new(id: ThreadId, priority: u32, quantum: u32) -> Self {
        Self {
            id,
            status: ThreadStatus::New,
            time_left: quantum,
            priority,
            device: None,
            token: Arc::new(Handshake::closed()),
            join: None,
        }
    }

    pub(crate) fn snapshot(&self) -> ThreadSnapshot {
        ThreadSnapshot {
            id: self.id,
            status: self.status,
            priority: self.priority,
            time_left: self.time_left,
            device: self.device,
        }
    }
}

/// Identity of the logical thread the current OS thread backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ThreadMarker {
    /// Address of the owning scheduler's shared state.
    pub(crate) scheduler: usize,
    /// Session the thread was spawned in.
    pub(crate) epoch: u64,
    pub(crate) thread: ThreadId,
}

thread_local! {
    static CURRENT: Cell<Option<ThreadMarker>> = const { Cell::new(None) };
}

/// Returns the marker of the calling OS thread, if it backs a logical thread.
pub(crate) fn current_marker() -> Option<ThreadMarker> {
    CURRENT.with(Cell::get)
}

struct MarkerGuard;

impl MarkerGuard {
    fn set(marker: ThreadMarker) -> Self {
        CURRENT.with(|c| c.set(Some(marker)));
        Self
    }
}

impl Drop for MarkerGuard {
    fn drop(&mut self) {
        CURRENT.with(|c| c.set(None));
    }
}

/// Body of a backing OS thread.
///
/// Waits for the first dispatch, runs the handler, and always reports
/// completion so the baton keeps moving even if the handler panics.
pub(crate) fn run_thread(
    marker: ThreadMarker,
    priority: u32,
    token: &Handshake,
    handler: Handler,
    complete: impl FnOnce(bool),
) {
    let _marker = MarkerGuard::set(marker);
    token.wait();

    let panicked = panic::catch_unwind(AssertUnwindSafe(|| handler(priority))).is_err();
    if panicked {
        tracing::warn!(thread = %marker.thread, priority, "handler panicked; thread terminated");
    }
    complete(panicked);
}

/// Reports an unrecoverable resource failure and aborts the process.
pub(crate) fn fatal(what: &str, err: &dyn fmt::Display) -> ! {
    tracing::error!(error = %err, "{what}: fatal scheduler fault");
    std::process::abort()
}

//! Blocking primitives that carry the CPU baton between OS threads.
//!
//! # Primitives
//!
//! - [`Handshake`]: single-permit execution token, one per logical thread
//! - [`TerminationGate`]: latch the shutdown drain blocks on
//!
//! Both are plain OS-level blocking primitives (`parking_lot` mutex +
//! condvar). Neither knows about scheduler state; the policy engine decides
//! when to open them.

mod gate;
mod handshake;

pub use gate::TerminationGate;
pub use handshake::Handshake;

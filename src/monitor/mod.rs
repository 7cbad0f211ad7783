//! The monitor core.
//!
//! This module implements the mutually-exclusive section at the heart of Claustra.
//! A [`Monitor`] tracks whether the section is occupied, which [`OwnerToken`]
//! currently proves occupancy, and two FIFO queues of suspended requesters:
//!
//! - the **entry queue**, holding tasks waiting to enter for the first time, and
//! - the **reacquisition queue**, holding tasks that released the section to wait
//!   on a condition variable and have since been cleared to take it back.
//!
//! Whenever the section is released, the reacquisition queue is always served
//! before the entry queue. This is the property that keeps condition-based
//! coordination alive under contention: a task resuming from a wait is never
//! starved by a stream of fresh entrants.
//!
//! ## Design notes
//!
//! - Ownership is a capability, not an identity. There is no ambient notion of a
//!   "current task"; the only proof of occupancy is the exact token returned by
//!   [`Monitor::enter`] or [`Monitor::try_enter`].
//! - Tasks that cannot immediately enter are suspended and woken when the section
//!   is handed to them. The handoff is direct: the section never observably
//!   becomes free while a queued task exists, so no newcomer can barge past the
//!   queues.
//! - Monitors are safe to share between tasks using `Arc`.

mod core;
mod enter;
mod error;
mod token;

pub use self::core::Monitor;
pub use enter::Enter;
pub use error::MonitorError;
pub use token::OwnerToken;

pub(crate) use enter::{Reacquire, Waiter};

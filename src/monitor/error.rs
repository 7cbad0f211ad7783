use std::error::Error;
use std::fmt;

/// Errors reported by monitor and condition-variable operations.
///
/// These errors are never recovered internally; they propagate synchronously to
/// the caller of the violating operation. They are fatal to that call only: the
/// monitor's section state and queues remain valid for subsequent callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorError {
    /// The presented token does not match the current owner, or the section is
    /// not occupied at all.
    ///
    /// Raised by [`Monitor::exit`](crate::Monitor::exit) on a stale or foreign
    /// token, and by condition-variable operations invoked without holding the
    /// bound section.
    NotOwner,

    /// A primitive was invoked outside its intended call site.
    ///
    /// Reserved for future precondition violations; not raised by the current
    /// public surface.
    Misuse,
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::NotOwner => write!(f, "caller does not hold the monitor section"),
            MonitorError::Misuse => write!(f, "monitor primitive used outside its intended call site"),
        }
    }
}

impl Error for MonitorError {}

use crate::cond::Cond;
use crate::monitor::Waiter;
use crate::timer::{Sleep, sleep};

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::Mutex as Mutex_std;
use std::task::{Context, Poll};
use std::time::Duration;

/// Lifecycle of a suspended waiter record.
///
/// A record leaves `Waiting` exactly once: claimed by a signal or broadcast,
/// claimed by its own timeout, or abandoned when the waiting future is
/// dropped. The single transition is what makes the signal/timeout race safe;
/// whichever event claims the record first wins and the other finds it
/// already resolved.
enum Phase {
    Waiting,
    Signaled,
    TimedOut,
    Abandoned,
}

/// A suspended waiter on a condition variable.
///
/// Shared between the condition's queue and the wait future. The embedded
/// node doubles as the waiter's reacquisition request: it is pushed onto the
/// monitor's reacquisition queue the moment the record is claimed, so a
/// signaled waiter outranks first-time entrants even before its task has run
/// again.
pub(super) struct WaitRecord {
    node: Arc<Waiter>,
    phase: Mutex_std<Phase>,
}

impl WaitRecord {
    pub(super) fn new(resume_depth: u32) -> WaitRecord {
        Self {
            node: Arc::new(Waiter::new(resume_depth)),
            phase: Mutex_std::new(Phase::Waiting),
        }
    }

    pub(super) fn node(&self) -> &Arc<Waiter> {
        &self.node
    }

    /// `Waiting` → `Signaled`; `false` if the record was already resolved.
    pub(super) fn claim_signaled(&self) -> bool {
        let mut phase = self.phase.lock().unwrap();
        match *phase {
            Phase::Waiting => {
                *phase = Phase::Signaled;
                true
            }
            _ => false,
        }
    }

    /// `Waiting` → `TimedOut`; `false` if the record was already resolved.
    fn claim_timed_out(&self) -> bool {
        let mut phase = self.phase.lock().unwrap();
        match *phase {
            Phase::Waiting => {
                *phase = Phase::TimedOut;
                true
            }
            _ => false,
        }
    }

    /// `Waiting` → `Abandoned`; `false` if the record was already resolved.
    fn abandon(&self) -> bool {
        let mut phase = self.phase.lock().unwrap();
        match *phase {
            Phase::Waiting => {
                *phase = Phase::Abandoned;
                true
            }
            _ => false,
        }
    }

    fn is_signaled(&self) -> bool {
        matches!(*self.phase.lock().unwrap(), Phase::Signaled)
    }
}

/// Future for the suspension half of a condition wait.
///
/// Resolves to `true` when a signal or broadcast claims the record, `false`
/// when the optional timer elapses first. The section is *not* held while
/// this future is pending; reacquisition happens afterwards.
pub(super) struct SignalWait<'a> {
    cond: &'a Cond,
    record: Arc<WaitRecord>,
    sleep: Option<Sleep>,
    done: bool,
}

impl<'a> SignalWait<'a> {
    pub(super) fn new(cond: &'a Cond, record: Arc<WaitRecord>, timeout: Option<Duration>) -> Self {
        Self {
            cond,
            record,
            sleep: timeout.map(sleep),
            done: false,
        }
    }
}

impl Future for SignalWait<'_> {
    type Output = bool;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if this.done {
            panic!("SignalWait polled after completion");
        }

        // Register before inspecting the phase so a claim arriving in between
        // still has a waker to notify.
        this.record.node().set_waker(cx.waker());

        if this.record.is_signaled() {
            this.done = true;
            return Poll::Ready(true);
        }

        if let Some(timer) = this.sleep.as_mut() {
            if Pin::new(timer).poll(cx).is_ready() {
                if this.record.claim_timed_out() {
                    this.cond.remove(&this.record);
                    this.done = true;

                    if let Some(waker) = this
                        .cond
                        .monitor
                        .enqueue_reacquire(this.record.node().clone())
                    {
                        waker.wake();
                    }

                    return Poll::Ready(false);
                }

                // a signal claimed the record after the check above
                this.done = true;
                return Poll::Ready(true);
            }
        }

        Poll::Pending
    }
}

impl Drop for SignalWait<'_> {
    /// Detaches the record if the wait is dropped before resolving.
    ///
    /// If a signal already claimed the record, its reacquisition node is live
    /// on the monitor and has to be withdrawn instead.
    fn drop(&mut self) {
        if self.done {
            return;
        }

        if self.record.abandon() {
            self.cond.remove(&self.record);
        } else if self.record.is_signaled() {
            self.cond.monitor.abandon(self.record.node());
        }
    }
}

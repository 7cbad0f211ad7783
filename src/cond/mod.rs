//! Condition variables.
//!
//! A [`Cond`] is bound to one [`Monitor`] and lets the current owner of that
//! monitor's section suspend until another owner signals a state change.
//! Waiting releases the section, parks the task on the condition's own FIFO
//! queue, and — once signaled or timed out — reclaims the section through the
//! monitor's reacquisition queue, ahead of any first-time entrant.
//!
//! The current operations are:
//! - [`Cond::wait`] / [`Cond::wait_timeout`] — a single suspension,
//! - [`Cond::wait_while`] / [`Cond::wait_until`] and their `_timeout` variants
//!   — predicate loops re-evaluated under the re-acquired section,
//! - [`Cond::signal`] — wakes the longest-waiting task,
//! - [`Cond::broadcast`] — wakes every currently waiting task.
//!
//! ## Design notes
//!
//! - Signals are never stored: signaling with no waiters queued is a no-op.
//! - A waiter's timeout and an incoming signal race; whichever claims the
//!   waiter record first wins, and the record's removal makes the loser inert.
//! - Every operation requires the caller to hold the bound section and fails
//!   with [`MonitorError::NotOwner`] otherwise.

mod wait;

use crate::monitor::{Monitor, MonitorError, OwnerToken, Reacquire};
use wait::{SignalWait, WaitRecord};

use log::trace;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex as Mutex_std;
use std::time::{Duration, Instant};

/// A condition variable bound to one [`Monitor`].
///
/// Created through [`Monitor::new_cond`]; remains valid for the monitor's
/// lifetime. The queue of suspended waiters is transient, shrinking to empty
/// whenever all current waiters have been resumed.
pub struct Cond {
    monitor: Arc<Monitor>,

    /// Suspended waiter records, FIFO by arrival.
    waiters: Mutex_std<VecDeque<Arc<WaitRecord>>>,
}

impl Cond {
    pub(crate) fn new(monitor: Arc<Monitor>) -> Cond {
        Self {
            monitor,
            waiters: Mutex_std::new(VecDeque::new()),
        }
    }

    /// Releases the section and suspends until signaled.
    ///
    /// On resumption the section has been re-acquired and `token` has been
    /// replaced with the fresh token proving the new occupancy; the token's
    /// reentrancy depth is carried over from before the wait.
    ///
    /// The wait is unbounded: a task that is never signaled stays suspended.
    pub async fn wait(&self, token: &mut OwnerToken) -> Result<(), MonitorError> {
        self.wait_inner(token, None).await.map(|_| ())
    }

    /// Like [`Cond::wait`], but gives up once `timeout` has elapsed without a
    /// signal claiming the waiter.
    ///
    /// Returns `true` if the wait was ended by a signal, `false` on timeout.
    /// Either way the section has been re-acquired when the call returns.
    pub async fn wait_timeout(
        &self,
        token: &mut OwnerToken,
        timeout: Duration,
    ) -> Result<bool, MonitorError> {
        self.wait_inner(token, Some(timeout)).await
    }

    /// Waits as long as `predicate` returns `true`.
    ///
    /// The predicate is re-evaluated under the re-acquired section after every
    /// resumption, so spurious signals simply loop back into waiting.
    pub async fn wait_while<P>(
        &self,
        token: &mut OwnerToken,
        mut predicate: P,
    ) -> Result<(), MonitorError>
    where
        P: FnMut() -> bool,
    {
        self.monitor.check_owner(token)?;

        while predicate() {
            self.wait_inner(token, None).await?;
        }

        Ok(())
    }

    /// Like [`Cond::wait_while`], bounded by one overall deadline.
    ///
    /// `timeout` governs the whole call: each inner wait receives the
    /// remaining budget, so time spent across iterations is not forgotten.
    /// Returns `true` as soon as the predicate becomes false, `false` if the
    /// deadline is reached while it still holds.
    pub async fn wait_while_timeout<P>(
        &self,
        token: &mut OwnerToken,
        mut predicate: P,
        timeout: Duration,
    ) -> Result<bool, MonitorError>
    where
        P: FnMut() -> bool,
    {
        self.monitor.check_owner(token)?;

        let deadline = Instant::now() + timeout;

        loop {
            if !predicate() {
                return Ok(true);
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }

            self.wait_inner(token, Some(deadline - now)).await?;
        }
    }

    /// Waits until `predicate` returns `true`.
    ///
    /// Equivalent to [`Cond::wait_while`] with the predicate's sense inverted.
    pub async fn wait_until<P>(
        &self,
        token: &mut OwnerToken,
        mut predicate: P,
    ) -> Result<(), MonitorError>
    where
        P: FnMut() -> bool,
    {
        self.wait_while(token, move || !predicate()).await
    }

    /// Like [`Cond::wait_until`], bounded by one overall deadline.
    ///
    /// Returns `true` once the predicate holds, `false` on deadline.
    pub async fn wait_until_timeout<P>(
        &self,
        token: &mut OwnerToken,
        mut predicate: P,
        timeout: Duration,
    ) -> Result<bool, MonitorError>
    where
        P: FnMut() -> bool,
    {
        self.wait_while_timeout(token, move || !predicate(), timeout)
            .await
    }

    /// Wakes the longest-waiting task, if any.
    ///
    /// The claimed waiter moves straight onto the monitor's reacquisition
    /// queue, so it regains the section before any first-time entrant once the
    /// caller releases it. Signaling with no waiters queued is a no-op;
    /// signals are never stored for future waiters.
    pub fn signal(&self) -> Result<(), MonitorError> {
        self.ensure_held()?;

        if let Some(record) = self.claim_next() {
            trace!("waiter signaled, queued for reacquisition");
            if let Some(waker) = self.monitor.enqueue_reacquire(record.node().clone()) {
                waker.wake();
            }
        }

        Ok(())
    }

    /// Wakes every currently waiting task, in FIFO order.
    ///
    /// Each waiter still reclaims the section one at a time through the
    /// reacquisition queue.
    pub fn broadcast(&self) -> Result<(), MonitorError> {
        self.ensure_held()?;

        let mut woken = 0usize;
        while let Some(record) = self.claim_next() {
            if let Some(waker) = self.monitor.enqueue_reacquire(record.node().clone()) {
                waker.wake();
            }
            woken += 1;
        }

        if woken > 0 {
            trace!("broadcast woke {} waiter(s)", woken);
        }

        Ok(())
    }

    async fn wait_inner(
        &self,
        token: &mut OwnerToken,
        timeout: Option<Duration>,
    ) -> Result<bool, MonitorError> {
        self.monitor.check_owner(token)?;

        // Queue the record before releasing the section so a signal issued by
        // the next owner cannot slip past this waiter.
        let record = Arc::new(WaitRecord::new(token.depth()));
        self.waiters.lock().unwrap().push_back(record.clone());

        if let Err(err) = self.monitor.release_for_wait(token) {
            self.remove(&record);
            return Err(err);
        }

        let signaled = SignalWait::new(self, record.clone(), timeout).await;
        *token = Reacquire::new(&self.monitor, record.node().clone()).await;

        Ok(signaled)
    }

    fn ensure_held(&self) -> Result<(), MonitorError> {
        if self.monitor.locked() {
            Ok(())
        } else {
            Err(MonitorError::NotOwner)
        }
    }

    /// Pops the longest-waiting record still live and marks it signaled.
    fn claim_next(&self) -> Option<Arc<WaitRecord>> {
        let mut waiters = self.waiters.lock().unwrap();
        while let Some(record) = waiters.pop_front() {
            if record.claim_signaled() {
                return Some(record);
            }
        }

        None
    }

    /// Physically removes a record that resolved without being popped.
    fn remove(&self, record: &Arc<WaitRecord>) {
        self.waiters
            .lock()
            .unwrap()
            .retain(|r| !Arc::ptr_eq(r, record));
    }
}

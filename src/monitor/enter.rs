use crate::monitor::Monitor;
use crate::monitor::token::OwnerToken;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::Mutex as Mutex_std;
use std::task::{Context, Poll, Waker};

/// A suspended requester queued on one of the monitor's admission queues.
///
/// The node is shared between the queue and the future that created it. The
/// wakeup scheduler resolves it by storing a freshly minted token into the
/// grant slot and waking the registered waker; the future observes the grant on
/// its next poll.
pub(crate) struct Waiter {
    /// Depth to restore into the token minted when this node is granted.
    ///
    /// First-time entries always use 1; reacquisition entries carry the depth
    /// captured when the section was released for a condition wait.
    resume_depth: u32,

    inner: Mutex_std<WaiterInner>,
}

struct WaiterInner {
    /// Waker for the task suspended on this node.
    waker: Option<Waker>,

    /// Token deposited by the wakeup scheduler once the section is handed to
    /// this node.
    grant: Option<OwnerToken>,

    /// Set when the owning future is dropped; the scheduler skips the node.
    cancelled: bool,
}

impl Waiter {
    pub(crate) fn new(resume_depth: u32) -> Waiter {
        Self {
            resume_depth,
            inner: Mutex_std::new(WaiterInner {
                waker: None,
                grant: None,
                cancelled: false,
            }),
        }
    }

    pub(crate) fn resume_depth(&self) -> u32 {
        self.resume_depth
    }

    /// Registers `waker` without consuming a pending grant.
    pub(crate) fn set_waker(&self, waker: &Waker) {
        self.inner.lock().unwrap().waker = Some(waker.clone());
    }

    /// Takes the granted token if the scheduler has deposited one, otherwise
    /// registers `waker` to be notified when it does.
    pub(crate) fn try_take_grant(&self, waker: &Waker) -> Option<OwnerToken> {
        let mut inner = self.inner.lock().unwrap();
        match inner.grant.take() {
            Some(token) => Some(token),
            None => {
                inner.waker = Some(waker.clone());
                None
            }
        }
    }

    /// Deposits a granted token and returns the waker to notify, if any.
    ///
    /// Returns `Err` with the token when the node was cancelled after being
    /// popped, so the caller can pass the grant on.
    pub(crate) fn deposit(&self, token: OwnerToken) -> Result<Option<Waker>, OwnerToken> {
        let mut inner = self.inner.lock().unwrap();
        if inner.cancelled {
            return Err(token);
        }

        inner.grant = Some(token);
        Ok(inner.waker.take())
    }

    /// Marks the node cancelled and recovers an unobserved grant, if any.
    pub(crate) fn cancel(&self) -> Option<OwnerToken> {
        let mut inner = self.inner.lock().unwrap();
        inner.cancelled = true;
        inner.waker = None;
        inner.grant.take()
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.inner.lock().unwrap().cancelled
    }
}

/// Future returned by [`Monitor::enter`].
///
/// Resolves to a freshly minted [`OwnerToken`] once the section is granted.
/// If the section is free on first poll the future resolves immediately;
/// otherwise the task is appended to the entry queue and suspended until the
/// wakeup scheduler hands the section to it.
///
/// Dropping the future while queued withdraws the request. If the grant raced
/// with the drop, the section is passed on to the next queued task instead of
/// leaking.
pub struct Enter<'a> {
    monitor: &'a Monitor,
    node: Option<Arc<Waiter>>,
    done: bool,
}

impl<'a> Enter<'a> {
    pub(crate) fn new(monitor: &'a Monitor) -> Enter<'a> {
        Self {
            monitor,
            node: None,
            done: false,
        }
    }
}

impl<'a> Future for Enter<'a> {
    type Output = OwnerToken;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if this.done {
            panic!("Enter polled after completion");
        }

        match &this.node {
            None => match this.monitor.grant_or_enqueue(cx.waker()) {
                Ok(token) => {
                    this.done = true;
                    Poll::Ready(token)
                }
                Err(node) => {
                    this.node = Some(node);
                    Poll::Pending
                }
            },
            Some(node) => match node.try_take_grant(cx.waker()) {
                Some(token) => {
                    this.done = true;
                    this.node = None;
                    Poll::Ready(token)
                }
                None => Poll::Pending,
            },
        }
    }
}

impl<'a> Drop for Enter<'a> {
    /// Withdraws the request if the future is dropped before the grant was
    /// observed.
    fn drop(&mut self) {
        if let Some(node) = self.node.take() {
            self.monitor.abandon(&node);
        }
    }
}

/// Future resolving a post-wait reacquisition.
///
/// The node has already been placed on the reacquisition queue (or granted
/// outright) by the time this future exists; polling only observes the grant.
pub(crate) struct Reacquire<'a> {
    monitor: &'a Monitor,
    node: Arc<Waiter>,
    done: bool,
}

impl<'a> Reacquire<'a> {
    pub(crate) fn new(monitor: &'a Monitor, node: Arc<Waiter>) -> Reacquire<'a> {
        Self {
            monitor,
            node,
            done: false,
        }
    }
}

impl<'a> Future for Reacquire<'a> {
    type Output = OwnerToken;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if this.done {
            panic!("Reacquire polled after completion");
        }

        match this.node.try_take_grant(cx.waker()) {
            Some(token) => {
                this.done = true;
                Poll::Ready(token)
            }
            None => Poll::Pending,
        }
    }
}

impl<'a> Drop for Reacquire<'a> {
    fn drop(&mut self) {
        if !self.done {
            self.monitor.abandon(&self.node);
        }
    }
}

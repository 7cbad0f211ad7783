use crate::cond::Cond;
use crate::monitor::enter::{Enter, Waiter};
use crate::monitor::error::MonitorError;
use crate::monitor::token::OwnerToken;

use log::{debug, trace};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex as Mutex_std;
use std::task::Waker;

/// A mutually-exclusive section with token-proven ownership.
///
/// `Monitor` guarantees that at most one task occupies the section at a time.
/// Entering mints an [`OwnerToken`]; the section can only be released by
/// presenting that token back. Tasks blocked on entry are granted the section
/// in arrival order, except that tasks reclaiming the section after a
/// condition wait always go first.
///
/// All state lives behind an internal blocking `Mutex`. The critical sections
/// it guards are short queue manipulations, so the primitive stays sound even
/// when tasks are scheduled across threads.
pub struct Monitor {
    state: Mutex_std<State>,
}

struct State {
    /// Identity of the token currently proving occupancy.
    ///
    /// `None` means the section is free. By construction both queues are empty
    /// whenever it is: every release hands the section directly to the next
    /// queued task, so a free section implies nobody is waiting.
    current: Option<u64>,

    /// First-time entry requests, FIFO by arrival.
    entry_queue: VecDeque<Arc<Waiter>>,

    /// Post-wait reacquisition requests, FIFO by arrival, always served before
    /// the entry queue.
    reacquire_queue: VecDeque<Arc<Waiter>>,
}

impl Monitor {
    /// Creates a monitor with a free section and empty queues.
    pub fn new() -> Monitor {
        Self {
            state: Mutex_std::new(State {
                current: None,
                entry_queue: VecDeque::new(),
                reacquire_queue: VecDeque::new(),
            }),
        }
    }

    /// Requests exclusive occupancy of the section.
    ///
    /// Resolves to a freshly minted [`OwnerToken`] once the section is granted.
    /// If the section is free the future resolves on its first poll without
    /// suspending; otherwise the task queues behind earlier entrants.
    ///
    /// Never fails, but may suspend indefinitely if the current owner never
    /// releases the section; avoiding deadlock is the caller's responsibility.
    pub fn enter(&self) -> Enter<'_> {
        Enter::new(self)
    }

    /// Non-suspending probe for the section.
    ///
    /// Returns a token if the section was free, `None` if it is occupied.
    /// The queues are untouched either way.
    pub fn try_enter(&self) -> Option<OwnerToken> {
        let mut state = self.state.lock().unwrap();
        if state.current.is_some() {
            return None;
        }

        let token = state.occupy(1);
        trace!("section granted to owner {} by probe", token.id());
        Some(token)
    }

    /// Releases the section.
    ///
    /// The presented token must be the one currently proving occupancy.
    /// Otherwise — including when the section is not occupied at all — the call
    /// fails with [`MonitorError::NotOwner`] and the monitor state is left
    /// unchanged.
    ///
    /// On success the section is handed to the longest-waiting reacquisition
    /// request if one exists, then to the longest-waiting entry request, and
    /// otherwise becomes free. The token, and every token minted before it,
    /// is invalid from this point on.
    pub fn exit(&self, token: &OwnerToken) -> Result<(), MonitorError> {
        let waker = {
            let mut state = self.state.lock().unwrap();
            if !state.is_current(token) {
                debug!("exit rejected: token {} does not prove occupancy", token.id());
                return Err(MonitorError::NotOwner);
            }

            trace!("owner {} exits the section", token.id());
            state.release()
        };

        if let Some(waker) = waker {
            waker.wake();
        }

        Ok(())
    }

    /// Returns whether the section is currently occupied.
    pub fn locked(&self) -> bool {
        self.state.lock().unwrap().current.is_some()
    }

    /// Returns whether `token` currently proves occupancy of the section.
    ///
    /// There is no ambient notion of a "current task", so ownership can only be
    /// asserted by presenting the token received from [`Monitor::enter`] or
    /// [`Monitor::try_enter`]; passing `None` therefore always returns `false`.
    pub fn owned(&self, token: Option<&OwnerToken>) -> bool {
        match token {
            Some(token) => self.state.lock().unwrap().is_current(token),
            None => false,
        }
    }

    /// Creates a condition variable bound to this monitor.
    pub fn new_cond(self: &Arc<Self>) -> Cond {
        Cond::new(self.clone())
    }

    /// Runs `f` inside the section, releasing it on every exit path.
    ///
    /// The section is entered before `f` starts and exited after it completes,
    /// with `f`'s output propagated unchanged. The token handed to `f` is
    /// mutable so condition waits inside the closure keep it current. An
    /// internal guard also releases the section if `f` panics or the returned
    /// future is dropped mid-await.
    ///
    /// The final release can itself fail with [`MonitorError::NotOwner`] if `f`
    /// exited the section manually; that error is propagated rather than
    /// swallowed.
    pub async fn with<F, R>(&self, f: F) -> Result<R, MonitorError>
    where
        F: AsyncFnOnce(&mut OwnerToken) -> R,
    {
        let token = self.enter().await;
        let mut guard = SectionGuard {
            monitor: self,
            token: Some(token),
        };

        let out = f(guard.token.as_mut().unwrap()).await;

        let token = guard.token.take().unwrap();
        self.exit(&token)?;
        Ok(out)
    }

    /// Fast path for [`Enter`]: grants a free section immediately, otherwise
    /// queues a waiter node registered with `waker`.
    pub(super) fn grant_or_enqueue(&self, waker: &Waker) -> Result<OwnerToken, Arc<Waiter>> {
        let mut state = self.state.lock().unwrap();
        if state.current.is_none() {
            let token = state.occupy(1);
            trace!("section granted to owner {} on entry", token.id());
            return Ok(token);
        }

        let node = Arc::new(Waiter::new(1));
        node.set_waker(waker);
        state.entry_queue.push_back(node.clone());
        Err(node)
    }

    /// Withdraws a queued waiter node whose future was dropped.
    ///
    /// If the node was already granted, the section is handed onward instead of
    /// staying occupied by a token nobody holds.
    pub(crate) fn abandon(&self, node: &Arc<Waiter>) {
        let waker = {
            let mut state = self.state.lock().unwrap();
            match node.cancel() {
                Some(token) => {
                    trace!("grant to owner {} abandoned, handing the section on", token.id());
                    if state.is_current(&token) {
                        state.release()
                    } else {
                        None
                    }
                }
                None => {
                    state.entry_queue.retain(|w| !Arc::ptr_eq(w, node));
                    state.reacquire_queue.retain(|w| !Arc::ptr_eq(w, node));
                    None
                }
            }
        };

        if let Some(waker) = waker {
            waker.wake();
        }
    }

    /// Checks that `token` currently proves occupancy.
    pub(crate) fn check_owner(&self, token: &OwnerToken) -> Result<(), MonitorError> {
        if self.state.lock().unwrap().is_current(token) {
            Ok(())
        } else {
            Err(MonitorError::NotOwner)
        }
    }

    /// Releases the section on behalf of a condition wait.
    ///
    /// The caller keeps its waiter record; the depth to restore travels inside
    /// the record's reacquisition node.
    pub(crate) fn release_for_wait(&self, token: &OwnerToken) -> Result<(), MonitorError> {
        let waker = {
            let mut state = self.state.lock().unwrap();
            if !state.is_current(token) {
                debug!(
                    "wait rejected: token {} does not prove occupancy",
                    token.id()
                );
                return Err(MonitorError::NotOwner);
            }

            trace!("owner {} releases the section to wait", token.id());
            state.release()
        };

        if let Some(waker) = waker {
            waker.wake();
        }

        Ok(())
    }

    /// Queues `node` for post-wait reacquisition.
    ///
    /// A free section is granted on the spot (both queues are empty whenever
    /// the section is free, so nobody is skipped). Returns the waker to notify
    /// when the grant happened immediately.
    pub(crate) fn enqueue_reacquire(&self, node: Arc<Waiter>) -> Option<Waker> {
        let mut state = self.state.lock().unwrap();
        if state.current.is_none() {
            let token = OwnerToken::mint(node.resume_depth());
            let id = token.id();
            match node.deposit(token) {
                Ok(waker) => {
                    trace!("section granted to owner {} on reacquisition", id);
                    state.current = Some(id);
                    return waker;
                }
                Err(_) => return None,
            }
        }

        state.reacquire_queue.push_back(node);
        None
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    fn is_current(&self, token: &OwnerToken) -> bool {
        self.current == Some(token.id())
    }

    /// Mints a token and marks the section occupied by it.
    fn occupy(&mut self, depth: u32) -> OwnerToken {
        let token = OwnerToken::mint(depth);
        self.current = Some(token.id());
        token
    }

    /// Clears occupancy and runs the wakeup scheduler.
    fn release(&mut self) -> Option<Waker> {
        self.current = None;
        self.wake_next()
    }

    /// Hands the section to the next queued task, if any.
    ///
    /// Reacquisition requests always win over first-time entries; within each
    /// queue the longest-waiting request goes first. Cancelled nodes are
    /// skipped.
    fn wake_next(&mut self) -> Option<Waker> {
        loop {
            let node = match self.reacquire_queue.pop_front() {
                Some(node) => node,
                None => match self.entry_queue.pop_front() {
                    Some(node) => node,
                    None => return None,
                },
            };

            if node.is_cancelled() {
                continue;
            }

            let token = OwnerToken::mint(node.resume_depth());
            let id = token.id();
            match node.deposit(token) {
                Ok(waker) => {
                    trace!("section handed off to owner {}", id);
                    self.current = Some(id);
                    return waker;
                }
                Err(_) => continue,
            }
        }
    }
}

/// Releases the section when dropped, unless disarmed first.
///
/// Backs [`Monitor::with`]: covers the panic and cancellation paths, while the
/// normal path takes the token out and exits explicitly so the result of that
/// exit is observable.
struct SectionGuard<'a> {
    monitor: &'a Monitor,
    token: Option<OwnerToken>,
}

impl Drop for SectionGuard<'_> {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            let _ = self.monitor.exit(&token);
        }
    }
}

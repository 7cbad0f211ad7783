//! Deadline timers.
//!
//! The monitor needs exactly one timed event: ending a condition wait whose
//! timeout elapsed before any signal arrived. Since the crate is
//! runtime-agnostic, it cannot lean on a host reactor for this; instead a
//! single lazily-started driver thread owns a priority queue of deadlines,
//! sleeps until the nearest one, and wakes the registered task wakers as they
//! come due.
//!
//! The thread is started on the first timed wait and lives for the rest of
//! the process. Timers are cancelled by flag rather than removal: a dropped
//! [`Sleep`] marks its entry, and the driver discards marked entries when
//! they surface at the top of the queue.

mod entry;
mod sleep;

pub(crate) use sleep::{Sleep, sleep};

use entry::TimerEntry;

use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::sync::{Arc, OnceLock};
use std::task::Waker;
use std::thread;
use std::time::Instant;

/// Commands accepted by the timer driver thread.
enum Command {
    Register {
        deadline: Instant,
        waker: Waker,
        cancelled: Arc<AtomicBool>,
    },
}

static DRIVER: OnceLock<Sender<Command>> = OnceLock::new();

/// Registers a wake-up at `deadline`, starting the driver thread on first use.
pub(super) fn register(deadline: Instant, waker: Waker, cancelled: Arc<AtomicBool>) {
    let sender = DRIVER.get_or_init(|| {
        let (sender, receiver) = channel();

        thread::Builder::new()
            .name("claustra-timer".into())
            .spawn(move || Driver::new(receiver).run())
            .expect("failed to spawn the timer driver thread");

        sender
    });

    // The driver owns the receiver for the life of the process, so this only
    // fails if the driver thread died; the timer is lost either way.
    let _ = sender.send(Command::Register {
        deadline,
        waker,
        cancelled,
    });
}

/// The timer driver loop: sleep until the nearest deadline, fire what is due,
/// fold in newly registered timers.
struct Driver {
    receiver: Receiver<Command>,
    timers: BinaryHeap<TimerEntry>,
}

impl Driver {
    fn new(receiver: Receiver<Command>) -> Driver {
        Self {
            receiver,
            timers: BinaryHeap::new(),
        }
    }

    fn run(mut self) {
        loop {
            let now = Instant::now();
            while let Some(timer) = self.timers.peek() {
                if timer.deadline > now {
                    break;
                }

                let timer = self.timers.pop().unwrap();

                if timer.cancelled.load(Ordering::Acquire) {
                    continue;
                }

                timer.waker.wake();
            }

            let command = match self.timers.peek() {
                Some(timer) => {
                    let wait = timer.deadline.saturating_duration_since(Instant::now());
                    match self.receiver.recv_timeout(wait) {
                        Ok(command) => Some(command),
                        Err(RecvTimeoutError::Timeout) => None,
                        Err(RecvTimeoutError::Disconnected) => return,
                    }
                }
                None => match self.receiver.recv() {
                    Ok(command) => Some(command),
                    Err(_) => return,
                },
            };

            if let Some(Command::Register {
                deadline,
                waker,
                cancelled,
            }) = command
            {
                self.timers.push(TimerEntry {
                    deadline,
                    waker,
                    cancelled,
                });
            }
        }
    }
}

use crate::timer;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// Creates a future that completes after the given duration.
pub(crate) fn sleep(duration: Duration) -> Sleep {
    Sleep::new(duration)
}

/// A future that completes once a specific deadline is reached.
///
/// `Sleep` registers with the timer driver on first poll. The future is
/// **cancel-safe**: dropping it marks the registration cancelled, so no
/// spurious wake-up reaches the task afterwards.
pub(crate) struct Sleep {
    /// Absolute point in time when the sleep completes.
    deadline: Instant,

    /// Whether the deadline has already been registered with the driver.
    registered: bool,

    /// Cancellation flag shared with the driver.
    cancelled: Arc<AtomicBool>,
}

impl Sleep {
    fn new(duration: Duration) -> Sleep {
        Self {
            deadline: Instant::now() + duration,
            registered: false,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Future for Sleep {
    type Output = ();

    /// Completes once the deadline has passed, registering the wake-up on the
    /// first poll that observes an unexpired deadline.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if Instant::now() >= this.deadline {
            return Poll::Ready(());
        }

        if !this.registered {
            this.registered = true;
            timer::register(this.deadline, cx.waker().clone(), this.cancelled.clone());
        }

        Poll::Pending
    }
}

impl Drop for Sleep {
    /// Cancels the pending wake-up if the future is dropped before completion.
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

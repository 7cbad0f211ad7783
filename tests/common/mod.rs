use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Installs the test logger; later calls are no-ops.
#[allow(dead_code)]
pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A future that yields execution back to the executor exactly once.
struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if !self.0 {
            self.0 = true;
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }

        Poll::Ready(())
    }
}

/// Yields execution back to the executor, allowing other tasks to make
/// progress before the current one continues.
#[allow(dead_code)]
pub async fn yield_now() {
    YieldOnce(false).await
}

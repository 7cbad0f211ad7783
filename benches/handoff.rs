use claustra::Monitor;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use futures::executor::block_on;
use futures::task::noop_waker;
use std::future::Future;
use std::task::{Context, Poll};

fn uncontended(c: &mut Criterion) {
    let monitor = Monitor::new();

    c.bench_function("try_enter_exit", |b| {
        b.iter(|| {
            let token = monitor.try_enter().unwrap();
            monitor.exit(black_box(&token)).unwrap();
        })
    });

    c.bench_function("enter_exit", |b| {
        b.iter(|| {
            let token = block_on(monitor.enter());
            monitor.exit(black_box(&token)).unwrap();
        })
    });
}

fn contended(c: &mut Criterion) {
    let monitor = Monitor::new();
    let waker = noop_waker();

    // one queued entrant: measures the pop, mint, and deposit path
    c.bench_function("queued_handoff", |b| {
        b.iter(|| {
            let holder = monitor.try_enter().unwrap();

            let mut entrant = Box::pin(monitor.enter());
            let mut cx = Context::from_waker(&waker);
            assert!(entrant.as_mut().poll(&mut cx).is_pending());

            monitor.exit(&holder).unwrap();

            match entrant.as_mut().poll(&mut cx) {
                Poll::Ready(token) => monitor.exit(&token).unwrap(),
                Poll::Pending => unreachable!(),
            }
        })
    });
}

criterion_group!(benches, uncontended, contended);
criterion_main!(benches);

mod common;

use claustra::{Monitor, MonitorError};
use common::{init_logs, yield_now};
use futures::executor::{LocalPool, block_on};
use futures::task::{LocalSpawnExt, noop_waker};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

#[test]
fn critical_sections_never_interleave() {
    init_logs();

    let mut pool = LocalPool::new();
    let spawner = pool.spawner();

    let monitor = Arc::new(Monitor::new());
    let trace: Rc<RefCell<Vec<(char, u8)>>> = Rc::new(RefCell::new(Vec::new()));

    for name in ['a', 'b'] {
        let monitor = monitor.clone();
        let trace = trace.clone();
        spawner
            .spawn_local(async move {
                monitor
                    .with(async |_token| {
                        trace.borrow_mut().push((name, 1));
                        yield_now().await;
                        yield_now().await;
                        trace.borrow_mut().push((name, 2));
                    })
                    .await
                    .unwrap();
            })
            .unwrap();
    }

    pool.run();

    let trace = trace.borrow();
    assert!(
        *trace == [('a', 1), ('a', 2), ('b', 1), ('b', 2)]
            || *trace == [('b', 1), ('b', 2), ('a', 1), ('a', 2)],
        "sections interleaved: {trace:?}"
    );
}

#[test]
fn no_lost_updates_across_tasks() {
    init_logs();

    let mut pool = LocalPool::new();
    let spawner = pool.spawner();

    let monitor = Arc::new(Monitor::new());
    let counter = Rc::new(Cell::new(0usize));

    for _ in 0..10 {
        let monitor = monitor.clone();
        let counter = counter.clone();
        spawner
            .spawn_local(async move {
                monitor
                    .with(async |_token| {
                        let read = counter.get();
                        yield_now().await;
                        counter.set(read + 1);
                    })
                    .await
                    .unwrap();
            })
            .unwrap();
    }

    pool.run();
    assert_eq!(counter.get(), 10);
}

#[test]
fn entry_queue_is_fifo() {
    init_logs();

    let mut pool = LocalPool::new();
    let spawner = pool.spawner();

    let monitor = Arc::new(Monitor::new());
    let order: Rc<RefCell<Vec<usize>>> = Rc::new(RefCell::new(Vec::new()));

    let holder = monitor.try_enter().unwrap();

    for i in 0..3 {
        let monitor = monitor.clone();
        let order = order.clone();
        spawner
            .spawn_local(async move {
                let token = monitor.enter().await;
                order.borrow_mut().push(i);
                monitor.exit(&token).unwrap();
            })
            .unwrap();
    }

    pool.run_until_stalled();
    assert!(order.borrow().is_empty());

    monitor.exit(&holder).unwrap();
    pool.run();

    assert_eq!(*order.borrow(), [0, 1, 2]);
}

#[test]
fn probe_reflects_occupancy() {
    let monitor = Monitor::new();
    assert!(!monitor.locked());

    let token = monitor.try_enter().unwrap();
    assert!(monitor.locked());
    assert!(monitor.owned(Some(&token)));
    assert!(!monitor.owned(None));
    assert!(monitor.try_enter().is_none());

    monitor.exit(&token).unwrap();
    assert!(!monitor.locked());
    assert!(!monitor.owned(Some(&token)));
}

#[test]
fn exit_rejects_stale_and_foreign_tokens() {
    let monitor = Monitor::new();

    let first = monitor.try_enter().unwrap();
    monitor.exit(&first).unwrap();

    // no occupancy at all
    assert_eq!(monitor.exit(&first), Err(MonitorError::NotOwner));
    assert!(!monitor.locked());

    let second = monitor.try_enter().unwrap();

    // token from an earlier acquisition
    assert_eq!(monitor.exit(&first), Err(MonitorError::NotOwner));
    assert!(monitor.locked());
    assert!(monitor.owned(Some(&second)));

    // token minted by a different monitor
    let other = Monitor::new();
    let foreign = other.try_enter().unwrap();
    assert_eq!(monitor.exit(&foreign), Err(MonitorError::NotOwner));
    assert!(monitor.owned(Some(&second)));

    monitor.exit(&second).unwrap();
}

#[test]
fn abandoned_entry_is_skipped() {
    let monitor = Monitor::new();
    let holder = monitor.try_enter().unwrap();

    let waker = noop_waker();
    let mut cx = Context::from_waker(&waker);

    let mut first = Box::pin(monitor.enter());
    assert!(first.as_mut().poll(&mut cx).is_pending());

    let mut second = Box::pin(monitor.enter());
    assert!(second.as_mut().poll(&mut cx).is_pending());

    drop(first);

    monitor.exit(&holder).unwrap();

    match second.as_mut().poll(&mut cx) {
        Poll::Ready(token) => monitor.exit(&token).unwrap(),
        Poll::Pending => panic!("second entrant should have been granted"),
    }
}

#[test]
fn scoped_section_returns_value() {
    let monitor = Arc::new(Monitor::new());

    let out = block_on(monitor.with(async |_token| 7)).unwrap();
    assert_eq!(out, 7);
    assert!(!monitor.locked());
}

#[test]
fn scoped_section_released_on_panic() {
    let monitor = Arc::new(Monitor::new());

    let result = catch_unwind(AssertUnwindSafe(|| {
        block_on(monitor.with(async |_token| {
            panic!("boom");
        }))
    }));

    assert!(result.is_err());
    assert!(!monitor.locked());

    let token = monitor.try_enter().unwrap();
    monitor.exit(&token).unwrap();
}

#[test]
fn cancelled_scoped_section_is_released() {
    let monitor = Arc::new(Monitor::new());

    let waker = noop_waker();
    let mut cx = Context::from_waker(&waker);

    let inner = monitor.clone();
    let mut fut = Box::pin(async move {
        inner
            .with(async |_token| {
                std::future::pending::<()>().await;
            })
            .await
            .unwrap();
    });

    assert!(fut.as_mut().poll(&mut cx).is_pending());
    assert!(monitor.locked());

    drop(fut);
    assert!(!monitor.locked());
}

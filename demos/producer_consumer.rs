use claustra::Monitor;
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

const CAPACITY: usize = 5;
const ITEMS: u32 = 10;

fn main() {
    env_logger::init();

    let mut pool = LocalPool::new();
    let spawner = pool.spawner();

    let monitor = Arc::new(Monitor::new());
    let not_full = Arc::new(monitor.new_cond());
    let not_empty = Arc::new(monitor.new_cond());
    let buffer: Rc<RefCell<VecDeque<u32>>> = Rc::new(RefCell::new(VecDeque::new()));

    {
        let monitor = monitor.clone();
        let not_full = not_full.clone();
        let not_empty = not_empty.clone();
        let buffer = buffer.clone();
        spawner
            .spawn_local(async move {
                for item in 1..=ITEMS {
                    monitor
                        .with(async |token| {
                            not_full
                                .wait_while(token, || buffer.borrow().len() >= CAPACITY)
                                .await
                                .unwrap();
                            buffer.borrow_mut().push_back(item);
                            println!("produced {item}");
                            not_empty.signal().unwrap();
                        })
                        .await
                        .unwrap();
                }
            })
            .unwrap();
    }

    {
        let monitor = monitor.clone();
        let not_full = not_full.clone();
        let not_empty = not_empty.clone();
        let buffer = buffer.clone();
        spawner
            .spawn_local(async move {
                for _ in 0..ITEMS {
                    monitor
                        .with(async |token| {
                            not_empty
                                .wait_while(token, || buffer.borrow().is_empty())
                                .await
                                .unwrap();
                            let item = buffer.borrow_mut().pop_front().unwrap();
                            println!("consumed {item}");
                            not_full.signal().unwrap();
                        })
                        .await
                        .unwrap();
                }
            })
            .unwrap();
    }

    pool.run();
}

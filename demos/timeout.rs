use claustra::Monitor;
use futures::executor::block_on;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn main() {
    env_logger::init();

    let monitor = Arc::new(Monitor::new());
    let cond = monitor.new_cond();

    block_on(async {
        let mut token = monitor.enter().await;

        let started = Instant::now();
        let signaled = cond
            .wait_timeout(&mut token, Duration::from_millis(200))
            .await
            .unwrap();
        println!("signaled: {signaled}, waited {:?}", started.elapsed());

        monitor.exit(&token).unwrap();
    });
}

use claustra::{Monitor, MonitorError, OwnerToken};
use proptest::prelude::*;

/// Operations on the non-suspending surface of the monitor.
#[derive(Debug, Clone)]
enum Op {
    TryEnter,
    Exit,
    ExitStale,
    Probe,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::TryEnter),
        Just(Op::Exit),
        Just(Op::ExitStale),
        Just(Op::Probe),
    ]
}

proptest! {
    /// Any sequence of probes, entries, and exits keeps the occupancy state
    /// machine honest: the section is locked exactly while a live token
    /// exists, stale tokens never prove ownership, and rejected exits leave
    /// the state untouched.
    #[test]
    fn occupancy_state_machine(ops in proptest::collection::vec(op_strategy(), 1..64)) {
        let monitor = Monitor::new();
        let mut live: Option<OwnerToken> = None;
        let mut stale: Vec<OwnerToken> = Vec::new();

        for op in ops {
            match op {
                Op::TryEnter => match monitor.try_enter() {
                    Some(token) => {
                        prop_assert!(live.is_none());
                        live = Some(token);
                    }
                    None => prop_assert!(live.is_some()),
                },
                Op::Exit => {
                    if let Some(token) = live.take() {
                        prop_assert_eq!(monitor.exit(&token), Ok(()));
                        stale.push(token);
                    }
                }
                Op::ExitStale => {
                    if let Some(token) = stale.last() {
                        prop_assert_eq!(monitor.exit(token), Err(MonitorError::NotOwner));
                    }
                }
                Op::Probe => {
                    prop_assert_eq!(monitor.locked(), live.is_some());
                    prop_assert!(!monitor.owned(None));
                    prop_assert_eq!(monitor.owned(live.as_ref()), live.is_some());
                    for token in &stale {
                        prop_assert!(!monitor.owned(Some(token)));
                    }
                }
            }
        }
    }
}

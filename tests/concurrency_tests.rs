//! Concurrency safety tests
//!
//! Serialization order between operations that share an account is decided by
//! lock-acquisition races, so these tests assert safety properties and sets of
//! valid final states, never one particular interleaving.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_ledger_engine::{Dispatcher, Executor, Ledger, Operation, OutcomeStatus};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

fn ledger_with(balances: &[(&str, i64)]) -> Arc<Ledger> {
    let (ledger, errors) = Ledger::from_balances(
        balances
            .iter()
            .map(|(id, balance)| (id.to_string(), Decimal::new(*balance, 0))),
    );
    assert!(errors.is_empty());
    Arc::new(ledger)
}

fn dispatcher_for(ledger: &Arc<Ledger>, workers: usize) -> Dispatcher {
    Dispatcher::new(Executor::new(Arc::clone(ledger)), workers).expect("worker pool")
}

/// Run `f` on another thread and fail the test if it has not finished in time
fn must_finish_within<T, F>(limit: Duration, f: F) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(f());
    });
    rx.recv_timeout(limit)
        .expect("operations did not complete: possible deadlock")
}

/// Every ordering of `0..n`
fn permutations(n: usize) -> Vec<Vec<usize>> {
    if n == 0 {
        return vec![vec![]];
    }
    let mut result = Vec::new();
    for rest in permutations(n - 1) {
        for position in 0..=rest.len() {
            let mut order = rest.clone();
            order.insert(position, n - 1);
            result.push(order);
        }
    }
    result
}

#[test]
fn test_example_scenario_reaches_a_valid_final_state() {
    let opening = [("A1", 500), ("A2", 200), ("A3", 1000)];
    let operations = vec![
        Operation::transfer("A1", "A2", Decimal::new(100, 0)),
        Operation::deposit("A1", Decimal::new(50, 0)),
        Operation::withdraw("A2", Decimal::new(30, 0)),
        Operation::transfer("A2", "A3", Decimal::new(200, 0)),
    ];

    // Every serial order is a possible serialization of the concurrent run
    let valid_states: HashSet<Vec<(String, Decimal)>> = permutations(operations.len())
        .into_iter()
        .map(|order| {
            let executor = Executor::new(ledger_with(&opening));
            for index in order {
                executor.execute(&operations[index]);
            }
            executor.ledger().snapshot().unwrap()
        })
        .collect();

    let all_applied = vec![
        ("A1".to_string(), Decimal::new(450, 0)),
        ("A2".to_string(), Decimal::new(70, 0)),
        ("A3".to_string(), Decimal::new(1200, 0)),
    ];
    assert!(valid_states.contains(&all_applied));
    assert!(valid_states.len() > 1);

    for _ in 0..50 {
        let ledger = ledger_with(&opening);
        let outcomes = dispatcher_for(&ledger, 4)
            .submit(operations.clone())
            .unwrap();

        assert_eq!(outcomes.len(), operations.len());
        let final_state = ledger.snapshot().unwrap();
        assert!(
            valid_states.contains(&final_state),
            "unexpected final state {:?}",
            final_state
        );
    }
}

#[test]
fn test_no_lost_update_with_concurrent_deposits() {
    let ledger = ledger_with(&[("hot", 250)]);
    let dispatcher = dispatcher_for(&ledger, 8);
    let n = 2000;

    let operations = (0..n)
        .map(|_| Operation::deposit("hot", Decimal::new(3, 0)))
        .collect();

    let outcomes = dispatcher.submit(operations).unwrap();

    assert!(outcomes.iter().all(|o| o.status.is_applied()));
    assert_eq!(
        ledger.lookup("hot").unwrap().balance().unwrap(),
        Decimal::new(250 + 3 * n as i64, 0)
    );
}

#[test]
fn test_no_lost_update_with_raw_threads() {
    let ledger = ledger_with(&[("hot", 0)]);
    let executor = Executor::new(Arc::clone(&ledger));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let executor = executor.clone();
            thread::spawn(move || {
                for _ in 0..250 {
                    assert!(executor
                        .execute(&Operation::deposit("hot", Decimal::ONE))
                        .is_applied());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(ledger.total_balance().unwrap(), Decimal::new(4000, 0));
}

#[test]
fn test_opposite_direction_transfers_never_deadlock() {
    let ledger = ledger_with(&[("A", 1_000_000), ("B", 1_000_000)]);
    let dispatcher_ledger = Arc::clone(&ledger);

    let outcomes = must_finish_within(Duration::from_secs(60), move || {
        let dispatcher = dispatcher_for(&dispatcher_ledger, 8);
        let operations = (0..5000)
            .map(|i| {
                if i % 2 == 0 {
                    Operation::transfer("A", "B", Decimal::new(i % 7 + 1, 0))
                } else {
                    Operation::transfer("B", "A", Decimal::new(i % 5 + 1, 0))
                }
            })
            .collect();
        dispatcher.submit(operations).unwrap()
    });

    assert_eq!(outcomes.len(), 5000);
    assert!(outcomes.iter().all(|o| o.status.is_applied()));
    assert_eq!(ledger.total_balance().unwrap(), Decimal::new(2_000_000, 0));
}

#[test]
fn test_opposite_transfers_from_raw_threads_never_deadlock() {
    let ledger = ledger_with(&[("A", 100), ("B", 100)]);
    let executor = Executor::new(Arc::clone(&ledger));

    must_finish_within(Duration::from_secs(60), move || {
        let forward = {
            let executor = executor.clone();
            thread::spawn(move || {
                for _ in 0..10_000 {
                    executor.execute(&Operation::transfer("A", "B", Decimal::ONE));
                }
            })
        };
        let backward = thread::spawn(move || {
            for _ in 0..10_000 {
                executor.execute(&Operation::transfer("B", "A", Decimal::ONE));
            }
        });
        forward.join().unwrap();
        backward.join().unwrap();
    });

    assert_eq!(ledger.total_balance().unwrap(), Decimal::new(200, 0));
}

#[test]
fn test_observer_never_sees_half_a_transfer_or_a_negative_balance() {
    let ledger = ledger_with(&[("A", 500), ("B", 500), ("C", 500)]);
    let done = Arc::new(AtomicBool::new(false));

    let worker = {
        let ledger = Arc::clone(&ledger);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let dispatcher = dispatcher_for(&ledger, 4);
            let names = ["A", "B", "C"];
            let operations = (0..6000)
                .map(|i| {
                    let from = names[i % 3];
                    let to = names[(i / 3 + 1 + i) % 3];
                    let amount = Decimal::new((i % 400) as i64 + 1, 0);
                    if from == to {
                        Operation::withdraw(from, amount)
                    } else {
                        Operation::transfer(from, to, amount)
                    }
                })
                .collect();
            let outcomes = dispatcher.submit(operations).unwrap();
            done.store(true, Ordering::SeqCst);
            outcomes
        })
    };

    let mut withdrawn_floor = Decimal::new(1500, 0);
    while !done.load(Ordering::SeqCst) {
        let snapshot = ledger.snapshot().unwrap();
        let total: Decimal = snapshot.iter().map(|(_, balance)| *balance).sum();

        assert!(snapshot.iter().all(|(_, balance)| *balance >= Decimal::ZERO));
        // Withdrawals only ever lower the total; transfers never change it
        assert!(total <= withdrawn_floor);
        withdrawn_floor = total;
    }

    let outcomes = worker.join().unwrap();
    let withdrawn: Decimal = outcomes
        .iter()
        .filter(|o| o.status.is_applied())
        .filter_map(|o| match &o.operation {
            Operation::Withdraw { amount, .. } => Some(*amount),
            _ => None,
        })
        .sum();

    assert_eq!(outcomes.len(), 6000);
    assert_eq!(
        ledger.total_balance().unwrap(),
        Decimal::new(1500, 0) - withdrawn
    );
    assert!(ledger
        .snapshot()
        .unwrap()
        .iter()
        .all(|(_, balance)| *balance >= Decimal::ZERO));
}

#[test]
fn test_rejections_leave_no_trace() {
    let ledger = ledger_with(&[("poor", 10), ("rich", 0)]);
    let dispatcher = dispatcher_for(&ledger, 4);

    let operations = (0..100)
        .map(|_| Operation::transfer("poor", "rich", Decimal::new(3, 0)))
        .collect();

    let outcomes = dispatcher.submit(operations).unwrap();

    let applied = outcomes.iter().filter(|o| o.status.is_applied()).count();
    let rejected = outcomes
        .iter()
        .filter(|o| matches!(o.status, OutcomeStatus::Rejected(_)))
        .count();

    // 10 / 3 = 3 transfers fit, regardless of which ones win the race
    assert_eq!(applied, 3);
    assert_eq!(rejected, 97);
    assert_eq!(
        ledger.snapshot().unwrap(),
        vec![
            ("poor".to_string(), Decimal::new(1, 0)),
            ("rich".to_string(), Decimal::new(9, 0)),
        ]
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_transfers_conserve_total(
        transfers in prop::collection::vec((0usize..4, 0usize..4, 1i64..400), 1..200),
        workers in 1usize..8,
    ) {
        let names = ["w", "x", "y", "z"];
        let ledger = ledger_with(&[("w", 300), ("x", 300), ("y", 300), ("z", 300)]);
        let before = ledger.total_balance().unwrap();

        let operations: Vec<Operation> = transfers
            .iter()
            .map(|(from, to, amount)| {
                Operation::transfer(names[*from], names[*to], Decimal::new(*amount, 0))
            })
            .collect();
        let outcomes = dispatcher_for(&ledger, workers)
            .submit(operations.clone())
            .unwrap();

        prop_assert_eq!(outcomes.len(), operations.len());
        prop_assert_eq!(ledger.total_balance().unwrap(), before);
        for (_, balance) in ledger.snapshot().unwrap() {
            prop_assert!(balance >= Decimal::ZERO);
        }
        // Self transfers are invalid input, everything else is applied or rejected
        for outcome in &outcomes {
            let self_transfer = matches!(
                &outcome.operation,
                Operation::Transfer { from, to, .. } if from == to
            );
            prop_assert_eq!(
                matches!(outcome.status, OutcomeStatus::Failed(_)),
                self_transfer
            );
        }
    }
}

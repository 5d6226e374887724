//! Gate drain semantics across threads

use crossbeam_channel::bounded;
use pipetel::Gate;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const NOT_RETURNED: Duration = Duration::from_millis(100);
const RETURNS_WITHIN: Duration = Duration::from_secs(5);

#[test]
fn test_traverse_waits_for_open_entries() {
    let gate = Arc::new(Gate::new());
    gate.enter();
    gate.enter();
    gate.exit();

    let (tx, rx) = bounded(1);
    let waiter = {
        let gate = Arc::clone(&gate);
        thread::spawn(move || {
            gate.traverse();
            tx.send(()).expect("receiver alive");
        })
    };

    // one entry still open: traverse must not return
    assert!(rx.recv_timeout(NOT_RETURNED).is_err());

    gate.exit();
    rx.recv_timeout(RETURNS_WITHIN)
        .expect("traverse did not return after the last exit");
    waiter.join().expect("Thread panicked");
    assert_eq!(gate.open_entries(), 0);
}

#[test]
fn test_holder_traversing_own_gate_never_returns() {
    let gate = Arc::new(Gate::new());
    let (tx, rx) = bounded(1);

    let holder = {
        let gate = Arc::clone(&gate);
        thread::spawn(move || {
            gate.enter();
            gate.traverse();
            tx.send(()).expect("receiver alive");
        })
    };

    while gate.open_entries() == 0 {
        thread::yield_now();
    }
    assert!(
        rx.recv_timeout(Duration::from_millis(300)).is_err(),
        "a thread traversed a gate it holds an entry on"
    );

    // release the stuck entry from outside so the thread can finish
    gate.exit();
    rx.recv_timeout(RETURNS_WITHIN).expect("holder still stuck");
    holder.join().expect("Thread panicked");
}

#[test]
fn test_traverse_drains_concurrent_entries() {
    const WORKERS: usize = 8;
    let gate = Arc::new(Gate::new());
    let finished = Arc::new(AtomicUsize::new(0));
    let all_entered = Arc::new(Barrier::new(WORKERS + 1));

    let handles: Vec<_> = (0..WORKERS)
        .map(|_| {
            let gate = Arc::clone(&gate);
            let finished = Arc::clone(&finished);
            let all_entered = Arc::clone(&all_entered);
            thread::spawn(move || {
                let _entry = gate.entry();
                all_entered.wait();
                thread::sleep(Duration::from_millis(20));
                finished.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    all_entered.wait();
    gate.traverse();
    // every entry open when traversal started has closed
    assert_eq!(finished.load(Ordering::SeqCst), WORKERS);

    for h in handles {
        h.join().expect("Thread panicked");
    }
}

#[test]
fn test_entries_closed_on_another_thread() {
    let gate = Arc::new(Gate::new());
    gate.enter();
    let closer = {
        let gate = Arc::clone(&gate);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            gate.exit();
        })
    };
    {
        let _t = gate.traverse_on_drop();
    }
    assert_eq!(gate.open_entries(), 0);
    closer.join().expect("Thread panicked");
}

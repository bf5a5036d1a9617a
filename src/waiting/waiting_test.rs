use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use super::*;

#[test]
fn await_condition_should_return_immediately_when_predicate_holds() {
    let cancel = CancellationToken::new();

    assert!(await_condition(&cancel, || true, "immediate").is_ok());
}

#[test]
fn await_condition_with_should_run_side_effect_until_predicate_holds() {
    let cancel = CancellationToken::new();
    let effects = AtomicU64::new(0);

    let result = await_condition_with(
        &cancel,
        || effects.load(Ordering::Relaxed) >= 5,
        || {
            effects.fetch_add(1, Ordering::Relaxed);
        },
        "five side effects",
    );

    assert!(result.is_ok());
    assert_eq!(effects.load(Ordering::Relaxed), 5);
}

#[test]
fn await_condition_should_abort_when_cancelled() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = await_condition(&cancel, || false, "never");

    assert!(matches!(result, Err(Error::Interrupted("never"))));
}

#[test]
fn await_condition_should_prefer_a_true_predicate_over_cancellation() {
    // a predicate that already holds returns Ok even if the token is set
    let cancel = CancellationToken::new();
    cancel.cancel();

    assert!(await_condition(&cancel, || true, "already true").is_ok());
}

#[test]
fn await_condition_sleeping_should_retry_on_an_interval() {
    let cancel = CancellationToken::new();
    let polls = AtomicU64::new(0);
    let started = Instant::now();

    let result = await_condition_sleeping(
        &cancel,
        || polls.fetch_add(1, Ordering::Relaxed) >= 2,
        Duration::from_millis(10),
        "two polls",
    );

    assert!(result.is_ok());
    assert!(started.elapsed() >= Duration::from_millis(20));
}

#[test]
fn keepalive_deadline_should_fire_once_per_interval() {
    let mut deadline = KeepaliveDeadline::new(Duration::from_millis(20));

    assert!(!deadline.expired_then_reset());

    std::thread::sleep(Duration::from_millis(30));
    assert!(deadline.expired_then_reset());
    // reset re-arms the interval
    assert!(!deadline.expired_then_reset());
}

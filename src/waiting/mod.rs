//! Poll-until-condition primitives.
//!
//! All synchronization between the harness thread and node-internal threads
//! is cooperative polling: evaluate a predicate, perform an optional side
//! effect, yield the processor, re-check cancellation, repeat. No primitive
//! here carries an implicit timeout; callers that need bounded waiting layer
//! a deadline onto the side effect (see [`KeepaliveDeadline`]) instead of
//! failing the wait itself. Cancellation aborts the in-progress wait with
//! [`Error::Interrupted`] and performs no cleanup; callers own that.

#[cfg(test)]
mod waiting_test;

use std::time::Duration;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::Error;
use crate::Result;

/// Loop until `predicate` holds, yielding between evaluations.
pub fn await_condition<P>(
    cancel: &CancellationToken,
    predicate: P,
    what: &'static str,
) -> Result<()>
where
    P: FnMut() -> bool,
{
    await_condition_with(cancel, predicate, || {}, what)
}

/// Loop until `predicate` holds, running `side_effect` after every failed
/// evaluation (e.g. pump client egress, escalate a keepalive).
pub fn await_condition_with<P, E>(
    cancel: &CancellationToken,
    mut predicate: P,
    mut side_effect: E,
    what: &'static str,
) -> Result<()>
where
    P: FnMut() -> bool,
    E: FnMut(),
{
    loop {
        if predicate() {
            return Ok(());
        }

        side_effect();
        std::thread::yield_now();

        if cancel.is_cancelled() {
            return Err(Error::Interrupted(what));
        }
    }
}

/// Variant for conditions that advance slowly enough that yielding would spin
/// uselessly: sleeps a fixed retry interval between evaluations.
pub fn await_condition_sleeping<P>(
    cancel: &CancellationToken,
    predicate: P,
    retry_interval: Duration,
    what: &'static str,
) -> Result<()>
where
    P: FnMut() -> bool,
{
    await_condition_with(
        cancel,
        predicate,
        || std::thread::sleep(retry_interval),
        what,
    )
}

/// A resettable deadline for layering keepalive escalation onto a wait's side
/// effect: when the interval elapses without the condition holding, the
/// caller sends a keepalive and the deadline restarts.
#[derive(Debug)]
pub struct KeepaliveDeadline {
    interval: Duration,
    deadline: Instant,
}

impl KeepaliveDeadline {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: Instant::now() + interval,
        }
    }

    /// True once per elapsed interval; resets itself on expiry.
    pub fn expired_then_reset(&mut self) -> bool {
        let now = Instant::now();
        if now > self.deadline {
            self.deadline = now + self.interval;
            return true;
        }
        false
    }
}

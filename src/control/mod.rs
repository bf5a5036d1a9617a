//! Cross-process control signaling.
//!
//! The control toggle is an integer-coded register owned by the replication
//! engine and shared with the harness. The harness only ever requests a
//! NEUTRAL -> target transition with a compare-and-set; the engine alone
//! resets the register to NEUTRAL once the requested action completes. A
//! rejected request leaves the register unchanged, and there is no explicit
//! failure path beyond that rejection: non-progress has to be detected by the
//! caller's own higher-level awaits (e.g. a snapshot counter not advancing).

#[cfg(test)]
mod control_test;

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::lifecycle::NodeHandle;
use crate::waiting::await_condition;
use crate::ControlError;
use crate::Result;

/// Requestable cluster actions plus the idle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u64)]
pub enum ToggleState {
    /// Idle; the only state the engine accepts a new request from
    Neutral = 0,
    Snapshot = 1,
    Shutdown = 2,
    Abort = 3,
}

impl ToggleState {
    pub fn code(&self) -> u64 {
        *self as u64
    }

    pub fn from_code(code: u64) -> Option<ToggleState> {
        match code {
            0 => Some(ToggleState::Neutral),
            1 => Some(ToggleState::Snapshot),
            2 => Some(ToggleState::Shutdown),
            3 => Some(ToggleState::Abort),
            _ => None,
        }
    }
}

/// The shared request/acknowledge register.
///
/// `request` is the harness side of the protocol; `complete` is the engine
/// side. The harness never writes NEUTRAL itself.
#[derive(Debug)]
pub struct ControlToggle {
    state: AtomicU64,
}

impl Default for ControlToggle {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlToggle {
    pub fn new() -> Self {
        Self {
            state: AtomicU64::new(ToggleState::Neutral.code()),
        }
    }

    pub fn read(&self) -> ToggleState {
        // the register only ever holds codes written through this type
        ToggleState::from_code(self.state.load(Ordering::Acquire))
            .unwrap_or(ToggleState::Neutral)
    }

    /// Request a NEUTRAL -> `target` transition. Returns whether the engine
    /// accepted the request; a request for NEUTRAL itself is always rejected.
    pub fn request(
        &self,
        target: ToggleState,
    ) -> bool {
        if target == ToggleState::Neutral {
            return false;
        }

        self.state
            .compare_exchange(
                ToggleState::Neutral.code(),
                target.code(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Engine side: mark the in-flight action finished and return to NEUTRAL.
    pub fn complete(&self) {
        self.state
            .store(ToggleState::Neutral.code(), Ordering::Release);
    }
}

/// Locate the control toggle on the node's counters surface and attempt a
/// NEUTRAL -> `target` compare-and-set.
pub fn request_toggle(
    node: &NodeHandle,
    target: ToggleState,
) -> Result<bool> {
    let toggle = find_control_toggle(node)?;
    let accepted = toggle.request(target);
    debug!(
        node_id = node.id(),
        ?target,
        accepted,
        "control toggle requested"
    );
    Ok(accepted)
}

/// Poll until the register reads NEUTRAL again, confirming the engine has
/// consumed and completed the requested action.
pub fn await_neutral(
    cancel: &CancellationToken,
    node: &NodeHandle,
) -> Result<()> {
    let toggle = find_control_toggle(node)?;
    await_condition(
        cancel,
        || toggle.read() == ToggleState::Neutral,
        "neutral control toggle",
    )
}

pub(crate) fn find_control_toggle(node: &NodeHandle) -> Result<std::sync::Arc<ControlToggle>> {
    node.control_toggle()
        .ok_or_else(|| ControlError::ToggleMissing(node.id()).into())
}

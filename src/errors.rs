//! Cluster Harness Error Hierarchy
//!
//! Defines error types for the test harness, categorized by the layer that
//! raises them: topology validation, member lifecycle, control signaling and
//! the client session. Misuse errors are fatal and never retried.

use config::ConfigError;

use crate::control::ToggleState;
use crate::MemberId;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Cluster topology validation failures
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// Member/backup lifecycle misuse or failures
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Control-toggle signaling failures
    #[error(transparent)]
    Control(#[from] ControlError),

    /// Client session misuse or failures
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Harness configuration loading failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Harness configuration validation failures
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The external interrupt signal was set while a wait was in progress.
    /// The in-progress await is aborted and never resumed automatically.
    #[error("Wait interrupted while awaiting {0}")]
    Interrupted(&'static str),

    /// Failures reported by the external runtime launcher
    #[error("Launch failed: {0}")]
    Launch(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    /// One slot is always reserved for the backup node, so the total member
    /// count (static plus dynamic) must stay below nine.
    #[error(
        "too many members: static={static_members} dynamic={dynamic_members}: \
         only 9 members plus the backup slot are supported"
    )]
    TooManyMembers {
        static_members: u32,
        dynamic_members: u32,
    },

    /// Endpoint derivation appends the decimal id to a fixed port base, which
    /// is only collision-free for single-digit ids.
    #[error("invalid member id {0}: member ids must be single-digit")]
    InvalidMemberId(MemberId),
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// Operation addressed a member slot with no running node
    #[error("no node started in slot {0}")]
    NodeNotStarted(MemberId),

    /// Backup operation issued while the backup slot is unoccupied
    #[error("no backup node present")]
    NoBackupNode,

    /// Promotion from backup requires the backup occupant to be closed first
    #[error("backup node must be closed before starting from backup")]
    BackupStillOpen,

    /// Operation addressed a slot outside the member range
    #[error("slot {0} is not a member slot")]
    NotAMemberSlot(MemberId),
}

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// The control-toggle register was absent on the node's counters surface.
    /// This signals a programmer error (e.g. the node is not the leader), not
    /// a transient condition.
    #[error("control toggle not found on node {0}")]
    ToggleMissing(MemberId),

    /// The engine rejected the NEUTRAL -> target transition
    #[error("control toggle request rejected on node {id}: target={target:?}")]
    Rejected { id: MemberId, target: ToggleState },
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Session operation issued before the client was ever connected
    #[error("client not previously connected")]
    NotConnected,
}

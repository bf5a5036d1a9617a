//! Contracts of the external collaborators the harness drives.
//!
//! The replication engine, archive, transport and client library are opaque
//! to the harness: each member's process group is started and stopped as an
//! atomic unit and observed only through the published status on these
//! traits. A [`ClusterLauncher`] implementation bridges the composed
//! configurations to the real (or simulated) system under test.

mod service;
pub use service::*;

use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::ClientConfig;
use crate::ControlToggle;
use crate::NodeConfig;
use crate::BackupNodeConfig;
use crate::MemberId;
use crate::Result;

/// Consensus role a member reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Leader,
    Follower,
    Candidate,
}

/// Transient per-node election phase; a stable node reports none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElectionState {
    Canvass,
    Nominate,
    Ballot,
    Replay,
    Catchup,
}

/// Backup-catchup progression of the backup-slot occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupState {
    BackupQuery,
    SnapshotRetrieve,
    LiveLogReplay,
    UpdateRecordingLog,
    BackingUp,
    Closed,
}

/// A running cluster member: transport driver, archive, consensus module and
/// service container composed into one opaque unit.
#[cfg_attr(test, automock)]
pub trait NodeRuntime: Send + Sync {
    fn role(&self) -> NodeRole;

    /// `None` once the node is stable.
    fn election_state(&self) -> Option<ElectionState>;

    fn commit_position(&self) -> u64;

    fn snapshot_count(&self) -> u64;

    fn has_member_terminated(&self) -> bool;

    fn has_service_terminated(&self) -> bool;

    /// The control-toggle register on this node's counters surface; absent on
    /// nodes that do not currently host it.
    fn control_toggle(&self) -> Option<Arc<ControlToggle>>;

    fn is_closed(&self) -> bool;

    fn close(&self);
}

/// A running backup node: catches up on the replicated log without taking
/// part in elections.
#[cfg_attr(test, automock)]
pub trait BackupRuntime: Send + Sync {
    fn state(&self) -> BackupState;

    fn live_log_position(&self) -> u64;

    fn is_closed(&self) -> bool;

    fn close(&self);
}

/// Ingress/egress connection into the cluster, as an external caller sees it.
#[cfg_attr(test, automock)]
pub trait ClusterClient: Send + Sync {
    /// Non-blocking offer; `false` means rejected (back pressure, no leader)
    /// and the caller should pump egress and retry.
    fn offer(
        &self,
        payload: &[u8],
    ) -> bool;

    /// Drain pending egress, invoking the registered listener per message.
    /// Returns how many messages were delivered.
    fn poll_egress(&self) -> usize;

    /// Keep an otherwise idle session from expiring.
    fn send_keepalive(&self);

    fn close(&self);
}

/// Egress callbacks installed when a client connects.
#[cfg_attr(test, automock)]
pub trait EgressListener: Send + Sync {
    fn on_message(
        &self,
        session_id: u64,
        timestamp_ms: u64,
        payload: &[u8],
    );

    fn on_new_leader(
        &self,
        session_id: u64,
        leadership_term: u64,
        leader_id: MemberId,
    );
}

/// Bridge from composed harness configuration to the system under test.
#[cfg_attr(test, automock)]
pub trait ClusterLauncher: Send + Sync {
    /// Start a member's full process group and return its running runtime.
    fn launch_node(
        &self,
        config: &NodeConfig,
        service: Arc<dyn ClusterService>,
    ) -> Result<Box<dyn NodeRuntime>>;

    /// Start the backup-role process group for the reserved slot.
    fn launch_backup_node(
        &self,
        config: &BackupNodeConfig,
    ) -> Result<Box<dyn BackupRuntime>>;

    /// Build a client transport and application session against the static
    /// members, delivering egress through `listener`.
    fn connect_client(
        &self,
        config: &ClientConfig,
        listener: Arc<dyn EgressListener>,
    ) -> Result<Box<dyn ClusterClient>>;
}

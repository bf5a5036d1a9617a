//! Top-level cluster orchestrator.
//!
//! [`ClusterHarness`] owns the slot arena (member slots plus the single
//! reserved backup slot), the optional client session, and the cancellation
//! token every await cooperates with. It composes the lifecycle manager, the
//! control-toggle channel and the waiting primitives into the cluster-level
//! operations integration tests drive.

mod builder;
mod slot;

pub use builder::*;
pub use slot::*;


use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::control;
use crate::waiting::await_condition;
use crate::waiting::await_condition_sleeping;
use crate::waiting::await_condition_with;
use crate::waiting::KeepaliveDeadline;
use crate::BackupNodeHandle;
use crate::BackupState;
use crate::ClientConfig;
use crate::ClientError;
use crate::ClientSession;
use crate::ClusterLauncher;
use crate::ClusterTopology;
use crate::HarnessConfig;
use crate::LifecycleError;
use crate::MemberId;
use crate::NodeHandle;
use crate::NodeLifecycleManager;
use crate::NodeRole;
use crate::Result;
use crate::ServiceFactory;
use crate::ToggleState;

pub struct ClusterHarness {
    config: HarnessConfig,
    lifecycle: NodeLifecycleManager,
    launcher: Arc<dyn ClusterLauncher>,
    service_factory: ServiceFactory,
    slots: Vec<Slot>,
    session: Option<ClientSession>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for ClusterHarness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterHarness")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ClusterHarness {
    pub fn builder() -> ClusterHarnessBuilder {
        ClusterHarnessBuilder::new()
    }

    /// The common three-static-member shape, all nodes started clean.
    pub fn start_three_node_static(
        launcher: Arc<dyn ClusterLauncher>,
        appointed_leader: Option<MemberId>,
    ) -> Result<Self> {
        let mut harness = Self::builder()
            .static_members(3)
            .appointed_leader_opt(appointed_leader)
            .launcher(launcher)
            .build()?;

        for id in 0..3 {
            harness.start_static_node(id, true)?;
        }

        Ok(harness)
    }

    /// A single static member, started clean.
    pub fn start_single_node_static(launcher: Arc<dyn ClusterLauncher>) -> Result<Self> {
        let mut harness = Self::builder()
            .static_members(1)
            .appointed_leader(0)
            .launcher(launcher)
            .build()?;

        harness.start_static_node(0, true)?;
        Ok(harness)
    }

    pub(crate) fn new(
        topology: ClusterTopology,
        config: HarnessConfig,
        launcher: Arc<dyn ClusterLauncher>,
        service_factory: ServiceFactory,
        cancel: CancellationToken,
    ) -> Self {
        let slot_count = topology.slot_count();
        let mut slots = Vec::with_capacity(slot_count);
        slots.resize_with(slot_count, Slot::default);

        let lifecycle = NodeLifecycleManager::new(topology, config.clone(), launcher.clone());

        Self {
            config,
            lifecycle,
            launcher,
            service_factory,
            slots,
            session: None,
            cancel,
        }
    }

    pub fn topology(&self) -> &ClusterTopology {
        self.lifecycle.topology()
    }

    /// Token every await cooperates with; cancel it from another thread to
    /// abort in-progress waits.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    //-----------------------------------------------------------
    // Node lifecycle

    pub fn start_static_node(
        &mut self,
        id: MemberId,
        clean_start: bool,
    ) -> Result<&NodeHandle> {
        let factory = self.service_factory.clone();
        self.start_static_node_with(id, clean_start, &factory)
    }

    pub fn start_static_node_with(
        &mut self,
        id: MemberId,
        clean_start: bool,
        service_factory: &ServiceFactory,
    ) -> Result<&NodeHandle> {
        self.validate_member_slot(id)?;
        let handle = self
            .lifecycle
            .start_static_node(id, clean_start, service_factory)?;
        self.slots[id as usize] = Slot::Member(handle);
        self.node(id)
    }

    pub fn start_dynamic_node(
        &mut self,
        id: MemberId,
        clean_start: bool,
    ) -> Result<&NodeHandle> {
        let factory = self.service_factory.clone();
        self.start_dynamic_node_with(id, clean_start, &factory)
    }

    pub fn start_dynamic_node_with(
        &mut self,
        id: MemberId,
        clean_start: bool,
        service_factory: &ServiceFactory,
    ) -> Result<&NodeHandle> {
        self.validate_member_slot(id)?;
        let handle = self
            .lifecycle
            .start_dynamic_node(id, clean_start, service_factory)?;
        self.slots[id as usize] = Slot::Member(handle);
        self.node(id)
    }

    /// Start the backup-role occupant of the reserved slot.
    pub fn start_backup_node(
        &mut self,
        clean_start: bool,
    ) -> Result<&BackupNodeHandle> {
        let handle = self.lifecycle.start_backup_node(clean_start)?;
        let index = self.backup_slot_index() as usize;
        self.slots[index] = Slot::Backup(handle);
        self.backup_node()
    }

    /// Promote the backup slot into a running single-member static cluster,
    /// reusing the backup-synced state. The backup occupant must be closed
    /// first; promotion replaces it.
    pub fn start_static_node_from_backup(&mut self) -> Result<&NodeHandle> {
        let factory = self.service_factory.clone();
        self.start_static_node_from_backup_with(&factory)
    }

    pub fn start_static_node_from_backup_with(
        &mut self,
        service_factory: &ServiceFactory,
    ) -> Result<&NodeHandle> {
        let index = self.backup_slot_index() as usize;
        match &self.slots[index] {
            Slot::Backup(backup) if backup.is_closed() => {}
            Slot::Backup(_) => return Err(LifecycleError::BackupStillOpen.into()),
            _ => return Err(LifecycleError::NoBackupNode.into()),
        }

        let handle = self.lifecycle.start_node_from_backup(service_factory)?;
        self.slots[index] = Slot::Member(handle);
        self.node(self.backup_slot_index())
    }

    pub fn stop_node(
        &self,
        id: MemberId,
    ) -> Result<()> {
        self.node(id)?.close();
        Ok(())
    }

    pub fn stop_backup_node(&self) -> Result<()> {
        self.backup_node()?.close();
        Ok(())
    }

    /// Close every occupied slot. Idempotent.
    pub fn stop_all_nodes(&self) {
        for slot in &self.slots {
            slot.close();
        }
    }

    /// Re-invoke static startup for the static members only; dynamic members
    /// and the backup slot are deliberately left alone.
    pub fn restart_all_nodes(
        &mut self,
        clean_start: bool,
    ) -> Result<()> {
        info!(clean_start, "restarting static members");
        for id in 0..self.topology().static_member_count() {
            self.start_static_node(id, clean_start)?;
        }
        Ok(())
    }

    //-----------------------------------------------------------
    // Slot access

    pub fn node(
        &self,
        id: MemberId,
    ) -> Result<&NodeHandle> {
        self.slots
            .get(id as usize)
            .and_then(Slot::as_member)
            .ok_or_else(|| LifecycleError::NodeNotStarted(id).into())
    }

    pub fn backup_node(&self) -> Result<&BackupNodeHandle> {
        self.slots
            .get(self.backup_slot_index() as usize)
            .and_then(Slot::as_backup)
            .ok_or_else(|| LifecycleError::NoBackupNode.into())
    }

    //-----------------------------------------------------------
    // Leader discovery

    /// First open member that reports the leader role with no in-progress
    /// election. `None` is "not found", not an error: callers poll again or
    /// block via [`ClusterHarness::await_leader`].
    pub fn find_leader(&self) -> Option<MemberId> {
        self.find_leader_skipping(None)
    }

    pub fn find_leader_skipping(
        &self,
        skip: Option<MemberId>,
    ) -> Option<MemberId> {
        for (index, slot) in self.slots.iter().enumerate() {
            let id = index as MemberId;
            let Some(node) = slot.as_member() else {
                continue;
            };
            if Some(id) == skip || node.is_closed() {
                continue;
            }
            if node.is_leader() && node.election_state().is_none() {
                return Some(id);
            }
        }

        None
    }

    /// Block with a fixed retry interval until a leader is found.
    pub fn await_leader(&self) -> Result<MemberId> {
        self.await_leader_skipping(None)
    }

    pub fn await_leader_skipping(
        &self,
        skip: Option<MemberId>,
    ) -> Result<MemberId> {
        let mut leader = None;
        await_condition_sleeping(
            &self.cancel,
            || {
                leader = self.find_leader_skipping(skip);
                leader.is_some()
            },
            self.config.leader_retry_interval(),
            "leader",
        )?;

        leader.ok_or(crate::Error::Interrupted("leader"))
    }

    /// All open member nodes currently reporting the follower role, in slot
    /// order.
    pub fn followers(&self) -> Vec<MemberId> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let node = slot.as_member()?;
                if !node.is_closed() && node.role() == NodeRole::Follower {
                    Some(index as MemberId)
                } else {
                    None
                }
            })
            .collect()
    }

    //-----------------------------------------------------------
    // Control signaling

    /// Request a snapshot from the given (leader) node.
    pub fn take_snapshot(
        &self,
        id: MemberId,
    ) -> Result<()> {
        self.request_cluster_action(id, ToggleState::Snapshot)
    }

    /// Request an orderly snapshot-then-terminate of the whole cluster.
    pub fn shutdown_cluster(
        &self,
        id: MemberId,
    ) -> Result<()> {
        self.request_cluster_action(id, ToggleState::Shutdown)
    }

    /// Request immediate termination of the whole cluster.
    pub fn abort_cluster(
        &self,
        id: MemberId,
    ) -> Result<()> {
        self.request_cluster_action(id, ToggleState::Abort)
    }

    fn request_cluster_action(
        &self,
        id: MemberId,
        target: ToggleState,
    ) -> Result<()> {
        let node = self.node(id)?;
        if !control::request_toggle(node, target)? {
            return Err(crate::ControlError::Rejected { id, target }.into());
        }
        info!(node_id = id, ?target, "cluster action requested");
        Ok(())
    }

    /// Confirm the engine has consumed and completed the last request.
    pub fn await_neutral_control_toggle(
        &self,
        id: MemberId,
    ) -> Result<()> {
        control::await_neutral(&self.cancel, self.node(id)?)
    }

    //-----------------------------------------------------------
    // Awaits over node state

    pub fn await_not_in_election(
        &self,
        id: MemberId,
    ) -> Result<()> {
        let node = self.node(id)?;
        await_condition(
            &self.cancel,
            || node.election_state().is_none(),
            "stable election state",
        )
    }

    pub fn await_commit_position(
        &self,
        id: MemberId,
        position: u64,
    ) -> Result<()> {
        let node = self.node(id)?;
        await_condition(
            &self.cancel,
            || node.commit_position() >= position,
            "commit position",
        )
    }

    pub fn await_snapshot_counter(
        &self,
        id: MemberId,
        count: u64,
    ) -> Result<()> {
        let node = self.node(id)?;
        await_condition(
            &self.cancel,
            || node.snapshot_count() >= count,
            "snapshot counter",
        )
    }

    /// Both the member and its service container must have terminated.
    pub fn await_node_termination(
        &self,
        id: MemberId,
    ) -> Result<()> {
        let node = self.node(id)?;
        await_condition(
            &self.cancel,
            || node.has_member_terminated() && node.has_service_terminated(),
            "node termination",
        )
    }

    /// Await replicated messages reaching the node's service. Keepalives are
    /// escalated through the connected client so the session cannot idle out
    /// while replication catches up.
    pub fn await_message_count_for_service(
        &self,
        id: MemberId,
        count: u64,
    ) -> Result<()> {
        let node = self.node(id)?;
        let session = self.client()?;
        let mut deadline = KeepaliveDeadline::new(self.config.keepalive_interval());

        await_condition_with(
            &self.cancel,
            || node.service().message_count() >= count,
            || {
                if deadline.expired_then_reset() {
                    session.send_keepalive();
                }
            },
            "service message count",
        )
    }

    pub fn await_snapshot_loaded_for_service(
        &self,
        id: MemberId,
    ) -> Result<()> {
        let node = self.node(id)?;
        await_condition(
            &self.cancel,
            || node.service().was_snapshot_loaded(),
            "service snapshot load",
        )
    }

    //-----------------------------------------------------------
    // Awaits over backup state

    pub fn await_backup_state(
        &self,
        target: BackupState,
    ) -> Result<()> {
        let backup = self.backup_node()?;
        await_condition_sleeping(
            &self.cancel,
            || backup.state() == target,
            self.config.backup_poll_interval(),
            "backup state",
        )
    }

    pub fn await_backup_live_log_position(
        &self,
        position: u64,
    ) -> Result<()> {
        let backup = self.backup_node()?;
        await_condition_sleeping(
            &self.cancel,
            || backup.live_log_position() >= position,
            self.config.backup_poll_interval(),
            "backup live log position",
        )
    }

    //-----------------------------------------------------------
    // Client session

    pub fn connect_client(&mut self) -> Result<()> {
        let config = ClientConfig {
            member_endpoints: self.topology().client_member_endpoints().to_string(),
        };
        self.session = Some(ClientSession::connect(
            self.launcher.clone(),
            config,
            self.config.keepalive_interval(),
        )?);
        Ok(())
    }

    /// Rebuild the client connection; fatal if the client was never
    /// connected. Session counters persist.
    pub fn reconnect_client(&mut self) -> Result<()> {
        self.session
            .as_mut()
            .ok_or(ClientError::NotConnected)?
            .reconnect()
    }

    pub fn client(&self) -> Result<&ClientSession> {
        self.session
            .as_ref()
            .ok_or_else(|| ClientError::NotConnected.into())
    }

    pub fn send_message(
        &self,
        payload: &[u8],
    ) -> Result<()> {
        self.client()?.send_message(&self.cancel, payload)
    }

    pub fn send_messages(
        &self,
        count: u32,
    ) -> Result<()> {
        self.client()?.send_messages(&self.cancel, count)
    }

    pub fn await_responses(
        &self,
        count: u64,
    ) -> Result<()> {
        self.client()?.await_responses(&self.cancel, count)
    }

    pub fn await_leadership_event(
        &self,
        count: u64,
    ) -> Result<()> {
        self.client()?.await_leadership_event(&self.cancel, count)
    }

    //-----------------------------------------------------------
    // Teardown

    /// Close the client first, then every occupied slot. Idempotent; also
    /// run on drop.
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            session.close();
        }
        self.stop_all_nodes();
    }

    fn backup_slot_index(&self) -> MemberId {
        self.topology().backup_slot_index()
    }

    fn validate_member_slot(
        &self,
        id: MemberId,
    ) -> Result<()> {
        if id >= self.topology().member_count() {
            return Err(LifecycleError::NotAMemberSlot(id).into());
        }
        Ok(())
    }
}

impl Drop for ClusterHarness {
    fn drop(&mut self) {
        self.close();
    }
}

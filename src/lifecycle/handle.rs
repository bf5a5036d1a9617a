use std::sync::Arc;

use tracing::debug;

use crate::BackupNodeConfig;
use crate::BackupRuntime;
use crate::BackupState;
use crate::ClusterService;
use crate::ControlToggle;
use crate::ElectionState;
use crate::MemberId;
use crate::NodeConfig;
use crate::NodeRole;
use crate::NodeRuntime;

/// A running cluster member: the composed configuration it was started with,
/// its opaque runtime, and the service status handle. Owned by the slot it
/// occupies until closed.
pub struct NodeHandle {
    config: NodeConfig,
    runtime: Box<dyn NodeRuntime>,
    service: Arc<dyn ClusterService>,
}

impl std::fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeHandle")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl NodeHandle {
    pub(crate) fn new(
        config: NodeConfig,
        runtime: Box<dyn NodeRuntime>,
        service: Arc<dyn ClusterService>,
    ) -> Self {
        Self {
            config,
            runtime,
            service,
        }
    }

    pub fn id(&self) -> MemberId {
        self.config.id
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn service(&self) -> &Arc<dyn ClusterService> {
        &self.service
    }

    pub fn role(&self) -> NodeRole {
        self.runtime.role()
    }

    pub fn is_leader(&self) -> bool {
        self.runtime.role() == NodeRole::Leader
    }

    pub fn is_follower(&self) -> bool {
        self.runtime.role() == NodeRole::Follower
    }

    /// `None` once the node is stable.
    pub fn election_state(&self) -> Option<ElectionState> {
        self.runtime.election_state()
    }

    pub fn commit_position(&self) -> u64 {
        self.runtime.commit_position()
    }

    pub fn snapshot_count(&self) -> u64 {
        self.runtime.snapshot_count()
    }

    pub fn has_member_terminated(&self) -> bool {
        self.runtime.has_member_terminated()
    }

    pub fn has_service_terminated(&self) -> bool {
        self.runtime.has_service_terminated()
    }

    pub fn control_toggle(&self) -> Option<Arc<ControlToggle>> {
        self.runtime.control_toggle()
    }

    pub fn is_closed(&self) -> bool {
        self.runtime.is_closed()
    }

    /// Idempotent: closing an already-closed node is a no-op.
    pub fn close(&self) {
        if !self.runtime.is_closed() {
            debug!(node_id = self.config.id, "closing node");
            self.runtime.close();
        }
    }
}

impl Drop for NodeHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// The backup-slot occupant: catches up on the replicated log without a
/// consensus role. Mutually exclusive with a [`NodeHandle`] in that slot.
pub struct BackupNodeHandle {
    config: BackupNodeConfig,
    runtime: Box<dyn BackupRuntime>,
}

impl BackupNodeHandle {
    pub(crate) fn new(
        config: BackupNodeConfig,
        runtime: Box<dyn BackupRuntime>,
    ) -> Self {
        Self { config, runtime }
    }

    pub fn id(&self) -> MemberId {
        self.config.id
    }

    pub fn config(&self) -> &BackupNodeConfig {
        &self.config
    }

    pub fn state(&self) -> BackupState {
        self.runtime.state()
    }

    pub fn live_log_position(&self) -> u64 {
        self.runtime.live_log_position()
    }

    pub fn is_closed(&self) -> bool {
        self.runtime.is_closed()
    }

    /// Idempotent: closing an already-closed backup is a no-op.
    pub fn close(&self) {
        if !self.runtime.is_closed() {
            debug!(node_id = self.config.id, "closing backup node");
            self.runtime.close();
        }
    }
}

impl Drop for BackupNodeHandle {
    fn drop(&mut self) {
        self.close();
    }
}

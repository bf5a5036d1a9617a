use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::constants::ARCHIVE_CONTROL_REQUEST_STREAM_ID;
use crate::constants::ARCHIVE_CONTROL_RESPONSE_STREAM_ID_BASE;
use crate::constants::ARCHIVE_DIR_NAME;
use crate::constants::BACKUP_DIR_NAME;
use crate::constants::CONSENSUS_DIR_NAME;
use crate::constants::DRIVER_DIR_SUFFIX;
use crate::constants::SERVICE_DIR_NAME;
use crate::topology;
use crate::topology::ChannelFamily;
use crate::ArchiveConfig;
use crate::BackupNodeConfig;
use crate::BackupNodeHandle;
use crate::ClusterLauncher;
use crate::ClusterTopology;
use crate::ConsensusConfig;
use crate::DriverConfig;
use crate::HarnessConfig;
use crate::MemberId;
use crate::NodeConfig;
use crate::NodeHandle;
use crate::Result;
use crate::ServiceConfig;
use crate::ServiceFactory;

/// Composes per-member configuration from the topology and starts/stops the
/// member process groups through the launcher.
pub struct NodeLifecycleManager {
    topology: ClusterTopology,
    config: HarnessConfig,
    launcher: Arc<dyn ClusterLauncher>,
}

impl NodeLifecycleManager {
    pub fn new(
        topology: ClusterTopology,
        config: HarnessConfig,
        launcher: Arc<dyn ClusterLauncher>,
    ) -> Self {
        Self {
            topology,
            config,
            launcher,
        }
    }

    pub fn topology(&self) -> &ClusterTopology {
        &self.topology
    }

    /// `<base>-<id>`
    pub fn member_base_dir(
        &self,
        id: MemberId,
    ) -> PathBuf {
        PathBuf::from(format!("{}-{id}", self.config.base_dir.display()))
    }

    /// `<base>-<id>-driver`
    pub fn member_driver_dir(
        &self,
        id: MemberId,
    ) -> PathBuf {
        PathBuf::from(format!(
            "{}-{id}-{DRIVER_DIR_SUFFIX}",
            self.config.base_dir.display()
        ))
    }

    /// Configuration for a member of the initial static membership.
    pub fn compose_static_config(
        &self,
        id: MemberId,
        clean_start: bool,
    ) -> Result<NodeConfig> {
        let base_dir = self.member_base_dir(id);

        Ok(NodeConfig {
            id,
            base_dir: base_dir.clone(),
            driver: self.compose_driver_config(id),
            archive: self.compose_archive_config(id, &base_dir, clean_start)?,
            consensus: ConsensusConfig {
                member_id: Some(id),
                cluster_members: self.topology.cluster_members().to_string(),
                appointed_leader: self.topology.appointed_leader(),
                cluster_dir: base_dir.join(CONSENSUS_DIR_NAME),
                log_channel: topology::endpoint(ChannelFamily::Log, id)?,
                status_endpoints: None,
                member_endpoints: None,
                delete_dir_on_start: clean_start,
            },
            service: ServiceConfig {
                dir: base_dir.join(SERVICE_DIR_NAME),
            },
        })
    }

    /// Configuration for a dynamically joining member: no member id, an empty
    /// static-members list, plus the status-endpoint list and this member's
    /// own endpoint set.
    pub fn compose_dynamic_config(
        &self,
        id: MemberId,
        clean_start: bool,
    ) -> Result<NodeConfig> {
        let base_dir = self.member_base_dir(id);

        Ok(NodeConfig {
            id,
            base_dir: base_dir.clone(),
            driver: self.compose_driver_config(id),
            archive: self.compose_archive_config(id, &base_dir, clean_start)?,
            consensus: ConsensusConfig {
                member_id: None,
                cluster_members: String::new(),
                appointed_leader: None,
                cluster_dir: base_dir.join(CONSENSUS_DIR_NAME),
                log_channel: topology::endpoint(ChannelFamily::Log, id)?,
                status_endpoints: Some(self.topology.status_endpoints().to_string()),
                member_endpoints: Some(self.topology.member_endpoints(id)?.to_string()),
                delete_dir_on_start: clean_start,
            },
            service: ServiceConfig {
                dir: base_dir.join(SERVICE_DIR_NAME),
            },
        })
    }

    /// Configuration for the backup-role occupant of the reserved slot.
    pub fn compose_backup_config(
        &self,
        clean_start: bool,
    ) -> Result<BackupNodeConfig> {
        let id = self.topology.backup_slot_index();
        let base_dir = self.member_base_dir(id);

        Ok(BackupNodeConfig {
            id,
            base_dir: base_dir.clone(),
            driver: self.compose_driver_config(id),
            archive: self.compose_archive_config(id, &base_dir, clean_start)?,
            status_endpoints: self.topology.status_endpoints().to_string(),
            status_endpoint: topology::backup_status_endpoint(id)?,
            transfer_endpoint: topology::backup_transfer_endpoint(id)?,
            cluster_dir: base_dir.join(BACKUP_DIR_NAME),
            delete_dir_on_start: clean_start,
        })
    }

    /// Configuration that rebuilds the backup slot as a single-member static
    /// cluster: members list is only this id, the appointed leader is this
    /// id, and the backup's directories are reused without a clean start so
    /// the backup-synced state survives.
    pub fn compose_promoted_config(&self) -> Result<NodeConfig> {
        let id = self.topology.backup_slot_index();
        let base_dir = self.member_base_dir(id);

        Ok(NodeConfig {
            id,
            base_dir: base_dir.clone(),
            driver: self.compose_driver_config(id),
            archive: self.compose_archive_config(id, &base_dir, false)?,
            consensus: ConsensusConfig {
                member_id: Some(id),
                cluster_members: topology::single_member_string(id)?,
                appointed_leader: Some(id),
                cluster_dir: base_dir.join(BACKUP_DIR_NAME),
                log_channel: topology::endpoint(ChannelFamily::Log, id)?,
                status_endpoints: None,
                member_endpoints: None,
                delete_dir_on_start: false,
            },
            service: ServiceConfig {
                dir: base_dir.join(SERVICE_DIR_NAME),
            },
        })
    }

    pub fn start_static_node(
        &self,
        id: MemberId,
        clean_start: bool,
        service_factory: &ServiceFactory,
    ) -> Result<NodeHandle> {
        let config = self.compose_static_config(id, clean_start)?;
        info!(node_id = id, clean_start, "starting static node");
        self.launch(config, service_factory)
    }

    pub fn start_dynamic_node(
        &self,
        id: MemberId,
        clean_start: bool,
        service_factory: &ServiceFactory,
    ) -> Result<NodeHandle> {
        let config = self.compose_dynamic_config(id, clean_start)?;
        info!(node_id = id, clean_start, "starting dynamic node");
        self.launch(config, service_factory)
    }

    pub fn start_backup_node(
        &self,
        clean_start: bool,
    ) -> Result<BackupNodeHandle> {
        let config = self.compose_backup_config(clean_start)?;
        info!(node_id = config.id, clean_start, "starting backup node");
        let runtime = self.launcher.launch_backup_node(&config)?;
        Ok(BackupNodeHandle::new(config, runtime))
    }

    /// Start the reserved slot as a single-member static cluster on top of
    /// the state a closed backup left behind. The caller is responsible for
    /// checking the backup occupant is closed first.
    pub fn start_node_from_backup(
        &self,
        service_factory: &ServiceFactory,
    ) -> Result<NodeHandle> {
        let config = self.compose_promoted_config()?;
        info!(node_id = config.id, "starting static node from backup");
        self.launch(config, service_factory)
    }

    fn launch(
        &self,
        config: NodeConfig,
        service_factory: &ServiceFactory,
    ) -> Result<NodeHandle> {
        let service = service_factory.as_ref()(config.id);
        let runtime = self.launcher.launch_node(&config, service.clone())?;
        Ok(NodeHandle::new(config, runtime, service))
    }

    fn compose_driver_config(
        &self,
        id: MemberId,
    ) -> DriverConfig {
        DriverConfig {
            dir: self.member_driver_dir(id),
            delete_on_start: true,
            delete_on_shutdown: true,
        }
    }

    fn compose_archive_config(
        &self,
        id: MemberId,
        base_dir: &PathBuf,
        clean_start: bool,
    ) -> Result<ArchiveConfig> {
        Ok(ArchiveConfig {
            dir: base_dir.join(ARCHIVE_DIR_NAME),
            control_request_channel: topology::endpoint(ChannelFamily::ArchiveControlRequest, id)?,
            control_response_channel: topology::endpoint(
                ChannelFamily::ArchiveControlResponse,
                id,
            )?,
            control_request_stream_id: ARCHIVE_CONTROL_REQUEST_STREAM_ID,
            control_response_stream_id: ARCHIVE_CONTROL_RESPONSE_STREAM_ID_BASE + id,
            segment_file_length: self.config.segment_file_length,
            max_catalog_entries: self.config.max_catalog_entries,
            delete_on_start: clean_start,
        })
    }
}

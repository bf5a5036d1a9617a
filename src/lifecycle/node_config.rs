use std::path::PathBuf;

use crate::MemberId;

/// Transport driver configuration for one member.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// `<base>-<id>-driver`
    pub dir: PathBuf,
    pub delete_on_start: bool,
    pub delete_on_shutdown: bool,
}

/// Log-archive configuration for one member.
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    /// `<base>-<id>/archive`
    pub dir: PathBuf,
    pub control_request_channel: String,
    pub control_response_channel: String,
    pub control_request_stream_id: u32,
    /// Unique per member so concurrent archives never cross responses
    pub control_response_stream_id: u32,
    pub segment_file_length: u64,
    pub max_catalog_entries: u64,
    pub delete_on_start: bool,
}

/// Replication-engine configuration for one member.
///
/// A static member carries its id and the full static-members descriptor. A
/// dynamically joining member carries neither: the empty members list plus
/// the status-endpoint list signal the engine to join the running cluster
/// instead of bootstrapping.
#[derive(Debug, Clone)]
pub struct ConsensusConfig {
    pub member_id: Option<MemberId>,
    pub cluster_members: String,
    pub appointed_leader: Option<MemberId>,
    /// `<base>-<id>/consensus-module`, or the reused `cluster-backup`
    /// directory when promoted from backup
    pub cluster_dir: PathBuf,
    pub log_channel: String,
    pub status_endpoints: Option<String>,
    pub member_endpoints: Option<String>,
    pub delete_dir_on_start: bool,
}

/// Service-container configuration for one member.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// `<base>-<id>/service`
    pub dir: PathBuf,
}

/// Full composed configuration for a member's process group.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub id: MemberId,
    /// `<base>-<id>`
    pub base_dir: PathBuf,
    pub driver: DriverConfig,
    pub archive: ArchiveConfig,
    pub consensus: ConsensusConfig,
    pub service: ServiceConfig,
}

/// Composed configuration for the backup-slot occupant.
#[derive(Debug, Clone)]
pub struct BackupNodeConfig {
    pub id: MemberId,
    pub base_dir: PathBuf,
    pub driver: DriverConfig,
    pub archive: ArchiveConfig,
    /// Status endpoints of the static members the backup queries
    pub status_endpoints: String,
    /// The backup's own status endpoint at the reserved slot index
    pub status_endpoint: String,
    /// The backup's own transfer endpoint for log/snapshot retrieval
    pub transfer_endpoint: String,
    /// `<base>-<id>/cluster-backup`
    pub cluster_dir: PathBuf,
    pub delete_dir_on_start: bool,
}

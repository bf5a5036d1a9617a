//-----------------------------------------------------------
// Endpoint allocation

/// Host every member endpoint binds to.
pub(crate) const ENDPOINT_HOST: &str = "localhost";

/// Per-channel-family port bases. A member endpoint is formed by appending the
/// decimal member id to the base, which is collision-free only while ids stay
/// single-digit. The topology bound (fewer than [`MAX_CLUSTER_SLOTS`] slots
/// including the backup) guarantees exactly that.
pub(crate) const INGRESS_PORT_BASE: u32 = 2011;
pub(crate) const MEMBER_STATUS_PORT_BASE: u32 = 2022;
pub(crate) const LOG_PORT_BASE: u32 = 2033;
pub(crate) const TRANSFER_PORT_BASE: u32 = 2044;
pub(crate) const ARCHIVE_CONTROL_REQUEST_PORT_BASE: u32 = 801;
pub(crate) const ARCHIVE_CONTROL_RESPONSE_PORT_BASE: u32 = 802;

/// Upper bound on cluster slots (members plus the reserved backup slot).
pub const MAX_CLUSTER_SLOTS: u32 = 10;

//-----------------------------------------------------------
// Archive control streams

pub(crate) const ARCHIVE_CONTROL_REQUEST_STREAM_ID: u32 = 100;
pub(crate) const ARCHIVE_CONTROL_RESPONSE_STREAM_ID_BASE: u32 = 110;

//-----------------------------------------------------------
// Directory layout

/// `<base>-<id>` holds the member root, `<base>-<id>-driver` the transport
/// state.
pub(crate) const DRIVER_DIR_SUFFIX: &str = "driver";
pub(crate) const ARCHIVE_DIR_NAME: &str = "archive";
pub(crate) const CONSENSUS_DIR_NAME: &str = "consensus-module";
pub(crate) const BACKUP_DIR_NAME: &str = "cluster-backup";
pub(crate) const SERVICE_DIR_NAME: &str = "service";

//-----------------------------------------------------------
// Timing defaults (milliseconds)

pub(crate) const DEFAULT_KEEPALIVE_INTERVAL_MS: u64 = 1_000;
pub(crate) const DEFAULT_LEADER_RETRY_INTERVAL_MS: u64 = 1_000;
pub(crate) const DEFAULT_BACKUP_POLL_INTERVAL_MS: u64 = 100;

//-----------------------------------------------------------
// Archive defaults

pub(crate) const DEFAULT_SEGMENT_FILE_LENGTH: u64 = 16 * 1024 * 1024;
pub(crate) const DEFAULT_MAX_CATALOG_ENTRIES: u64 = 128;

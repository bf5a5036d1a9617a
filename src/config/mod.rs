//! Harness configuration.
//!
//! Configuration is loaded with priority:
//! 1. Hardcoded defaults
//! 2. Optional override file (TOML)
//! 3. Environment variables (highest priority, `HARNESS__` prefix)


use std::path::PathBuf;
use std::time::Duration;

use config::Config;
use config::Environment;
use config::File;
use config::FileFormat;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_BACKUP_POLL_INTERVAL_MS;
use crate::constants::DEFAULT_KEEPALIVE_INTERVAL_MS;
use crate::constants::DEFAULT_LEADER_RETRY_INTERVAL_MS;
use crate::constants::DEFAULT_MAX_CATALOG_ENTRIES;
use crate::constants::DEFAULT_SEGMENT_FILE_LENGTH;
use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HarnessConfig {
    /// Prefix for member directories: member `i` lives in `<base_dir>-<i>`
    /// with transport state in `<base_dir>-<i>-driver`.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Idle-session keepalive escalation interval for client awaits
    #[serde(default = "default_keepalive_interval_ms")]
    pub keepalive_interval_ms: u64,

    /// Fixed retry interval while blocking for a leader to emerge
    #[serde(default = "default_leader_retry_interval_ms")]
    pub leader_retry_interval_ms: u64,

    /// Fixed retry interval for backup-node state awaits
    #[serde(default = "default_backup_poll_interval_ms")]
    pub backup_poll_interval_ms: u64,

    /// Segment file length handed to the archive configuration
    #[serde(default = "default_segment_file_length")]
    pub segment_file_length: u64,

    /// Catalog entry cap handed to the archive configuration
    #[serde(default = "default_max_catalog_entries")]
    pub max_catalog_entries: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            keepalive_interval_ms: default_keepalive_interval_ms(),
            leader_retry_interval_ms: default_leader_retry_interval_ms(),
            backup_poll_interval_ms: default_backup_poll_interval_ms(),
            segment_file_length: default_segment_file_length(),
            max_catalog_entries: default_max_catalog_entries(),
        }
    }
}

impl HarnessConfig {
    /// Load defaults merged with `HARNESS__`-prefixed environment overrides,
    /// e.g. `HARNESS__KEEPALIVE_INTERVAL_MS=250`.
    pub fn new() -> Result<Self> {
        let settings = Config::builder()
            .add_source(Config::try_from(&HarnessConfig::default())?)
            .add_source(Environment::with_prefix("HARNESS").separator("__"))
            .build()?;

        let config: HarnessConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Merge a TOML override file on top of the current configuration.
    /// Environment variables still win over the file.
    pub fn with_override_config(
        self,
        path: &str,
    ) -> Result<Self> {
        let settings = Config::builder()
            .add_source(Config::try_from(&self)?)
            .add_source(File::new(path, FileFormat::Toml))
            .add_source(Environment::with_prefix("HARNESS").separator("__"))
            .build()?;

        let config: HarnessConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validates harness configuration consistency
    pub fn validate(&self) -> Result<()> {
        if self.base_dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("base_dir cannot be empty".into()));
        }

        if self.keepalive_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "keepalive_interval_ms cannot be 0".into(),
            ));
        }

        if self.leader_retry_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "leader_retry_interval_ms cannot be 0".into(),
            ));
        }

        if self.backup_poll_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "backup_poll_interval_ms cannot be 0".into(),
            ));
        }

        Ok(())
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.keepalive_interval_ms)
    }

    pub fn leader_retry_interval(&self) -> Duration {
        Duration::from_millis(self.leader_retry_interval_ms)
    }

    pub fn backup_poll_interval(&self) -> Duration {
        Duration::from_millis(self.backup_poll_interval_ms)
    }
}

fn default_base_dir() -> PathBuf {
    std::env::temp_dir().join("cluster-harness")
}

fn default_keepalive_interval_ms() -> u64 {
    DEFAULT_KEEPALIVE_INTERVAL_MS
}

fn default_leader_retry_interval_ms() -> u64 {
    DEFAULT_LEADER_RETRY_INTERVAL_MS
}

fn default_backup_poll_interval_ms() -> u64 {
    DEFAULT_BACKUP_POLL_INTERVAL_MS
}

fn default_segment_file_length() -> u64 {
    DEFAULT_SEGMENT_FILE_LENGTH
}

fn default_max_catalog_entries() -> u64 {
    DEFAULT_MAX_CATALOG_ENTRIES
}

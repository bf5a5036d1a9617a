use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::default_service_factory;
use crate::ClusterHarness;
use crate::ClusterLauncher;
use crate::ClusterTopology;
use crate::Error;
use crate::HarnessConfig;
use crate::MemberId;
use crate::Result;
use crate::ServiceFactory;

/// Builds a [`ClusterHarness`] from the topology shape, harness
/// configuration and the launcher bridging to the system under test.
///
/// Defaults: three static members, no dynamic members, no appointed leader,
/// [`HarnessConfig::default`], and the counting service factory.
pub struct ClusterHarnessBuilder {
    static_members: u32,
    dynamic_members: u32,
    appointed_leader: Option<MemberId>,
    config: HarnessConfig,
    service_factory: ServiceFactory,
    launcher: Option<Arc<dyn ClusterLauncher>>,
    cancel: Option<CancellationToken>,
}

impl Default for ClusterHarnessBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClusterHarnessBuilder {
    pub fn new() -> Self {
        Self {
            static_members: 3,
            dynamic_members: 0,
            appointed_leader: None,
            config: HarnessConfig::default(),
            service_factory: default_service_factory(),
            launcher: None,
            cancel: None,
        }
    }

    pub fn static_members(
        mut self,
        count: u32,
    ) -> Self {
        self.static_members = count;
        self
    }

    pub fn dynamic_members(
        mut self,
        count: u32,
    ) -> Self {
        self.dynamic_members = count;
        self
    }

    pub fn appointed_leader(
        mut self,
        id: MemberId,
    ) -> Self {
        self.appointed_leader = Some(id);
        self
    }

    pub fn appointed_leader_opt(
        mut self,
        id: Option<MemberId>,
    ) -> Self {
        self.appointed_leader = id;
        self
    }

    pub fn config(
        mut self,
        config: HarnessConfig,
    ) -> Self {
        self.config = config;
        self
    }

    /// Default service factory for nodes started without an explicit one.
    pub fn service_factory(
        mut self,
        factory: ServiceFactory,
    ) -> Self {
        self.service_factory = factory;
        self
    }

    pub fn launcher(
        mut self,
        launcher: Arc<dyn ClusterLauncher>,
    ) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// Share an externally owned token so tests can abort in-progress waits.
    pub fn cancellation_token(
        mut self,
        cancel: CancellationToken,
    ) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn build(self) -> Result<ClusterHarness> {
        let launcher = self
            .launcher
            .ok_or_else(|| Error::InvalidConfig("a cluster launcher is required".into()))?;

        self.config.validate()?;
        let topology = ClusterTopology::new(
            self.static_members,
            self.dynamic_members,
            self.appointed_leader,
        )?;

        Ok(ClusterHarness::new(
            topology,
            self.config,
            launcher,
            self.service_factory,
            self.cancel.unwrap_or_default(),
        ))
    }
}

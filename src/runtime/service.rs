use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::MemberId;

/// Application logic hosted in a member's service container.
///
/// The engine feeds it replicated session messages and snapshot-load events;
/// the harness only reads the published status surface.
pub trait ClusterService: Send + Sync {
    fn on_session_message(
        &self,
        payload: &[u8],
    );

    fn on_snapshot_loaded(&self);

    fn message_count(&self) -> u64;

    fn was_snapshot_loaded(&self) -> bool;
}

/// Builds the service instance hosted by a starting node.
pub type ServiceFactory = Arc<dyn Fn(MemberId) -> Arc<dyn ClusterService> + Send + Sync>;

/// Default service: counts replicated messages and records snapshot loads.
#[derive(Debug)]
pub struct CountingService {
    member_id: MemberId,
    message_count: AtomicU64,
    snapshot_loaded: AtomicBool,
}

impl CountingService {
    pub fn new(member_id: MemberId) -> Self {
        Self {
            member_id,
            message_count: AtomicU64::new(0),
            snapshot_loaded: AtomicBool::new(false),
        }
    }

    pub fn member_id(&self) -> MemberId {
        self.member_id
    }
}

impl ClusterService for CountingService {
    fn on_session_message(
        &self,
        _payload: &[u8],
    ) {
        self.message_count.fetch_add(1, Ordering::Relaxed);
    }

    fn on_snapshot_loaded(&self) {
        self.snapshot_loaded.store(true, Ordering::Relaxed);
    }

    fn message_count(&self) -> u64 {
        self.message_count.load(Ordering::Relaxed)
    }

    fn was_snapshot_loaded(&self) -> bool {
        self.snapshot_loaded.load(Ordering::Relaxed)
    }
}

/// Factory for the default [`CountingService`].
pub fn default_service_factory() -> ServiceFactory {
    Arc::new(|member_id| Arc::new(CountingService::new(member_id)))
}

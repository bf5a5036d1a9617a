use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::waiting::await_condition_with;
use crate::waiting::KeepaliveDeadline;
use crate::ClientConfig;
use crate::ClusterClient;
use crate::ClusterLauncher;
use crate::EgressListener;
use crate::MemberId;
use crate::Result;

/// Session-level counters fed by the egress listener. They outlive the
/// underlying connection: a reconnect rebuilds the transport but keeps
/// counting where it left off.
#[derive(Debug, Default)]
pub struct EgressCounters {
    responses: AtomicU64,
    leadership_events: AtomicU64,
}

impl EgressCounters {
    pub fn response_count(&self) -> u64 {
        self.responses.load(Ordering::Relaxed)
    }

    pub fn leadership_event_count(&self) -> u64 {
        self.leadership_events.load(Ordering::Relaxed)
    }
}

impl EgressListener for EgressCounters {
    fn on_message(
        &self,
        _session_id: u64,
        _timestamp_ms: u64,
        _payload: &[u8],
    ) {
        self.responses.fetch_add(1, Ordering::Relaxed);
    }

    fn on_new_leader(
        &self,
        _session_id: u64,
        _leadership_term: u64,
        _leader_id: MemberId,
    ) {
        self.leadership_events.fetch_add(1, Ordering::Relaxed);
    }
}

/// One ingress/egress session into the cluster, driven the way an external
/// caller would drive it: non-blocking offers with egress pumping on
/// rejection, and keepalive escalation when responses stall.
pub struct ClientSession {
    launcher: Arc<dyn ClusterLauncher>,
    config: ClientConfig,
    counters: Arc<EgressCounters>,
    client: Box<dyn ClusterClient>,
    keepalive_interval: Duration,
}

impl ClientSession {
    pub fn connect(
        launcher: Arc<dyn ClusterLauncher>,
        config: ClientConfig,
        keepalive_interval: Duration,
    ) -> Result<Self> {
        let counters = Arc::new(EgressCounters::default());
        let client = launcher.connect_client(&config, counters.clone())?;
        debug!(member_endpoints = %config.member_endpoints, "client connected");

        Ok(Self {
            launcher,
            config,
            counters,
            client,
            keepalive_interval,
        })
    }

    /// Discard and rebuild the underlying connection. Session counters keep
    /// their values across the reconnect.
    pub fn reconnect(&mut self) -> Result<()> {
        self.client.close();
        self.client = self
            .launcher
            .connect_client(&self.config, self.counters.clone())?;
        debug!("client reconnected");
        Ok(())
    }

    pub fn response_count(&self) -> u64 {
        self.counters.response_count()
    }

    pub fn leadership_event_count(&self) -> u64 {
        self.counters.leadership_event_count()
    }

    /// Offer `payload` until accepted, pumping egress between attempts so
    /// rejection can never deadlock against undelivered responses, then pump
    /// once more to surface anything that already arrived.
    pub fn send_message(
        &self,
        cancel: &CancellationToken,
        payload: &[u8],
    ) -> Result<()> {
        await_condition_with(
            cancel,
            || self.client.offer(payload),
            || {
                self.client.poll_egress();
            },
            "message offer",
        )?;

        self.client.poll_egress();
        Ok(())
    }

    /// Send `count` messages carrying their index as the payload.
    pub fn send_messages(
        &self,
        cancel: &CancellationToken,
        count: u32,
    ) -> Result<()> {
        for i in 0..count {
            self.send_message(cancel, &i.to_le_bytes())?;
        }
        Ok(())
    }

    /// Await at least `count` responses, pumping egress on every iteration.
    /// If no progress is made for one keepalive interval, a keepalive is sent
    /// so an idle session cannot expire mid-wait, and the deadline restarts.
    pub fn await_responses(
        &self,
        cancel: &CancellationToken,
        count: u64,
    ) -> Result<()> {
        let mut deadline = KeepaliveDeadline::new(self.keepalive_interval);

        await_condition_with(
            cancel,
            || self.counters.response_count() >= count,
            || {
                self.client.poll_egress();
                if deadline.expired_then_reset() {
                    self.client.send_keepalive();
                }
            },
            "client responses",
        )
    }

    /// Await at least `count` leadership-change events. No keepalive
    /// escalation: leadership events arrive on their own schedule.
    pub fn await_leadership_event(
        &self,
        cancel: &CancellationToken,
        count: u64,
    ) -> Result<()> {
        await_condition_with(
            cancel,
            || self.counters.leadership_event_count() >= count,
            || {
                self.client.poll_egress();
            },
            "leadership event",
        )
    }

    pub fn poll_egress(&self) -> usize {
        self.client.poll_egress()
    }

    pub fn send_keepalive(&self) {
        self.client.send_keepalive();
    }

    pub fn close(&self) {
        self.client.close();
    }
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        self.close();
    }
}

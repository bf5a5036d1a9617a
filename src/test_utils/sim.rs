use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::BackupNodeConfig;
use crate::BackupRuntime;
use crate::BackupState;
use crate::ClientConfig;
use crate::ClusterClient;
use crate::ClusterLauncher;
use crate::ClusterService;
use crate::ControlToggle;
use crate::EgressListener;
use crate::ElectionState;
use crate::MemberId;
use crate::NodeConfig;
use crate::NodeRole;
use crate::NodeRuntime;
use crate::Result;
use crate::ToggleState;

/// Observations a member must make before an election settles.
pub const ELECTION_TICKS: u64 = 3;

/// Observations between backup catch-up stage transitions.
pub const BACKUP_STAGE_TICKS: u64 = 2;

struct SimMember {
    // Guards stale handles once a slot is relaunched.
    epoch: u64,
    open: bool,
    member_terminated: bool,
    service_terminated: bool,
    snapshot_count: u64,
    toggle: Arc<ControlToggle>,
    service: Arc<dyn ClusterService>,
}

struct SimState {
    members: BTreeMap<MemberId, SimMember>,
    appointed_leader: Option<MemberId>,
    leader: Option<MemberId>,
    election_ticks: u64,
    committed: Vec<Vec<u8>>,
    snapshots_taken: u64,
    next_epoch: u64,
}

impl SimState {
    fn tick(&mut self) {
        self.advance_election();
        self.consume_toggle();
    }

    fn advance_election(&mut self) {
        if self.leader.is_some() {
            return;
        }
        self.election_ticks += 1;
        if self.election_ticks < ELECTION_TICKS {
            return;
        }
        let appointed = self
            .appointed_leader
            .filter(|id| self.members.get(id).is_some_and(|m| m.open));
        let lowest_open = self
            .members
            .iter()
            .find(|(_, m)| m.open)
            .map(|(id, _)| *id);
        self.leader = appointed.or(lowest_open);
    }

    fn consume_toggle(&mut self) {
        let Some(leader_id) = self.leader else {
            return;
        };
        let Some(leader) = self.members.get(&leader_id) else {
            return;
        };
        if !leader.open {
            return;
        }
        let toggle = leader.toggle.clone();
        match toggle.read() {
            ToggleState::Neutral => {}
            ToggleState::Snapshot => {
                self.snapshot_all();
                toggle.complete();
            }
            ToggleState::Shutdown => {
                self.snapshot_all();
                self.terminate_all();
                toggle.complete();
            }
            ToggleState::Abort => {
                self.terminate_all();
                toggle.complete();
            }
        }
    }

    fn snapshot_all(&mut self) {
        self.snapshots_taken += 1;
        for member in self.members.values_mut().filter(|m| m.open) {
            member.snapshot_count += 1;
        }
    }

    fn terminate_all(&mut self) {
        for member in self.members.values_mut().filter(|m| m.open) {
            member.member_terminated = true;
            member.service_terminated = true;
        }
    }

    fn close_member(&mut self, id: MemberId, epoch: u64) {
        match self.members.get_mut(&id) {
            Some(member) if member.epoch == epoch => member.open = false,
            _ => return,
        }
        if self.leader == Some(id) {
            self.leader = None;
            self.election_ticks = 0;
        }
    }

    fn member(&self, id: MemberId, epoch: u64) -> Option<&SimMember> {
        self.members.get(&id).filter(|m| m.epoch == epoch)
    }
}

/// Shared simulated cluster shared by every node, backup and client handle
/// the launcher hands out.
#[derive(Clone)]
pub struct SimEngine {
    state: Arc<Mutex<SimState>>,
}

impl SimEngine {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                members: BTreeMap::new(),
                appointed_leader: None,
                leader: None,
                election_ticks: 0,
                committed: Vec::new(),
                snapshots_taken: 0,
                next_epoch: 0,
            })),
        }
    }

    fn tick(&self) {
        self.state.lock().tick();
    }

    pub fn committed_count(&self) -> u64 {
        self.state.lock().committed.len() as u64
    }

    pub fn snapshots_taken(&self) -> u64 {
        self.state.lock().snapshots_taken
    }
}

impl Default for SimEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Launcher backed by a [`SimEngine`].
pub struct SimLauncher {
    engine: SimEngine,
}

impl SimLauncher {
    pub fn new(engine: SimEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &SimEngine {
        &self.engine
    }
}

impl ClusterLauncher for SimLauncher {
    fn launch_node(
        &self,
        config: &NodeConfig,
        service: Arc<dyn ClusterService>,
    ) -> Result<Box<dyn NodeRuntime>> {
        let mut state = self.engine.state.lock();
        if let Some(appointed) = config.consensus.appointed_leader {
            state.appointed_leader = Some(appointed);
        }
        if !config.consensus.delete_dir_on_start && state.snapshots_taken > 0 {
            service.on_snapshot_loaded();
        }
        state.next_epoch += 1;
        let epoch = state.next_epoch;
        state.members.insert(
            config.id,
            SimMember {
                epoch,
                open: true,
                member_terminated: false,
                service_terminated: false,
                snapshot_count: 0,
                toggle: Arc::new(ControlToggle::new()),
                service,
            },
        );
        Ok(Box::new(SimNodeRuntime {
            id: config.id,
            epoch,
            engine: self.engine.clone(),
        }))
    }

    fn launch_backup_node(&self, _config: &BackupNodeConfig) -> Result<Box<dyn BackupRuntime>> {
        Ok(Box::new(SimBackupRuntime {
            engine: self.engine.clone(),
            ticks: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }))
    }

    fn connect_client(
        &self,
        _config: &ClientConfig,
        listener: Arc<dyn EgressListener>,
    ) -> Result<Box<dyn ClusterClient>> {
        Ok(Box::new(SimClient {
            engine: self.engine.clone(),
            listener,
            delivered: AtomicU64::new(0),
            observed_leader: Mutex::new(None),
            keepalives: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }))
    }
}

struct SimNodeRuntime {
    id: MemberId,
    epoch: u64,
    engine: SimEngine,
}

impl NodeRuntime for SimNodeRuntime {
    fn role(&self) -> NodeRole {
        self.engine.tick();
        let state = self.engine.state.lock();
        match state.leader {
            Some(id) if id == self.id => NodeRole::Leader,
            Some(_) => NodeRole::Follower,
            None => NodeRole::Candidate,
        }
    }

    fn election_state(&self) -> Option<ElectionState> {
        self.engine.tick();
        let state = self.engine.state.lock();
        if state.leader.is_none() {
            Some(ElectionState::Canvass)
        } else {
            None
        }
    }

    fn commit_position(&self) -> u64 {
        self.engine.tick();
        self.engine.state.lock().committed.len() as u64
    }

    fn snapshot_count(&self) -> u64 {
        self.engine.tick();
        let state = self.engine.state.lock();
        state
            .member(self.id, self.epoch)
            .map(|m| m.snapshot_count)
            .unwrap_or(0)
    }

    fn has_member_terminated(&self) -> bool {
        self.engine.tick();
        let state = self.engine.state.lock();
        state
            .member(self.id, self.epoch)
            .map(|m| m.member_terminated)
            .unwrap_or(false)
    }

    fn has_service_terminated(&self) -> bool {
        self.engine.tick();
        let state = self.engine.state.lock();
        state
            .member(self.id, self.epoch)
            .map(|m| m.service_terminated)
            .unwrap_or(false)
    }

    fn control_toggle(&self) -> Option<Arc<ControlToggle>> {
        let state = self.engine.state.lock();
        state.member(self.id, self.epoch).map(|m| m.toggle.clone())
    }

    fn is_closed(&self) -> bool {
        let state = self.engine.state.lock();
        state
            .member(self.id, self.epoch)
            .map(|m| !m.open)
            .unwrap_or(true)
    }

    fn close(&self) {
        self.engine.state.lock().close_member(self.id, self.epoch);
    }
}

struct SimBackupRuntime {
    engine: SimEngine,
    ticks: AtomicU64,
    closed: AtomicBool,
}

impl BackupRuntime for SimBackupRuntime {
    fn state(&self) -> BackupState {
        if self.closed.load(Ordering::Acquire) {
            return BackupState::Closed;
        }
        self.engine.tick();
        let ticks = self.ticks.fetch_add(1, Ordering::AcqRel);
        match ticks / BACKUP_STAGE_TICKS {
            0 => BackupState::BackupQuery,
            1 => BackupState::SnapshotRetrieve,
            2 => BackupState::LiveLogReplay,
            3 => BackupState::UpdateRecordingLog,
            _ => BackupState::BackingUp,
        }
    }

    fn live_log_position(&self) -> u64 {
        self.engine.tick();
        self.engine.state.lock().committed.len() as u64
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

struct SimClient {
    engine: SimEngine,
    listener: Arc<dyn EgressListener>,
    delivered: AtomicU64,
    observed_leader: Mutex<Option<MemberId>>,
    keepalives: AtomicU64,
    closed: AtomicBool,
}

impl ClusterClient for SimClient {
    fn offer(&self, payload: &[u8]) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        self.engine.tick();
        let mut state = self.engine.state.lock();
        if state.leader.is_none() {
            return false;
        }
        state.committed.push(payload.to_vec());
        for member in state.members.values().filter(|m| m.open) {
            member.service.on_session_message(payload);
        }
        true
    }

    fn poll_egress(&self) -> usize {
        if self.closed.load(Ordering::Acquire) {
            return 0;
        }
        self.engine.tick();
        let (leader, echoes) = {
            let state = self.engine.state.lock();
            let delivered = self.delivered.load(Ordering::Acquire) as usize;
            (state.leader, state.committed[delivered..].to_vec())
        };
        let mut observed = self.observed_leader.lock();
        if leader.is_some() && *observed != leader {
            *observed = leader;
            self.listener.on_new_leader(1, 1, leader.unwrap_or(0));
        }
        drop(observed);
        let count = echoes.len();
        for payload in echoes {
            self.listener.on_message(1, 0, &payload);
            self.delivered.fetch_add(1, Ordering::AcqRel);
        }
        count
    }

    fn send_keepalive(&self) {
        self.keepalives.fetch_add(1, Ordering::AcqRel);
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

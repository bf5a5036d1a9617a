mod endpoints;
pub use endpoints::*;


use crate::MemberId;
use crate::Result;
use crate::TopologyError;

/// Cluster shape: how many static and dynamic members, the optional appointed
/// leader, and the single reserved backup slot at index
/// `static_members + dynamic_members`.
///
/// All aggregate endpoint descriptors are derived once at construction, the
/// same way every node and client will re-derive them; they are pure
/// functions of the validated member counts.
#[derive(Debug, Clone)]
pub struct ClusterTopology {
    static_members: u32,
    dynamic_members: u32,
    appointed_leader: Option<MemberId>,

    cluster_members: String,
    client_endpoints: String,
    status_endpoints: String,
    member_endpoints: Vec<String>,
}

impl ClusterTopology {
    /// Build and validate a topology. One slot is always reserved for the
    /// backup node, so `static_members + dynamic_members + 1` must stay below
    /// ten.
    pub fn new(
        static_members: u32,
        dynamic_members: u32,
        appointed_leader: Option<MemberId>,
    ) -> Result<Self> {
        if static_members + dynamic_members + 1 >= crate::MAX_CLUSTER_SLOTS {
            return Err(TopologyError::TooManyMembers {
                static_members,
                dynamic_members,
            }
            .into());
        }

        let member_count = static_members + dynamic_members;
        let member_endpoints = (0..member_count)
            .map(member_endpoints)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            static_members,
            dynamic_members,
            appointed_leader,
            cluster_members: cluster_members_string(static_members)?,
            client_endpoints: client_member_endpoints(static_members)?,
            status_endpoints: status_endpoints_string(static_members)?,
            member_endpoints,
        })
    }

    pub fn static_member_count(&self) -> u32 {
        self.static_members
    }

    pub fn dynamic_member_count(&self) -> u32 {
        self.dynamic_members
    }

    /// Total member slots, excluding the reserved backup slot.
    pub fn member_count(&self) -> u32 {
        self.static_members + self.dynamic_members
    }

    /// Index of the single reserved backup slot.
    pub fn backup_slot_index(&self) -> MemberId {
        self.static_members + self.dynamic_members
    }

    /// Total slots including the backup slot.
    pub fn slot_count(&self) -> usize {
        (self.member_count() + 1) as usize
    }

    pub fn appointed_leader(&self) -> Option<MemberId> {
        self.appointed_leader
    }

    /// `|`-delimited static-members descriptor.
    pub fn cluster_members(&self) -> &str {
        &self.cluster_members
    }

    /// `id=endpoint` list for the client session.
    pub fn client_member_endpoints(&self) -> &str {
        &self.client_endpoints
    }

    /// Comma list of static status endpoints for dynamic join and backup.
    pub fn status_endpoints(&self) -> &str {
        &self.status_endpoints
    }

    /// The given member's own endpoint set (dynamic join).
    pub fn member_endpoints(
        &self,
        id: MemberId,
    ) -> Result<&str> {
        self.member_endpoints
            .get(id as usize)
            .map(String::as_str)
            .ok_or_else(|| TopologyError::InvalidMemberId(id).into())
    }
}

//! Deterministic endpoint allocation.
//!
//! Every endpoint is a pure function of the member id: the decimal id is
//! appended to a fixed per-family port base, e.g. member 2's log endpoint is
//! `localhost:20332`. Distinct ids can therefore never collide, but only
//! while ids stay single-digit; the topology bound enforces exactly that and
//! the coupling is intentional rather than an accident to generalize away.

use crate::constants::ARCHIVE_CONTROL_REQUEST_PORT_BASE;
use crate::constants::ARCHIVE_CONTROL_RESPONSE_PORT_BASE;
use crate::constants::ENDPOINT_HOST;
use crate::constants::INGRESS_PORT_BASE;
use crate::constants::LOG_PORT_BASE;
use crate::constants::MAX_CLUSTER_SLOTS;
use crate::constants::MEMBER_STATUS_PORT_BASE;
use crate::constants::TRANSFER_PORT_BASE;
use crate::MemberId;
use crate::Result;
use crate::TopologyError;

/// The five channel families a member owns an endpoint in, plus the archive
/// control response channel allocated alongside them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelFamily {
    /// Client ingress / log subscription
    Ingress,
    /// Member-status (consensus) channel, also used by dynamic join and backup
    MemberStatus,
    /// Replicated log channel
    Log,
    /// Snapshot/log transfer channel for catch-up
    Transfer,
    ArchiveControlRequest,
    ArchiveControlResponse,
}

impl ChannelFamily {
    pub fn port_base(&self) -> u32 {
        match self {
            ChannelFamily::Ingress => INGRESS_PORT_BASE,
            ChannelFamily::MemberStatus => MEMBER_STATUS_PORT_BASE,
            ChannelFamily::Log => LOG_PORT_BASE,
            ChannelFamily::Transfer => TRANSFER_PORT_BASE,
            ChannelFamily::ArchiveControlRequest => ARCHIVE_CONTROL_REQUEST_PORT_BASE,
            ChannelFamily::ArchiveControlResponse => ARCHIVE_CONTROL_RESPONSE_PORT_BASE,
        }
    }
}

/// Derive the endpoint for one member in one channel family.
pub fn endpoint(
    family: ChannelFamily,
    id: MemberId,
) -> Result<String> {
    validate_member_id(id)?;
    Ok(format!("{ENDPOINT_HOST}:{}{id}", family.port_base()))
}

/// One `,`-delimited member record: id followed by the ingress, status, log,
/// transfer and archive-control endpoints.
pub fn member_record(id: MemberId) -> Result<String> {
    validate_member_id(id)?;
    Ok(format!(
        "{id},{},{},{},{},{}",
        endpoint(ChannelFamily::Ingress, id)?,
        endpoint(ChannelFamily::MemberStatus, id)?,
        endpoint(ChannelFamily::Log, id)?,
        endpoint(ChannelFamily::Transfer, id)?,
        endpoint(ChannelFamily::ArchiveControlRequest, id)?,
    ))
}

/// The `|`-delimited static-members descriptor handed to every static node.
pub fn cluster_members_string(member_count: u32) -> Result<String> {
    let records = (0..member_count)
        .map(member_record)
        .collect::<Result<Vec<_>>>()?;
    Ok(records.join("|"))
}

/// Single-member descriptor used when rebuilding the backup slot as a
/// one-node static cluster.
pub fn single_member_string(id: MemberId) -> Result<String> {
    member_record(id)
}

/// `id=ingressEndpoint` list the client uses to reach the static members.
pub fn client_member_endpoints(member_count: u32) -> Result<String> {
    let entries = (0..member_count)
        .map(|id| Ok(format!("{id}={}", endpoint(ChannelFamily::Ingress, id)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(entries.join(","))
}

/// A member's own endpoint set, carried by a dynamically joining node.
pub fn member_endpoints(id: MemberId) -> Result<String> {
    validate_member_id(id)?;
    Ok(format!(
        "{},{},{},{},{}",
        endpoint(ChannelFamily::Ingress, id)?,
        endpoint(ChannelFamily::MemberStatus, id)?,
        endpoint(ChannelFamily::Log, id)?,
        endpoint(ChannelFamily::Transfer, id)?,
        endpoint(ChannelFamily::ArchiveControlRequest, id)?,
    ))
}

/// Comma list of the static members' status endpoints, used by dynamic join
/// and by the backup node to query the cluster.
pub fn status_endpoints_string(static_member_count: u32) -> Result<String> {
    let entries = (0..static_member_count)
        .map(|id| endpoint(ChannelFamily::MemberStatus, id))
        .collect::<Result<Vec<_>>>()?;
    Ok(entries.join(","))
}

/// The backup node's own status endpoint at the reserved slot index.
pub fn backup_status_endpoint(backup_slot_index: MemberId) -> Result<String> {
    endpoint(ChannelFamily::MemberStatus, backup_slot_index)
}

/// The backup node's transfer endpoint at the reserved slot index.
pub fn backup_transfer_endpoint(backup_slot_index: MemberId) -> Result<String> {
    endpoint(ChannelFamily::Transfer, backup_slot_index)
}

fn validate_member_id(id: MemberId) -> Result<()> {
    if id >= MAX_CLUSTER_SLOTS {
        return Err(TopologyError::InvalidMemberId(id).into());
    }
    Ok(())
}

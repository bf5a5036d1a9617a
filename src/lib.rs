//! Integration-test harness for multi-node replicated state-machine clusters.
//!
//! The harness owns cluster topology (membership, deterministic endpoint
//! allocation, the reserved backup slot), the lifecycle of each member's
//! process group, the cross-process control-toggle signaling protocol
//! (snapshot / shutdown / abort), and a family of poll-until-condition
//! primitives that synchronize the single test-driver thread with
//! independently scheduled cluster state.
//!
//! The consensus engine itself, log storage, network transport and the client
//! RPC library are external collaborators reached through the narrow trait
//! contracts in the runtime module: the harness starts them as opaque units,
//! observes published status, and writes control requests into a shared
//! register.

mod client;
mod config;
mod constants;
mod control;
mod errors;
mod harness;
mod lifecycle;
mod runtime;
mod topology;
mod waiting;

pub use client::*;
pub use config::*;
pub use constants::MAX_CLUSTER_SLOTS;
pub use control::*;
pub use errors::*;
pub use harness::*;
pub use lifecycle::*;
pub use runtime::*;
pub use topology::*;
pub use waiting::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;

/// Identifier of a cluster member. Contiguous, 0-based, and single-digit by
/// construction (see [`ClusterTopology`]).
pub type MemberId = u32;

//! In-process simulated replication engine for exercising the harness
//! without real processes or sockets.
//!
//! The simulation is deterministic and poll-driven: cluster state only
//! advances when the harness observes it, which is exactly the cadence the
//! busy-poll awaits produce. Elections settle after a fixed number of
//! observations, control-toggle requests are consumed on the next
//! observation, and client offers are rejected until a leader exists.

mod sim;

pub use sim::*;

mod session;
pub use session::*;


/// Connection parameters for a client session against the static members.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// `id=endpoint` list of the static members' ingress endpoints
    pub member_endpoints: String,
}

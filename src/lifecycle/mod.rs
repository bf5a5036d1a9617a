mod handle;
mod manager;
mod node_config;

pub use handle::*;
pub use manager::*;
pub use node_config::*;

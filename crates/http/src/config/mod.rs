//! Configuration for the gate, its session client and the upstream proxy

pub mod gate;
pub mod routes;

pub use gate::{GateConfig, SessionClientConfig, UpstreamConfig};
pub use routes::{RouteTable, has_path_prefix};

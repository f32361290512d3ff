//! Clients for the services the gate depends on

pub mod session;

pub use session::HttpSessionProvider;

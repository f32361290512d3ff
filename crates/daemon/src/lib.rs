//! Bezs gate daemon: settings loading and server composition

pub mod config;
pub mod error;
pub mod runtime;

pub use config::Settings;
pub use error::{DaemonError, Result};
pub use runtime::Runtime;

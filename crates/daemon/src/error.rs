use bezs_http::HttpError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP setup failed: {0}")]
    Http(#[from] HttpError),
}

pub type Result<T> = std::result::Result<T, DaemonError>;

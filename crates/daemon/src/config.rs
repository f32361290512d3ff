//! Configuration management for the Bezs gate daemon
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! environment variables prefixed with `BEZS` using `__` between sections
//! (`BEZS_SERVER__PORT=9000`, `BEZS_ROUTES__ADMIN_ROLE=owner`).

use bezs_core::{ValidateConfig, validators};
use bezs_http::config::{GateConfig, RouteTable, SessionClientConfig, UpstreamConfig};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "BEZS";

/// Main daemon settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Listener configuration
    pub server: ServerConfig,
    /// Session lookups against the auth service
    pub session: SessionClientConfig,
    /// Gate behavior
    pub gate: GateConfig,
    /// The web application behind the gate
    pub upstream: UpstreamConfig,
    /// Route classification
    pub routes: RouteTable,
}

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Settings {
    /// Load settings from defaults and the environment only
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder(None)?.build()?.try_deserialize()
    }

    /// Load settings from defaults, a TOML file and the environment
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        Self::builder(Some(path))?.build()?.try_deserialize()
    }

    fn builder(
        path: Option<&str>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let mut builder = Config::builder();

        // Start with defaults
        builder = builder.add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }

        // Environment variables override file settings
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder)
    }
}

impl ValidateConfig for ServerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        validators::validate_not_empty(&self.host, "server.host")?;
        validators::validate_port(self.port, "server.port")?;
        Ok(())
    }
}

impl ValidateConfig for Settings {
    fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.session.validate()?;
        self.gate.validate()?;
        self.upstream.validate()?;
        self.routes.validate()?;
        Ok(())
    }
}

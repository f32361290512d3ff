//! Gate, session client and upstream settings

use bezs_core::{ValidateConfig, validators};
use config::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Behavior of the access gate itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Upper bound on a session lookup; a slower lookup counts as no session
    pub session_timeout_ms: u64,
    /// Externally visible origin used to build the original URL
    /// (e.g. `https://app.bezs.dev`). Falls back to the `Host` header.
    pub public_base_url: Option<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            session_timeout_ms: 5_000,
            public_base_url: None,
        }
    }
}

impl GateConfig {
    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms)
    }
}

impl ValidateConfig for GateConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        validators::validate_range(self.session_timeout_ms, 1, 60_000, "gate.session_timeout_ms")?;
        if let Some(base) = &self.public_base_url {
            validators::validate_url(base, "gate.public_base_url")?;
        }
        Ok(())
    }
}

/// Where sessions are looked up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionClientConfig {
    /// Base URL of the authentication service
    pub base_url: String,
    /// Path of the session introspection endpoint
    pub session_path: String,
}

impl Default for SessionClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            session_path: "/api/auth/get-session".to_string(),
        }
    }
}

impl SessionClientConfig {
    /// Full URL of the session endpoint
    pub fn endpoint(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.session_path
        )
    }
}

impl ValidateConfig for SessionClientConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        validators::validate_url(&self.base_url, "session.base_url")?;
        validators::validate_absolute_path(&self.session_path, "session.session_path")?;
        Ok(())
    }
}

/// The web application the gate fronts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL requests are forwarded to; no proxying when unset
    pub base_url: Option<String>,
    /// Timeout for a single upstream request
    pub timeout_seconds: u64,
    /// Largest request body buffered for forwarding
    pub max_body_bytes: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_seconds: 30,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ValidateConfig for UpstreamConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(base) = &self.base_url {
            validators::validate_url(base, "upstream.base_url")?;
        }
        validators::validate_range(self.timeout_seconds, 1, 600, "upstream.timeout_seconds")?;
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Message(
                "upstream.max_body_bytes: must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

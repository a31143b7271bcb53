pub mod error;
pub mod loader;

use serde::Deserialize;
use std::time::Duration;

pub use error::ConfigError;
pub use loader::read_config;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8083";
pub const DEFAULT_BASE_PATH: &str = "/debezium";
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 30_000;

/// Process-wide settings for the validation service.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    pub server: ServerSettings,
    pub probe: ProbeSettings,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSettings {
    /// Socket address the HTTP endpoint binds to.
    pub addr: String,
    /// Prefix for every connector route, e.g. `/debezium`.
    pub base_path: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            base_path: DEFAULT_BASE_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeSettings {
    /// Upper bound for one connectivity probe, measured from call entry.
    pub timeout_ms: u64,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
        }
    }
}

impl ProbeSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl ValidatorConfig {
    /// Checks values serde cannot express as types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.probe.timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "probe.timeout_ms must be greater than zero",
            ));
        }
        if !self.server.base_path.starts_with('/') {
            return Err(ConfigError::invalid_value(format!(
                "server.base_path '{}' must start with '/'",
                self.server.base_path
            )));
        }
        if self.server.addr.trim().is_empty() {
            return Err(ConfigError::invalid_value("server.addr must not be empty"));
        }
        Ok(())
    }

    /// Applies command line overrides on top of the file values.
    pub fn with_overrides(mut self, addr: Option<String>, probe_timeout_ms: Option<u64>) -> Self {
        if let Some(addr) = addr {
            self.server.addr = addr;
        }
        if let Some(timeout_ms) = probe_timeout_ms {
            self.probe.timeout_ms = timeout_ms;
        }
        self
    }

    /// Base path without a trailing slash, so routes can be appended directly.
    pub fn base_path(&self) -> &str {
        let trimmed = self.server.base_path.trim_end_matches('/');
        if trimmed.is_empty() {
            ""
        } else {
            trimmed
        }
    }
}

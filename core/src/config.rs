//! Coordinator configuration.
//!
//! Loaded from TOML, then optionally overridden from the environment:
//!
//! ```toml
//! cache_path = "/var/lib/app/http-cache"
//! cache_capacity_bytes = 67108864
//! start_connected = true
//! probe_addr = "example.com:443"
//! probe_interval_ms = 5000
//! probe_timeout_ms = 2000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::connectivity::ProbeMonitor;
use crate::error::ConfigError;

pub const ENV_CACHE_PATH: &str = "COURIER_CACHE_PATH";
pub const ENV_PROBE_ADDR: &str = "COURIER_PROBE_ADDR";
pub const ENV_PROBE_INTERVAL_MS: &str = "COURIER_PROBE_INTERVAL_MS";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory of the durable response cache; in-memory when unset.
    pub cache_path: Option<PathBuf>,
    pub cache_capacity_bytes: u64,
    pub start_connected: bool,
    /// `host:port` probed for reachability; no probing when unset.
    pub probe_addr: Option<String>,
    pub probe_interval_ms: u64,
    pub probe_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_path: None,
            cache_capacity_bytes: 64 * 1024 * 1024,
            start_connected: true,
            probe_addr: None,
            probe_interval_ms: 5_000,
            probe_timeout_ms: 2_000,
        }
    }
}

impl Config {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Apply `COURIER_*` overrides from the process environment.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(path) = lookup(ENV_CACHE_PATH) {
            self.cache_path = Some(PathBuf::from(path));
        }
        if let Some(addr) = lookup(ENV_PROBE_ADDR) {
            self.probe_addr = Some(addr);
        }
        if let Some(raw) = lookup(ENV_PROBE_INTERVAL_MS) {
            self.probe_interval_ms = raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_PROBE_INTERVAL_MS,
                value: raw.clone(),
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.probe_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "probe_interval_ms",
                value: "0".to_string(),
            });
        }
        if self.probe_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "probe_timeout_ms",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// A probe monitor for `probe_addr`, if one is configured. Must be called
    /// within a tokio runtime.
    pub fn probe_monitor(&self) -> Option<ProbeMonitor> {
        let addr = self.probe_addr.as_ref()?;
        Some(ProbeMonitor::spawn(
            addr.clone(),
            Duration::from_millis(self.probe_interval_ms),
            Duration::from_millis(self.probe_timeout_ms),
            self.start_connected,
        ))
    }
}

//! Deploy configuration: endpoint and HTTP timeout

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{DeployError, Result};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct DeployConfig {
    /// Base URL of the dynamic deploy service, without the `/add` suffix
    pub endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl DeployConfig {
    /// Load and parse a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_str = fs::read_to_string(path).map_err(|e| {
            DeployError::ConfigError(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&config_str).map_err(|e| {
            DeployError::ConfigError(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Fields set in `overrides` take precedence over `self`.
    pub fn merge(self, overrides: DeployConfig) -> Self {
        Self {
            endpoint: overrides.endpoint.or(self.endpoint),
            timeout_secs: overrides.timeout_secs.or(self.timeout_secs),
        }
    }

    pub fn endpoint(&self) -> Result<&str> {
        match self.endpoint.as_deref().map(str::trim) {
            Some(endpoint) if !endpoint.is_empty() => Ok(endpoint),
            _ => Err(DeployError::ConfigError(
                "dynamic_deploy_endpoint is required".to_string(),
            )),
        }
    }

    pub fn timeout(&self) -> Result<Duration> {
        match self.timeout_secs {
            Some(0) => Err(DeployError::ConfigError(
                "timeout_secs must be greater than zero".to_string(),
            )),
            Some(secs) => Ok(Duration::from_secs(secs)),
            None => Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }
}

use super::types::{EngineConfig, InstanceLimits, ResourceBounds, SessionTiming};
use crate::error_handling::types::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration, loaded from a TOML file before the manager
/// starts.
///
/// Every section is optional in the file; missing sections fall back to
/// the defaults below, so an empty file is a valid configuration.
///
/// # Fields Overview
///
/// - `bounds`: inclusive RAM/CPU/disk bounds a create request must satisfy
/// - `instances`: instance-count ceiling and name prefix
/// - `engine`: container image and per-instance storage root
/// - `session`: bootstrap timing constants for session establishment
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bounds: ResourceBounds,
    pub instances: InstanceLimits,
    pub engine: EngineConfig,
    pub session: SessionTiming,
}

impl Config {
    /// Reads and validates a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&raw).map_err(|e| ConfigError::TomlError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Sanity-checks the loaded values.
    ///
    /// Rejects inverted bounds, a zero instance ceiling and an empty name
    /// prefix rather than letting them surface as confusing behavior later.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bounds.min_ram_gb > self.bounds.max_ram_gb {
            return Err(ConfigError::NotInRange(format!(
                "min_ram_gb {} exceeds max_ram_gb {}",
                self.bounds.min_ram_gb, self.bounds.max_ram_gb
            )));
        }
        if self.bounds.min_cpu_cores > self.bounds.max_cpu_cores {
            return Err(ConfigError::NotInRange(format!(
                "min_cpu_cores {} exceeds max_cpu_cores {}",
                self.bounds.min_cpu_cores, self.bounds.max_cpu_cores
            )));
        }
        if self.bounds.min_disk_gb > self.bounds.max_disk_gb {
            return Err(ConfigError::NotInRange(format!(
                "min_disk_gb {} exceeds max_disk_gb {}",
                self.bounds.min_disk_gb, self.bounds.max_disk_gb
            )));
        }
        if self.instances.max_count == 0 {
            return Err(ConfigError::NotInRange(String::from(
                "instances.max_count must be at least 1",
            )));
        }
        if self.instances.name_prefix.is_empty() {
            return Err(ConfigError::BadPrefix(String::from(
                "instances.name_prefix must not be empty",
            )));
        }
        Ok(())
    }
}

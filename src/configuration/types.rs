use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Inclusive bounds a creation request must fall inside.
///
/// These are configuration, not business logic: deployments with bigger
/// hosts raise them in the config file.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceBounds {
    pub min_ram_gb: u64,
    pub max_ram_gb: u64,
    pub min_cpu_cores: u64,
    pub max_cpu_cores: u64,
    pub min_disk_gb: u64,
    pub max_disk_gb: u64,
}

impl Default for ResourceBounds {
    fn default() -> Self {
        Self {
            min_ram_gb: 1,
            max_ram_gb: 32,
            min_cpu_cores: 1,
            max_cpu_cores: 16,
            min_disk_gb: 5,
            max_disk_gb: 500,
        }
    }
}

impl ResourceBounds {
    /// Checks a requested allocation against the configured bounds.
    ///
    /// Pure check, no partial success: any single violation rejects the
    /// whole request.
    pub fn validate(&self, ram_gb: u64, cpu_cores: u64, disk_gb: u64) -> bool {
        if ram_gb < self.min_ram_gb || ram_gb > self.max_ram_gb {
            return false;
        }
        if cpu_cores < self.min_cpu_cores || cpu_cores > self.max_cpu_cores {
            return false;
        }
        if disk_gb < self.min_disk_gb || disk_gb > self.max_disk_gb {
            return false;
        }
        true
    }
}

/// Ceiling and naming scheme for instance records.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceLimits {
    /// Maximum number of instances tracked at once.
    pub max_count: usize,
    /// Prefix for generated instance names, e.g. `vps-`.
    pub name_prefix: String,
}

impl Default for InstanceLimits {
    fn default() -> Self {
        Self {
            max_count: 10,
            name_prefix: String::from("vps-"),
        }
    }
}

/// Parameters handed to the container engine when creating instances.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Image every instance boots from.
    pub image: String,
    /// Host directory under which each instance gets a writable mount.
    pub storage_root: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            image: String::from("warden-ubuntu:24.04"),
            storage_root: PathBuf::from("/var/lib/warden/containers"),
        }
    }
}

/// Timing constants for the session bootstrap sequence.
///
/// The in-container OS needs a settle period after start, the daemon needs
/// a moment after launch, and the status query is polled on a fixed budget.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTiming {
    /// Wait after the container reports running before issuing commands.
    pub settle_delay_secs: u64,
    /// Wait between launching the daemon and the first status poll.
    pub daemon_start_delay_secs: u64,
    /// Status poll attempts before giving up.
    pub poll_attempts: u32,
    /// Wait between consecutive poll attempts.
    pub poll_delay_secs: u64,
    /// Wait between killing the old daemon and relaunching on refresh.
    pub restart_delay_secs: u64,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            settle_delay_secs: 5,
            daemon_start_delay_secs: 3,
            poll_attempts: 5,
            poll_delay_secs: 2,
            restart_delay_secs: 1,
        }
    }
}

impl SessionTiming {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    pub fn daemon_start_delay(&self) -> Duration {
        Duration::from_secs(self.daemon_start_delay_secs)
    }

    pub fn poll_delay(&self) -> Duration {
        Duration::from_secs(self.poll_delay_secs)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.restart_delay_secs)
    }
}

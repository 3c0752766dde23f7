//! Core types exchanged with the container engine adapter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Label marking a container as owned by this system.
pub const OWNER_LABEL: &str = "warden";
/// Value stored under [`OWNER_LABEL`].
pub const OWNER_LABEL_VALUE: &str = "true";
/// Label carrying the requested RAM in GB.
pub const RAM_LABEL: &str = "warden.ram";
/// Label carrying the requested CPU core count.
pub const CPU_LABEL: &str = "warden.cpu";
/// Label carrying the requested disk size in GB.
pub const DISK_LABEL: &str = "warden.disk";

/// Requested allocation for one instance. Immutable once set.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub ram_gb: u64,
    pub cpu_cores: u64,
    pub disk_gb: u64,
}

impl ResourceSpec {
    /// Encodes the allocation into engine labels for later reconciliation.
    pub fn to_labels(&self) -> HashMap<String, String> {
        let mut labels = HashMap::new();
        labels.insert(OWNER_LABEL.to_string(), OWNER_LABEL_VALUE.to_string());
        labels.insert(RAM_LABEL.to_string(), self.ram_gb.to_string());
        labels.insert(CPU_LABEL.to_string(), self.cpu_cores.to_string());
        labels.insert(DISK_LABEL.to_string(), self.disk_gb.to_string());
        labels
    }

    /// Rebuilds an allocation from engine labels.
    ///
    /// Missing or malformed labels fall back to the smallest allocation
    /// (1 GB RAM, 1 core, 10 GB disk) rather than dropping the container.
    pub fn from_labels(labels: &HashMap<String, String>) -> Self {
        let read = |key: &str, fallback: u64| {
            labels
                .get(key)
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(fallback)
        };
        Self {
            ram_gb: read(RAM_LABEL, 1),
            cpu_cores: read(CPU_LABEL, 1),
            disk_gb: read(DISK_LABEL, 10),
        }
    }
}

/// Everything the engine needs to create one instance container.
#[derive(Debug, Clone)]
pub struct CreateSpec {
    /// Container name, doubles as the instance name.
    pub name: String,
    /// Image to boot.
    pub image: String,
    /// Host directory under which the instance's writable mount lives.
    pub storage_root: PathBuf,
    /// Allocation to enforce and to encode into labels.
    pub resources: ResourceSpec,
}

/// Run-status of a container as reported by the engine.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RunStatus {
    Running,
    Stopped,
    /// The engine has no container under that reference anymore.
    Absent,
}

/// Result of executing a command inside a container.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub exit_code: i32,
    /// Combined stdout and stderr.
    pub output: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// One owned container as returned by a tagged listing.
#[derive(Debug, Clone)]
pub struct TaggedContainer {
    /// Opaque engine reference (container id).
    pub engine_ref: String,
    /// Container name as assigned at creation.
    pub name: String,
    pub running: bool,
    pub labels: HashMap<String, String>,
    pub created_at: Option<DateTime<Utc>>,
}

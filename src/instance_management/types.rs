//! Records and views for tracked instances.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::container_engine::types::ResourceSpec;

/// Lifecycle state of one instance.
///
/// `Creating -> Running -> {Stopped, Error}`; a stopped instance can only
/// be deleted. `Unknown` is reported when the engine cannot answer a
/// status query and the cached state is no longer trustworthy.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum LifecycleState {
    Creating,
    Running,
    Stopped,
    Error,
    Unknown,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LifecycleState::Creating => "creating",
            LifecycleState::Running => "running",
            LifecycleState::Stopped => "stopped",
            LifecycleState::Error => "error",
            LifecycleState::Unknown => "unknown",
        };
        write!(f, "{}", label)
    }
}

/// The unit of state tracked by the registry.
///
/// `engine_ref` is set exactly once, when the underlying container exists,
/// and cleared only by deletion. `session` stays valid once set until an
/// explicit refresh or deletion; expiry is not detected here.
#[derive(Debug, Clone)]
pub struct InstanceRecord {
    pub name: String,
    pub resources: ResourceSpec,
    pub engine_ref: Option<String>,
    pub state: LifecycleState,
    pub session: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl InstanceRecord {
    /// Fresh record for a validated create request.
    pub fn new(name: String, resources: ResourceSpec) -> Self {
        Self {
            name,
            resources,
            engine_ref: None,
            state: LifecycleState::Creating,
            session: None,
            created_at: Utc::now(),
        }
    }

    /// Public snapshot handed to callers; engine internals stay private.
    pub fn view(&self) -> InstanceView {
        InstanceView {
            name: self.name.clone(),
            resources: self.resources,
            state: self.state,
            session: self.session.clone(),
            created_at: self.created_at,
        }
    }
}

/// Serializable snapshot of a record, as returned by manager operations.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct InstanceView {
    pub name: String,
    pub resources: ResourceSpec,
    pub state: LifecycleState,
    pub session: Option<String>,
    pub created_at: DateTime<Utc>,
}

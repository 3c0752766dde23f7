use log::{debug, info, warn};
use std::collections::HashMap;

use crate::container_engine::types::ResourceSpec;
use crate::container_engine::ContainerEngine;
use crate::error_handling::types::EngineError;
use crate::instance_management::types::{InstanceRecord, LifecycleState};

/// In-memory map of instance name to record.
///
/// Single source of truth for lifecycle state, exclusively owned by the
/// lifecycle manager; the engine remains the source of truth for container
/// run-status, which callers re-read through the manager rather than
/// trusting this cache.
pub struct InstanceRegistry {
    records: HashMap<String, InstanceRecord>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    pub fn insert(&mut self, record: InstanceRecord) {
        debug!("registering instance {}", record.name);
        self.records.insert(record.name.clone(), record);
    }

    pub fn get(&self, name: &str) -> Option<&InstanceRecord> {
        self.records.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut InstanceRecord> {
        self.records.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<InstanceRecord> {
        let removed = self.records.remove(name);
        if removed.is_some() {
            debug!("unregistered instance {}", name);
        }
        removed
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Instance names in stable (sorted) order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.records.keys().cloned().collect();
        names.sort();
        names
    }

    /// Rebuilds the registry from the engine's tagged containers.
    ///
    /// Containers carrying the ownership label and the configured name
    /// prefix become records again, with their allocation decoded from the
    /// resource labels and their state classified from the run flag.
    /// Containers that have disappeared are simply not resurrected.
    pub async fn reconcile(
        &mut self,
        engine: &dyn ContainerEngine,
        name_prefix: &str,
    ) -> Result<(), EngineError> {
        let tagged = engine.list_tagged().await?;
        self.records.clear();

        for container in tagged {
            if !container.name.starts_with(name_prefix) {
                warn!(
                    "ignoring tagged container {} without prefix {}",
                    container.name, name_prefix
                );
                continue;
            }
            let record = InstanceRecord {
                name: container.name.clone(),
                resources: ResourceSpec::from_labels(&container.labels),
                engine_ref: Some(container.engine_ref),
                state: if container.running {
                    LifecycleState::Running
                } else {
                    LifecycleState::Stopped
                },
                session: None,
                created_at: container.created_at.unwrap_or_else(chrono::Utc::now),
            };
            self.records.insert(container.name, record);
        }

        info!("reconciled {} existing instances", self.records.len());
        Ok(())
    }
}

impl Default for InstanceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

use chrono::Utc;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::configuration::config::Config;
use crate::configuration::types::SessionTiming;
use crate::container_engine::types::{CreateSpec, ResourceSpec, RunStatus};
use crate::container_engine::ContainerEngine;
use crate::error_handling::types::ManagerError;
use crate::instance_management::registry::InstanceRegistry;
use crate::instance_management::types::{InstanceRecord, InstanceView, LifecycleState};
use crate::session_management::SessionEstablisher;

/// Orchestrates the instance lifecycle: create, stop, delete, session
/// refresh and listing.
///
/// Creation runs as a fire-and-forget background task so callers get their
/// record back immediately and poll for readiness. The registry is the only
/// shared mutable structure; engine calls and delays always happen outside
/// its lock.
pub struct VpsManager {
    engine: Arc<dyn ContainerEngine>,
    registry: Arc<Mutex<InstanceRegistry>>,
    config: Config,
}

impl VpsManager {
    /// Builds the manager and reconciles the registry against the engine.
    ///
    /// A failing reconciliation logs and starts empty rather than refusing
    /// to come up; the engine may simply not have answered yet.
    pub async fn new(engine: Arc<dyn ContainerEngine>, config: Config) -> Self {
        let mut registry = InstanceRegistry::new();
        if let Err(e) = registry
            .reconcile(engine.as_ref(), &config.instances.name_prefix)
            .await
        {
            warn!("startup reconciliation failed: {}", e);
        }
        Self {
            engine,
            registry: Arc::new(Mutex::new(registry)),
            config,
        }
    }

    /// Validates and registers a new instance, then launches container
    /// creation plus session establishment in the background.
    ///
    /// The returned snapshot is in `Creating` state; callers poll
    /// [`VpsManager::get_info`] for readiness.
    pub async fn create(
        &self,
        ram_gb: u64,
        cpu_cores: u64,
        disk_gb: u64,
    ) -> Result<InstanceView, ManagerError> {
        if !self.config.bounds.validate(ram_gb, cpu_cores, disk_gb) {
            return Err(ManagerError::InvalidResources);
        }
        let resources = ResourceSpec {
            ram_gb,
            cpu_cores,
            disk_gb,
        };

        let view = {
            let mut registry = self.registry.lock().await;
            if registry.len() >= self.config.instances.max_count {
                return Err(ManagerError::CapacityExceeded);
            }
            let name = unique_name(&registry, &self.config.instances.name_prefix);
            let record = InstanceRecord::new(name, resources);
            let view = record.view();
            registry.insert(record);
            view
        };

        info!("instance {} creation started", view.name);
        self.spawn_setup_task(view.name.clone(), resources);
        Ok(view)
    }

    /// Current snapshot of one instance, with its state re-read from the
    /// engine when a container exists.
    pub async fn get_info(&self, name: &str) -> Option<InstanceView> {
        let engine_ref = {
            let registry = self.registry.lock().await;
            match registry.get(name) {
                Some(record) => record.engine_ref.clone(),
                None => return None,
            }
        };

        let fresh_state = match engine_ref {
            Some(engine_ref) => Some(self.read_state(name, &engine_ref).await),
            None => None,
        };

        let mut registry = self.registry.lock().await;
        let record = registry.get_mut(name)?;
        if let Some(state) = fresh_state {
            record.state = state;
        }
        Some(record.view())
    }

    /// Snapshots of all known instances, freshest state included.
    pub async fn list(&self) -> Vec<InstanceView> {
        let names = self.registry.lock().await.names();
        let mut views = Vec::with_capacity(names.len());
        for name in names {
            if let Some(view) = self.get_info(&name).await {
                views.push(view);
            }
        }
        views
    }

    /// Stops the instance's container. A stopped instance can only be
    /// deleted; there is no restart.
    pub async fn stop(&self, name: &str) -> Result<InstanceView, ManagerError> {
        let engine_ref = self.engine_ref_of(name).await?;
        self.engine.stop(&engine_ref).await?;

        let mut registry = self.registry.lock().await;
        match registry.get_mut(name) {
            Some(record) => {
                record.state = LifecycleState::Stopped;
                info!("instance {} stopped", name);
                Ok(record.view())
            }
            None => Err(ManagerError::NotFound),
        }
    }

    /// Unregisters the instance and force-removes its container.
    ///
    /// The record goes first so a racing background setup task sees it gone;
    /// container removal is best-effort and never blocks unregistering.
    pub async fn delete(&self, name: &str) -> Result<(), ManagerError> {
        let engine_ref = {
            let mut registry = self.registry.lock().await;
            let record = registry.remove(name).ok_or(ManagerError::NotFound)?;
            record.engine_ref
        };

        if let Some(engine_ref) = engine_ref {
            if let Err(e) = self.engine.remove(&engine_ref).await {
                warn!("container removal failed for {}: {}", name, e);
            }
        }
        info!("instance {} deleted", name);
        Ok(())
    }

    /// Tears down and relaunches the session daemon, then polls once more.
    ///
    /// Only a successful attempt overwrites the stored connection string;
    /// a failed refresh leaves the previous one in place and reports why.
    pub async fn refresh_session(&self, name: &str) -> Result<InstanceView, ManagerError> {
        let engine_ref = self.engine_ref_of(name).await?;

        let establisher =
            SessionEstablisher::new(Arc::clone(&self.engine), self.config.session.clone());
        let session = establisher.refresh(&engine_ref).await?;

        let mut registry = self.registry.lock().await;
        match registry.get_mut(name) {
            Some(record) => {
                record.session = Some(session);
                info!("session refreshed for {}", name);
                Ok(record.view())
            }
            None => Err(ManagerError::NotFound),
        }
    }

    async fn engine_ref_of(&self, name: &str) -> Result<String, ManagerError> {
        let registry = self.registry.lock().await;
        let record = registry.get(name).ok_or(ManagerError::NotFound)?;
        record.engine_ref.clone().ok_or(ManagerError::NoContainer)
    }

    async fn read_state(&self, name: &str, engine_ref: &str) -> LifecycleState {
        match self.engine.get_status(engine_ref).await {
            Ok(RunStatus::Running) => LifecycleState::Running,
            Ok(RunStatus::Stopped) => LifecycleState::Stopped,
            Ok(RunStatus::Absent) => {
                warn!("container for {} has disappeared", name);
                LifecycleState::Unknown
            }
            Err(e) => {
                warn!("status query failed for {}: {}", name, e);
                LifecycleState::Unknown
            }
        }
    }

    fn spawn_setup_task(&self, name: String, resources: ResourceSpec) {
        let engine = Arc::clone(&self.engine);
        let registry = Arc::clone(&self.registry);
        let timing = self.config.session.clone();
        let spec = CreateSpec {
            name,
            image: self.config.engine.image.clone(),
            storage_root: self.config.engine.storage_root.clone(),
            resources,
        };
        tokio::spawn(async move {
            setup_instance(engine, registry, spec, timing).await;
        });
    }
}

/// Background half of `create`: container creation followed by session
/// establishment, in documented order, with every failure captured on the
/// record rather than reported out-of-band.
async fn setup_instance(
    engine: Arc<dyn ContainerEngine>,
    registry: Arc<Mutex<InstanceRegistry>>,
    spec: CreateSpec,
    timing: SessionTiming,
) {
    let engine_ref = match engine.create(&spec).await {
        Ok(engine_ref) => engine_ref,
        Err(e) => {
            error!("container creation failed for {}: {}", spec.name, e);
            let mut registry = registry.lock().await;
            if let Some(record) = registry.get_mut(&spec.name) {
                record.state = LifecycleState::Error;
            }
            return;
        }
    };

    {
        let mut registry = registry.lock().await;
        match registry.get_mut(&spec.name) {
            Some(record) => {
                record.engine_ref = Some(engine_ref.clone());
                record.state = LifecycleState::Running;
            }
            None => {
                // deleted while we were still creating; don't leak the container
                warn!("instance {} vanished during setup", spec.name);
                drop(registry);
                if let Err(e) = engine.remove(&engine_ref).await {
                    warn!("orphan container removal failed for {}: {}", spec.name, e);
                }
                return;
            }
        }
    }

    let establisher = SessionEstablisher::new(Arc::clone(&engine), timing);
    match establisher.establish(&engine_ref).await {
        Ok(session) => {
            let mut registry = registry.lock().await;
            if let Some(record) = registry.get_mut(&spec.name) {
                info!("session ready for {}", spec.name);
                record.session = Some(session);
            }
        }
        // non-fatal: the instance stays running and an explicit refresh
        // can retry later
        Err(e) => warn!("session establishment failed for {}: {}", spec.name, e),
    }
}

/// Synthesizes a registry-unique name from the prefix and current time,
/// breaking same-second collisions with a random suffix.
fn unique_name(registry: &InstanceRegistry, prefix: &str) -> String {
    let base = format!("{}{}", prefix, Utc::now().timestamp());
    if !registry.contains(&base) {
        return base;
    }
    loop {
        let suffix = Uuid::new_v4().simple().to_string();
        let candidate = format!("{}-{}", base, &suffix[..8]);
        if !registry.contains(&candidate) {
            return candidate;
        }
    }
}

//! Container engine adapter.
//!
//! Thin interface over the host's container runtime: create, inspect,
//! exec-into, stop, remove and list-by-label. The production backend is
//! [`docker::DockerCli`], which drives the `docker` CLI through
//! subprocesses; tests swap in a scripted fake.
//!
//! Re-exports:
//! - [`ContainerEngine`]: the adapter trait.
//! - [`CreateSpec`], [`RunStatus`], [`ExecOutput`], [`TaggedContainer`],
//!   [`ResourceSpec`]: core types.

use async_trait::async_trait;

use crate::error_handling::types::EngineError;

pub mod docker;
#[cfg(test)]
pub mod fake;
pub mod types;

pub use docker::DockerCli;
pub use types::{CreateSpec, ExecOutput, ResourceSpec, RunStatus, TaggedContainer};

/// Operations the lifecycle manager needs from a container runtime.
///
/// Engine references are opaque strings; the adapter is the source of
/// truth for run-status and for the ownership/resource labels attached at
/// creation time.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Creates and starts a container, returning its engine reference.
    async fn create(&self, spec: &CreateSpec) -> Result<String, EngineError>;

    /// Reports the current run-status of a container.
    async fn get_status(&self, engine_ref: &str) -> Result<RunStatus, EngineError>;

    /// Runs a shell command inside a running container.
    async fn exec(&self, engine_ref: &str, command: &str) -> Result<ExecOutput, EngineError>;

    /// Stops a running container.
    async fn stop(&self, engine_ref: &str) -> Result<(), EngineError>;

    /// Force-removes a container.
    async fn remove(&self, engine_ref: &str) -> Result<(), EngineError>;

    /// Lists all containers tagged as owned by this system.
    async fn list_tagged(&self) -> Result<Vec<TaggedContainer>, EngineError>;
}

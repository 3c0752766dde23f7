//! Instance lifecycle management.
//!
//! The registry owns every instance record; the manager composes the
//! container engine, the registry and the session establisher into the
//! create/stop/delete/refresh/list operations exposed to the front end.
//!
//! Re-exports:
//! - [`VpsManager`]: main entry point for lifecycle operations.
//! - [`InstanceRegistry`]: name-to-record map with startup reconciliation.
//! - [`InstanceRecord`], [`InstanceView`], [`LifecycleState`]: core types.

pub mod manager;
pub mod registry;
#[cfg(test)]
mod tests;
pub mod types;

pub use manager::VpsManager;
pub use registry::InstanceRegistry;
pub use types::{InstanceRecord, InstanceView, LifecycleState};

//! Runtime configuration.
//!
//! Loaded once from a TOML file before the manager starts; see
//! [`config::Config`] for the full surface.

pub mod config;
pub mod types;

pub use config::Config;
pub use types::{EngineConfig, InstanceLimits, ResourceBounds, SessionTiming};

//! Error types shared across the crate.
//!
//! All errors are plain enums with manual `Display` impls so callers can
//! surface the underlying message without pulling in extra machinery.

pub mod types;

pub use types::{ConfigError, EngineError, ManagerError, SessionError};

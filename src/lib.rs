pub mod command_interface;
pub mod configuration;
pub mod container_engine;
pub mod error_handling;
pub mod host_metrics;
pub mod instance_management;
pub mod session_management;

pub use configuration::Config;
pub use container_engine::{ContainerEngine, DockerCli, ResourceSpec};
pub use error_handling::{ConfigError, EngineError, ManagerError, SessionError};
pub use instance_management::{InstanceView, LifecycleState, VpsManager};
pub use session_management::SessionEstablisher;

use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    NotInRange(String),
    BadPrefix(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::NotInRange(e) => write!(f, "Value out of range: {}", e),
            ConfigError::BadPrefix(e) => write!(f, "Instance name prefix error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

/// Failures reported by the container engine adapter.
///
/// Every engine failure is recoverable-but-reportable: callers log it,
/// surface the message and transition instance state where applicable,
/// but never crash the process over it.
#[derive(Debug)]
pub enum EngineError {
    RuntimeNotAvailable,
    OperationFailed(String),
    IoError(std::io::Error),
    BadResponse(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::RuntimeNotAvailable => write!(f, "Container engine not available"),
            EngineError::OperationFailed(e) => write!(f, "Engine operation failed: {}", e),
            EngineError::IoError(e) => write!(f, "Engine IO error: {}", e),
            EngineError::BadResponse(e) => write!(f, "Unexpected engine response: {}", e),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::IoError(err)
    }
}

/// Failures of a single session-establishment or refresh attempt.
///
/// None of these is fatal to the instance itself: the container keeps
/// running and the caller may retry through an explicit refresh.
#[derive(Debug)]
pub enum SessionError {
    /// The in-container install step exited non-zero. Not retried.
    InstallFailed(String),
    /// Every poll attempt and the fallback command came up empty.
    Unavailable,
    Engine(EngineError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InstallFailed(e) => write!(f, "Session daemon install failed: {}", e),
            SessionError::Unavailable => write!(f, "Session unavailable after all attempts"),
            SessionError::Engine(e) => write!(f, "Engine error: {}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<EngineError> for SessionError {
    fn from(err: EngineError) -> Self {
        SessionError::Engine(err)
    }
}

#[derive(Debug)]
pub enum ManagerError {
    InvalidResources,
    CapacityExceeded,
    NotFound,
    NoContainer,
    Engine(EngineError),
    Session(SessionError),
}

impl fmt::Display for ManagerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagerError::InvalidResources => write!(f, "Invalid resource specifications"),
            ManagerError::CapacityExceeded => write!(f, "Maximum instance limit reached"),
            ManagerError::NotFound => write!(f, "Instance not found"),
            ManagerError::NoContainer => write!(f, "No container found for instance"),
            ManagerError::Engine(e) => write!(f, "Engine error: {}", e),
            ManagerError::Session(e) => write!(f, "Session error: {}", e),
        }
    }
}

impl std::error::Error for ManagerError {}

impl From<EngineError> for ManagerError {
    fn from(err: EngineError) -> Self {
        ManagerError::Engine(err)
    }
}

impl From<SessionError> for ManagerError {
    fn from(err: SessionError) -> Self {
        ManagerError::Session(err)
    }
}

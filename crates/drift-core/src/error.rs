//! Error types for the Driftboard core.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid registry: {0}")]
    InvalidRegistry(String),

    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),
}

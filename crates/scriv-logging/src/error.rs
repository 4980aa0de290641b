//! Error types for consumers and diagnostics setup

use thiserror::Error;

use scriv_storage::{ConfigError, StorageError};

/// Errors returned when building or driving a consumer
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Consumers spawn their file manager and need a tokio runtime
    #[error("no tokio runtime is running")]
    NoRuntime,

    #[error("diagnostics subscriber: {0}")]
    Diagnostics(String),
}

impl LoggingError {
    pub fn diagnostics(msg: impl Into<String>) -> Self {
        Self::Diagnostics(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts() {
        let err: LoggingError = ConfigError::ZeroMaxFileSize.into();
        assert!(matches!(err, LoggingError::Config(ConfigError::ZeroMaxFileSize)));
        assert!(err.to_string().starts_with("invalid configuration"));
    }
}

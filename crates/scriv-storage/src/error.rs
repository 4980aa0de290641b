//! Error types for scriv-storage
//!
//! [`ConfigError`] is returned when a manager is built from invalid
//! settings. [`StorageError`] covers the I/O layer; the manager itself
//! recovers from these locally and only logs them.

use thiserror::Error;

/// Invalid file manager configuration
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Duration string does not match `<integer><unit>`
    #[error("Invalid lifetime '{0}': expected <number><ms|s|m|h|D|W|M|Y>")]
    InvalidLifetime(String),

    /// Retention must be strictly longer than the archive threshold
    #[error("Retention window ({retention_ms}ms) must exceed archive threshold ({archive_ms}ms)")]
    RetentionNotAfterArchive { retention_ms: u64, archive_ms: u64 },

    #[error("Max file size must be greater than zero")]
    ZeroMaxFileSize,

    #[error("Invalid schedule '{expression}': {reason}")]
    InvalidSchedule { expression: String, reason: String },

    #[error("Invalid naming pattern: {0}")]
    InvalidPattern(String),
}

impl ConfigError {
    pub fn schedule(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSchedule {
            expression: expression.into(),
            reason: reason.into(),
        }
    }
}

/// Errors that can occur in file operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(String),

    /// Gzip compression failed
    #[error("Compression error: {0}")]
    Compression(String),

    /// No stream is open to write to
    #[error("No open stream")]
    NoStream,

    /// The manager task has stopped
    #[error("File manager is not running")]
    ManagerClosed,
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl StorageError {
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }

    pub fn compression(message: impl Into<String>) -> Self {
        Self::Compression(message.into())
    }
}

//! Error types for Scriv core

use thiserror::Error;

/// Errors raised while interpreting core configuration values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown log level: {0}")]
    UnknownLevel(String),

    #[error("Unknown run mode: {0}")]
    UnknownRunMode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_level_display() {
        let err = CoreError::UnknownLevel("trace".into());
        assert!(err.to_string().contains("trace"));
    }
}

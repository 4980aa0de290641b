//! Error types for scriv-format

use thiserror::Error;

/// Failure reported by a custom serializer handler
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Handler failed: {0}")]
    Handler(String),

    #[error("Handler panicked")]
    Panicked,
}

impl FormatError {
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }
}

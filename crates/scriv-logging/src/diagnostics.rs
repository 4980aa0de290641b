//! Subscriber setup for the crate's own diagnostics
//!
//! The storage and format layers report through `tracing`. Applications
//! that do not install a subscriber of their own can use
//! [`DiagnosticsBuilder`] to print those events.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::LoggingError;

/// Diagnostics subscriber configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Filter used when `RUST_LOG` is unset
    pub default_level: String,
    /// Human-readable output instead of JSON lines
    pub pretty: bool,
    /// Include ANSI colors (pretty output only)
    pub ansi: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            pretty: false,
            ansi: false,
        }
    }
}

impl DiagnosticsConfig {
    /// Verbose, colored, human-readable output
    pub fn development() -> Self {
        Self {
            default_level: "debug".to_string(),
            pretty: true,
            ansi: true,
        }
    }

    /// Warnings only
    pub fn testing() -> Self {
        Self {
            default_level: "warn".to_string(),
            pretty: true,
            ansi: false,
        }
    }
}

/// Builder for the global diagnostics subscriber
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsBuilder {
    config: DiagnosticsConfig,
}

impl DiagnosticsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: DiagnosticsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.default_level = level.into();
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.config.pretty = pretty;
        self
    }

    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.config.ansi = ansi;
        self
    }

    pub fn config(&self) -> &DiagnosticsConfig {
        &self.config
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.config.default_level))
    }

    /// Install the subscriber globally
    ///
    /// Fails if a global subscriber is already set.
    pub fn try_init(self) -> Result<(), LoggingError> {
        let registry = Registry::default().with(self.filter());

        let result = if self.config.pretty {
            let layer = fmt::layer().with_ansi(self.config.ansi).with_target(true);
            registry.with(layer).try_init()
        } else {
            let layer = fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(true)
                .with_current_span(true);
            registry.with(layer).try_init()
        };

        result.map_err(|e| LoggingError::diagnostics(e.to_string()))
    }

    /// Install the subscriber globally
    ///
    /// # Panics
    ///
    /// Panics if a global subscriber has already been set.
    pub fn init(self) {
        if let Err(e) = self.try_init() {
            panic!("{e}");
        }
    }
}

/// Install a warnings-only subscriber; does nothing if one is already set
pub fn init_testing() {
    let _ = DiagnosticsBuilder::new()
        .with_config(DiagnosticsConfig::testing())
        .try_init();
}

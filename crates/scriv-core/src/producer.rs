//! Named, leveled event producer

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::bus::{EventBus, Listener, ListenerId, ListenerRegistry};
use crate::console::{ConsoleConfig, format_console_line};
use crate::error::CoreError;
use crate::level::{LevelFlags, LevelSelection, LogLevel};
use crate::record::{LogRecord, Packet, Payload};

/// Environment a producer (or its console echo) is active in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RunMode {
    /// Active in every environment
    #[default]
    #[serde(rename = "*")]
    Any,
    #[serde(rename = "production")]
    Production,
    #[serde(rename = "development")]
    Development,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Any => "*",
            RunMode::Production => "production",
            RunMode::Development => "development",
        }
    }

    /// Whether the gate is open for the given active environment
    pub fn admits(&self, environment: Option<&str>) -> bool {
        match self {
            RunMode::Any => true,
            mode => environment == Some(mode.as_str()),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "*" => Ok(RunMode::Any),
            "production" => Ok(RunMode::Production),
            "development" => Ok(RunMode::Development),
            other => Err(CoreError::UnknownRunMode(other.to_string())),
        }
    }
}

/// Producer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    pub name: String,
    pub run_mode: RunMode,
    /// Active environment the run-mode gates are checked against
    pub environment: Option<String>,
    /// Enabled levels; `None` enables all
    pub level: Option<LevelSelection>,
    pub console: ConsoleConfig,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            name: "Producer".to_string(),
            run_mode: RunMode::Any,
            environment: None,
            level: None,
            console: ConsoleConfig::default(),
        }
    }
}

impl ProducerConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_run_mode(mut self, run_mode: RunMode) -> Self {
        self.run_mode = run_mode;
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Read the active environment from a process environment variable
    pub fn with_environment_from_var(mut self, var: &str) -> Self {
        self.environment = std::env::var(var).ok();
        self
    }

    pub fn with_levels(mut self, level: LevelSelection) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_console(mut self, console: ConsoleConfig) -> Self {
        self.console = console;
        self
    }
}

/// Named source of leveled log events
///
/// Composes a [`ListenerRegistry`] and exposes it through [`EventBus`].
pub struct Producer {
    name: String,
    is_on: bool,
    echo: bool,
    console: ConsoleConfig,
    flags: LevelFlags,
    listeners: ListenerRegistry,
}

impl Producer {
    pub fn new(config: ProducerConfig) -> Self {
        let environment = config.environment.as_deref();
        let is_on = config.run_mode.admits(environment);
        let echo = config.console.on && config.console.run_mode.admits(environment);
        let flags = LevelFlags::from_selection(config.level.as_ref());

        Self {
            name: config.name,
            is_on,
            echo,
            console: config.console,
            flags,
            listeners: ListenerRegistry::new(),
        }
    }

    /// Whether the run-mode gate is open
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    /// Emit a record at `level` to every listener of that level.
    ///
    /// No-op when the run-mode gate is closed or the level is disabled.
    pub fn emit(&self, level: LogLevel, payload: impl Into<Payload>) {
        if !self.is_on || !self.flags.is_enabled(level) {
            return;
        }

        let record = LogRecord::new(level, payload.into());

        if self.echo {
            let line = format_console_line(
                level,
                &record.time,
                record.payload.values(),
                &self.console.pretty,
                self.console.ansi,
            );
            match level {
                LogLevel::Error | LogLevel::Warn => eprintln!("{line}"),
                _ => println!("{line}"),
            }
        }

        let packet = Packet::new(record, self.name.clone());
        trace!(producer = %self.name, level = %level, "Publishing packet");
        self.listeners.dispatch(level, &packet);
    }

    pub fn log(&self, payload: impl Into<Payload>) {
        self.emit(LogLevel::Log, payload);
    }

    pub fn error(&self, payload: impl Into<Payload>) {
        self.emit(LogLevel::Error, payload);
    }

    pub fn info(&self, payload: impl Into<Payload>) {
        self.emit(LogLevel::Info, payload);
    }

    pub fn warn(&self, payload: impl Into<Payload>) {
        self.emit(LogLevel::Warn, payload);
    }

    pub fn debug(&self, payload: impl Into<Payload>) {
        self.emit(LogLevel::Debug, payload);
    }

    pub fn confirm(&self, payload: impl Into<Payload>) {
        self.emit(LogLevel::Confirm, payload);
    }

    pub fn listener_count(&self, level: LogLevel) -> usize {
        self.listeners.listener_count(level)
    }
}

impl EventBus for Producer {
    fn name(&self) -> &str {
        &self.name
    }

    fn level_flags(&self) -> LevelFlags {
        self.flags
    }

    fn subscribe(&self, level: LogLevel, listener: Arc<dyn Listener>) {
        self.listeners.add(level, listener);
    }

    fn unsubscribe(&self, level: LogLevel, listener: ListenerId) {
        self.listeners.remove(level, listener);
    }

    fn publish(&self, level: LogLevel, packet: &Packet) {
        self.listeners.dispatch(level, packet);
    }
}

impl fmt::Debug for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("name", &self.name)
            .field("is_on", &self.is_on)
            .field("flags", &self.flags)
            .field("listeners", &self.listeners)
            .finish()
    }
}

//! Log levels and per-producer level flags

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The six log levels understood by producers and consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Log,
    Error,
    Info,
    Warn,
    Debug,
    Confirm,
}

impl LogLevel {
    /// Every level, in flag-slot order
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Log,
        LogLevel::Error,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Debug,
        LogLevel::Confirm,
    ];

    /// Lowercase name used in configuration and on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Log => "log",
            LogLevel::Error => "error",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Debug => "debug",
            LogLevel::Confirm => "confirm",
        }
    }

    fn slot(self) -> usize {
        match self {
            LogLevel::Log => 0,
            LogLevel::Error => 1,
            LogLevel::Info => 2,
            LogLevel::Warn => 3,
            LogLevel::Debug => 4,
            LogLevel::Confirm => 5,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| CoreError::UnknownLevel(s.to_string()))
    }
}

/// One entry of a level selection: a concrete level or the `*` wildcard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LevelSpec {
    Wildcard,
    Level(LogLevel),
}

impl TryFrom<String> for LevelSpec {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LevelSpec> for String {
    fn from(spec: LevelSpec) -> Self {
        match spec {
            LevelSpec::Wildcard => "*".to_string(),
            LevelSpec::Level(level) => level.as_str().to_string(),
        }
    }
}

impl FromStr for LevelSpec {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "*" {
            Ok(LevelSpec::Wildcard)
        } else {
            s.parse().map(LevelSpec::Level)
        }
    }
}

impl From<LogLevel> for LevelSpec {
    fn from(level: LogLevel) -> Self {
        LevelSpec::Level(level)
    }
}

/// Configured level selection: a single entry or an explicit list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelSelection {
    One(LevelSpec),
    Many(Vec<LevelSpec>),
}

impl Default for LevelSelection {
    fn default() -> Self {
        LevelSelection::One(LevelSpec::Wildcard)
    }
}

/// Fixed set of on/off flags, one per level
///
/// Computed once from configuration and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LevelFlags([bool; 6]);

impl LevelFlags {
    /// Flags with every level enabled
    pub const fn all() -> Self {
        Self([true; 6])
    }

    /// Flags with every level disabled
    pub const fn none() -> Self {
        Self([false; 6])
    }

    /// Resolve a configured selection into flags.
    ///
    /// An omitted selection or a lone `*` enables everything. An explicit
    /// list enables exactly the listed levels, except that a list which
    /// contains `*` disables every level.
    pub fn from_selection(selection: Option<&LevelSelection>) -> Self {
        match selection {
            None | Some(LevelSelection::One(LevelSpec::Wildcard)) => Self::all(),
            Some(LevelSelection::One(LevelSpec::Level(level))) => {
                let mut flags = Self::none();
                flags.0[level.slot()] = true;
                flags
            }
            Some(LevelSelection::Many(specs)) => {
                if specs.contains(&LevelSpec::Wildcard) {
                    return Self::none();
                }
                let mut flags = Self::none();
                for spec in specs {
                    if let LevelSpec::Level(level) = spec {
                        flags.0[level.slot()] = true;
                    }
                }
                flags
            }
        }
    }

    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.0[level.slot()]
    }

    /// Iterate the enabled levels in slot order
    pub fn enabled(&self) -> impl Iterator<Item = LogLevel> + '_ {
        LogLevel::ALL.into_iter().filter(|level| self.is_enabled(*level))
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|on| !on)
    }
}

//! File manager configuration
//!
//! [`FileManagerConfig`] is the serde-friendly form with human durations
//! and cron strings. [`FileManagerConfig::validate`] turns it into
//! [`ManagerSettings`], the parsed form the manager runs on.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::lifetime::{DEFAULT_ARCHIVE_AFTER, DEFAULT_RETENTION, parse_lifetime};
use crate::naming::{DEFAULT_PATTERN, NamingPattern};
use crate::schedule::{CronSchedule, DAILY_AT_MIDNIGHT};

/// Default output directory
pub const DEFAULT_OUT_DIR: &str = "logs";

/// An optional recurring job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub on: bool,
    /// Five-field cron expression, UTC
    pub schedule: String,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            on: true,
            schedule: DAILY_AT_MIDNIGHT.to_string(),
        }
    }
}

impl JobConfig {
    pub fn disabled() -> Self {
        Self {
            on: false,
            ..Default::default()
        }
    }

    pub fn at(schedule: impl Into<String>) -> Self {
        Self {
            on: true,
            schedule: schedule.into(),
        }
    }
}

/// Configuration for a file manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileManagerConfig {
    /// Directory the log files live in
    pub out_dir: PathBuf,
    /// File naming template
    pub pattern: String,
    /// Maximum bytes per file; `None` is unbounded
    pub max_file_size: Option<u64>,
    /// Age after which files are deleted
    pub retention: String,
    /// Age after which files are compressed
    pub archive_after: String,
    pub rotation: JobConfig,
    pub cleaning: JobConfig,
    pub archiving: JobConfig,
    /// Emit routine lifecycle diagnostics
    pub debug: bool,
}

impl Default for FileManagerConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            pattern: DEFAULT_PATTERN.to_string(),
            max_file_size: None,
            retention: DEFAULT_RETENTION.to_string(),
            archive_after: DEFAULT_ARCHIVE_AFTER.to_string(),
            rotation: JobConfig::default(),
            cleaning: JobConfig::default(),
            archiving: JobConfig::default(),
            debug: false,
        }
    }
}

impl FileManagerConfig {
    /// Configuration writing to `out_dir` with every other value defaulted
    pub fn in_dir(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            ..Default::default()
        }
    }

    /// Configuration for tests: cleaning and archiving jobs off, debug on
    pub fn testing(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            cleaning: JobConfig::disabled(),
            archiving: JobConfig::disabled(),
            debug: true,
            ..Default::default()
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    pub fn with_retention(mut self, lifetime: impl Into<String>) -> Self {
        self.retention = lifetime.into();
        self
    }

    pub fn with_archive_after(mut self, lifetime: impl Into<String>) -> Self {
        self.archive_after = lifetime.into();
        self
    }

    pub fn with_rotation(mut self, job: JobConfig) -> Self {
        self.rotation = job;
        self
    }

    pub fn with_cleaning(mut self, job: JobConfig) -> Self {
        self.cleaning = job;
        self
    }

    pub fn with_archiving(mut self, job: JobConfig) -> Self {
        self.archiving = job;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Parse and check every value
    pub fn validate(&self) -> Result<ManagerSettings, ConfigError> {
        if self.max_file_size == Some(0) {
            return Err(ConfigError::ZeroMaxFileSize);
        }

        let retention = parse_lifetime(&self.retention)?;
        let archive_after = parse_lifetime(&self.archive_after)?;
        if retention <= archive_after {
            return Err(ConfigError::RetentionNotAfterArchive {
                retention_ms: retention.as_millis() as u64,
                archive_ms: archive_after.as_millis() as u64,
            });
        }

        let job = |config: &JobConfig| -> Result<Option<CronSchedule>, ConfigError> {
            let schedule = CronSchedule::parse(&config.schedule)?;
            Ok(config.on.then_some(schedule))
        };

        Ok(ManagerSettings {
            out_dir: self.out_dir.clone(),
            pattern: NamingPattern::new(&self.pattern)?,
            max_file_size: self.max_file_size,
            retention,
            archive_after,
            rotation: job(&self.rotation)?,
            cleaning: job(&self.cleaning)?,
            archiving: job(&self.archiving)?,
            debug: self.debug,
        })
    }
}

/// Validated manager settings; a disabled job has no schedule
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    pub out_dir: PathBuf,
    pub pattern: NamingPattern,
    pub max_file_size: Option<u64>,
    pub retention: Duration,
    pub archive_after: Duration,
    pub rotation: Option<CronSchedule>,
    pub cleaning: Option<CronSchedule>,
    pub archiving: Option<CronSchedule>,
    pub debug: bool,
}

impl ManagerSettings {
    pub fn rotation_enabled(&self) -> bool {
        self.rotation.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let settings = FileManagerConfig::default().validate().unwrap();
        assert_eq!(settings.out_dir, PathBuf::from("logs"));
        assert_eq!(settings.retention, Duration::from_secs(14 * 86_400));
        assert_eq!(settings.archive_after, Duration::from_secs(7 * 86_400));
        assert!(settings.rotation_enabled());
        assert!(settings.cleaning.is_some());
        assert!(settings.archiving.is_some());
        assert_eq!(settings.max_file_size, None);
        assert!(!settings.debug);
    }

    #[test]
    fn test_zero_max_file_size_rejected() {
        let err = FileManagerConfig::default()
            .with_max_file_size(0)
            .validate()
            .unwrap_err();
        assert_eq!(err, ConfigError::ZeroMaxFileSize);
    }

    #[test]
    fn test_bad_schedule_rejected_even_when_disabled() {
        let config = FileManagerConfig::default().with_archiving(JobConfig {
            on: false,
            schedule: "every day".into(),
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSchedule { .. })
        ));
    }

    #[test]
    fn test_disabled_job_has_no_schedule() {
        let settings = FileManagerConfig::default()
            .with_rotation(JobConfig::disabled())
            .validate()
            .unwrap();
        assert!(!settings.rotation_enabled());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: FileManagerConfig = serde_json::from_str(
            r#"{"out_dir": "/var/log/app", "max_file_size": 1048576, "archiving": {"on": false}}"#,
        )
        .unwrap();
        assert_eq!(config.max_file_size, Some(1_048_576));
        assert!(!config.archiving.on);
        assert_eq!(config.archiving.schedule, "0 0 * * *");
        assert_eq!(config.retention, "14D");
    }
}

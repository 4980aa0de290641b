//! Consumer configuration

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use scriv_core::EventBus;
use scriv_format::SerializerConfig;
use scriv_storage::lifetime::{DEFAULT_ARCHIVE_AFTER, DEFAULT_RETENTION};
use scriv_storage::schedule::DAILY_AT_MIDNIGHT;
use scriv_storage::{DEFAULT_OUT_DIR, DEFAULT_PATTERN, FileManagerConfig, JobConfig};

/// Rotation job settings
pub type RotateConfig = JobConfig;

/// Cleanup job settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    pub on: bool,
    pub schedule: String,
    /// Age after which a file is deleted
    pub lifetime: String,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            on: true,
            schedule: DAILY_AT_MIDNIGHT.to_string(),
            lifetime: DEFAULT_RETENTION.to_string(),
        }
    }
}

/// Archival job settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchivingConfig {
    pub on: bool,
    pub schedule: String,
    /// Age after which a file is compressed
    pub lifetime: String,
}

impl Default for ArchivingConfig {
    fn default() -> Self {
        Self {
            on: true,
            schedule: DAILY_AT_MIDNIGHT.to_string(),
            lifetime: DEFAULT_ARCHIVE_AFTER.to_string(),
        }
    }
}

/// Buses a consumer subscribes to as soon as it is built
#[derive(Clone, Default)]
pub struct BusList(pub Vec<Arc<dyn EventBus>>);

impl BusList {
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn EventBus>> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for BusList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter().map(|bus| bus.name())).finish()
    }
}

/// Consumer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// Stamped into the `to` field of every packet this consumer claims
    pub name: String,
    /// Log directory; a non-normalized path falls back to `logs`
    pub out_dir: PathBuf,
    /// File naming template
    pub pattern: String,
    pub serializer: SerializerConfig,
    pub rotate: RotateConfig,
    pub cleaning: CleaningConfig,
    pub archiving: ArchivingConfig,
    /// Maximum bytes per file; `None` is unbounded
    pub max_file_size: Option<u64>,
    /// Emit routine lifecycle diagnostics
    pub debug: bool,
    /// Buses to listen to on construction
    #[serde(skip)]
    pub listen: BusList,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            name: "Consumer".to_string(),
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            pattern: DEFAULT_PATTERN.to_string(),
            serializer: SerializerConfig::default(),
            rotate: RotateConfig::default(),
            cleaning: CleaningConfig::default(),
            archiving: ArchivingConfig::default(),
            max_file_size: None,
            debug: false,
            listen: BusList::default(),
        }
    }
}

impl ConsumerConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Configuration for tests: writes to `out_dir`, scheduled cleanup and
    /// archival off
    pub fn testing(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            cleaning: CleaningConfig {
                on: false,
                ..Default::default()
            },
            archiving: ArchivingConfig {
                on: false,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = out_dir.into();
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_serializer(mut self, serializer: SerializerConfig) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn with_rotate(mut self, rotate: RotateConfig) -> Self {
        self.rotate = rotate;
        self
    }

    pub fn with_cleaning(mut self, cleaning: CleaningConfig) -> Self {
        self.cleaning = cleaning;
        self
    }

    pub fn with_archiving(mut self, archiving: ArchivingConfig) -> Self {
        self.archiving = archiving;
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Listen to `bus` once the consumer is built
    pub fn listening_to(mut self, bus: Arc<dyn EventBus>) -> Self {
        self.listen.0.push(bus);
        self
    }

    /// Output directory after normalization
    pub fn resolved_out_dir(&self) -> PathBuf {
        normalize_out_dir(&self.out_dir)
    }

    /// Settings for this consumer's file manager
    pub fn file_manager_config(&self) -> FileManagerConfig {
        FileManagerConfig {
            out_dir: self.resolved_out_dir(),
            pattern: self.pattern.clone(),
            max_file_size: self.max_file_size,
            retention: self.cleaning.lifetime.clone(),
            archive_after: self.archiving.lifetime.clone(),
            rotation: self.rotate.clone(),
            cleaning: JobConfig {
                on: self.cleaning.on,
                schedule: self.cleaning.schedule.clone(),
            },
            archiving: JobConfig {
                on: self.archiving.on,
                schedule: self.archiving.schedule.clone(),
            },
            debug: self.debug,
        }
    }
}

/// Keep `dir` if it is already in normal form, else use the default
///
/// Empty paths, `.`/`..` components and doubled separators are not normal.
pub fn normalize_out_dir(dir: &Path) -> PathBuf {
    let raw = dir.to_string_lossy();
    let doubled = raw.contains("//") || raw.contains("\\\\");
    let irregular = dir
        .components()
        .any(|c| matches!(c, Component::CurDir | Component::ParentDir));

    if raw.is_empty() || doubled || irregular {
        PathBuf::from(DEFAULT_OUT_DIR)
    } else {
        dir.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConsumerConfig::default();
        assert_eq!(config.name, "Consumer");
        assert_eq!(config.out_dir, PathBuf::from("logs"));
        assert_eq!(config.pattern, DEFAULT_PATTERN);
        assert_eq!(config.serializer.kind(), "text");
        assert!(config.rotate.on && config.cleaning.on && config.archiving.on);
        assert_eq!(config.cleaning.lifetime, "14D");
        assert_eq!(config.archiving.lifetime, "7D");
        assert_eq!(config.max_file_size, None);
        assert!(!config.debug);
        assert!(config.listen.is_empty());
    }

    #[test]
    fn test_out_dir_normalization() {
        assert_eq!(normalize_out_dir(Path::new("/var/log/app")), PathBuf::from("/var/log/app"));
        assert_eq!(normalize_out_dir(Path::new("logs/api")), PathBuf::from("logs/api"));
        assert_eq!(normalize_out_dir(Path::new("")), PathBuf::from("logs"));
        assert_eq!(normalize_out_dir(Path::new("/var/../etc")), PathBuf::from("logs"));
        assert_eq!(normalize_out_dir(Path::new("./logs")), PathBuf::from("logs"));
        assert_eq!(normalize_out_dir(Path::new("/var//log")), PathBuf::from("logs"));
    }

    #[test]
    fn test_file_manager_config_mapping() {
        let config = ConsumerConfig::named("api")
            .with_out_dir("/tmp/api-logs")
            .with_max_file_size(4096)
            .with_cleaning(CleaningConfig {
                lifetime: "30D".into(),
                ..Default::default()
            })
            .with_archiving(ArchivingConfig {
                on: false,
                schedule: "0 3 * * *".into(),
                lifetime: "2D".into(),
            })
            .with_debug(true);

        let files = config.file_manager_config();
        assert_eq!(files.out_dir, PathBuf::from("/tmp/api-logs"));
        assert_eq!(files.max_file_size, Some(4096));
        assert_eq!(files.retention, "30D");
        assert_eq!(files.archive_after, "2D");
        assert!(!files.archiving.on);
        assert_eq!(files.archiving.schedule, "0 3 * * *");
        assert!(files.debug);
        assert!(files.validate().is_ok());
    }

    #[test]
    fn test_deserializes_partial_document() {
        let config: ConsumerConfig = serde_json::from_str(
            r#"{
                "name": "audit",
                "serializer": {"type": "json", "options": {}},
                "cleaning": {"lifetime": "1W"},
                "max_file_size": 1048576
            }"#,
        )
        .unwrap();

        assert_eq!(config.name, "audit");
        assert_eq!(config.serializer.kind(), "json");
        assert_eq!(config.cleaning.lifetime, "1W");
        assert!(config.cleaning.on);
        assert_eq!(config.archiving.lifetime, "7D");
        assert_eq!(config.max_file_size, Some(1 << 20));
    }
}

//! # Scriv Storage
//!
//! Persistence of serialized log entries into rotating files.
//!
//! ## Features
//!
//! - **File manager**: a single actor per consumer owning the append
//!   stream, with size-bounded rotation, crash-resume of today's live
//!   file, and a bounded pending buffer while no stream is available
//! - **Scheduled jobs**: existence check, rotation, cleanup, archival and
//!   a daily chunk-scope reset, each on its own UTC cron schedule
//! - **Naming**: file name templates with date, chunk and uniqueness
//!   tokens, compiled to anchored matchers for directory scans
//! - **Archival**: gzip compression of aged files
//!
//! ## Example
//!
//! ```rust,ignore
//! use scriv_storage::{FileManager, FileManagerConfig};
//!
//! let handle = FileManager::spawn(FileManagerConfig::in_dir("logs").with_max_file_size(1 << 20))?;
//! handle.write(b"started\n".to_vec());
//! handle.flush().await?;
//! ```

pub mod archive;
pub mod buffer;
pub mod config;
pub mod error;
pub mod fs;
pub mod lifetime;
pub mod manager;
pub mod naming;
pub mod schedule;

pub use archive::{archive_path, gzip_file};
pub use buffer::{MAX_BUFFER_BYTES, PendingBuffer};
pub use config::{DEFAULT_OUT_DIR, FileManagerConfig, JobConfig, ManagerSettings};
pub use error::{ConfigError, StorageError};
pub use fs::{FileMeta, FileSink, LogFs, LogSink, TokioFs};
pub use lifetime::{MONTH, parse_lifetime};
pub use manager::{FileManager, FileManagerHandle, Job, ManagerState, ManagerStatus};
pub use naming::{DEFAULT_PATTERN, NamingPattern, extract_chunk, generate_unique_hash};
pub use schedule::CronSchedule;

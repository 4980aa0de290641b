//! # Scriv Logging
//!
//! Consumers that persist producer events to rotating log files, and a
//! stream facade pairing one producer with one consumer.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use scriv_core::ProducerConfig;
//! use scriv_logging::{ConsumerConfig, LogStream};
//!
//! let stream = LogStream::new(
//!     ProducerConfig::named("api"),
//!     ConsumerConfig::named("files").with_out_dir("/var/log/api"),
//! )?;
//! stream.info("server started");
//! ```
//!
//! ## Several producers, one consumer
//!
//! ```rust,ignore
//! use scriv_logging::{Consumer, ConsumerConfig};
//!
//! let consumer = Consumer::new(ConsumerConfig::default())?;
//! consumer.listen(&http);
//! consumer.listen(&jobs);
//! ```
//!
//! Internal diagnostics (rotation, cleanup and I/O failures) go through
//! `tracing`; see [`DiagnosticsBuilder`].

pub mod config;
pub mod consumer;
pub mod diagnostics;
pub mod error;
pub mod stream;

pub use config::{
    ArchivingConfig, BusList, CleaningConfig, ConsumerConfig, RotateConfig, normalize_out_dir,
};
pub use consumer::Consumer;
pub use diagnostics::{DiagnosticsBuilder, DiagnosticsConfig, init_testing};
pub use error::LoggingError;
pub use stream::LogStream;

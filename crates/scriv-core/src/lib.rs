//! # Scriv Core
//!
//! Core types, level flags, and the event bus that connects log producers
//! to their consumers.
//!
//! ## Key Traits
//!
//! - [`EventBus`]: subscribe/unsubscribe/publish capability exposed by a producer
//! - [`Listener`]: receiving end of a bus subscription (implemented by consumers)
//!
//! ## Key Types
//!
//! - [`LogLevel`] and [`LevelFlags`]: the six log levels and the per-producer on/off set
//! - [`LogRecord`]: an immutable, timestamped event with its payload
//! - [`Packet`]: a record in flight, tagged with its source and destination
//! - [`Producer`]: a named, leveled emitter built on [`ListenerRegistry`]

pub mod bus;
pub mod console;
pub mod error;
pub mod level;
pub mod producer;
pub mod record;

// Re-export main types
pub use bus::*;
pub use console::*;
pub use error::*;
pub use level::*;
pub use producer::*;
pub use record::*;

//! # Scriv Format
//!
//! Turns packets into the bytes a consumer persists.
//!
//! A [`SerializerConfig`] names one of the supported encoders (plain text,
//! JSON lines, XML, or a caller-supplied handler) together with its
//! options. [`Serializer`] resolves the options once, applying each
//! option's default independently, and then exposes a single
//! infallible operation: [`Serializer::stringify`].
//!
//! ```rust,ignore
//! use scriv_format::{Serializer, SerializerConfig, JsonOptions};
//!
//! let serializer = Serializer::new(SerializerConfig::Json(JsonOptions::default()));
//! let line = serializer.stringify(&packet);
//! ```

pub mod dispatch;
pub mod error;
pub mod json;
pub mod text;
pub mod xml;

pub use dispatch::{CustomHandler, Serializer, SerializerConfig};
pub use error::FormatError;
pub use json::{JsonEncoder, JsonOptions};
pub use text::{TextEncoder, TextOptions};
pub use xml::{TabWidth, XmlEncoder, XmlOptions};

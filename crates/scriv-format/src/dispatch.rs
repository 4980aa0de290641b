//! Serializer selection and dispatch

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::warn;

use scriv_core::Packet;

use crate::error::FormatError;
use crate::json::{JsonEncoder, JsonOptions};
use crate::text::{TextEncoder, TextOptions};
use crate::xml::{XmlEncoder, XmlOptions};

type HandlerFn = dyn Fn(&Packet) -> Result<String, FormatError> + Send + Sync;

/// Caller-supplied packet encoder
#[derive(Clone)]
pub struct CustomHandler(Arc<HandlerFn>);

impl CustomHandler {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Packet) -> Result<String, FormatError> + Send + Sync + 'static,
    {
        Self(Arc::new(handler))
    }

    /// Run the handler, turning a panic into [`FormatError::Panicked`]
    fn call(&self, packet: &Packet) -> Result<String, FormatError> {
        catch_unwind(AssertUnwindSafe(|| (self.0)(packet))).unwrap_or(Err(FormatError::Panicked))
    }
}

impl fmt::Debug for CustomHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomHandler(..)")
    }
}

/// Which encoder a consumer uses, with its options
///
/// Deserializes from `{"type": "json", "options": {...}}`. The custom
/// variant can only be built in code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "options", rename_all = "lowercase")]
pub enum SerializerConfig {
    Xml(XmlOptions),
    Json(JsonOptions),
    Text(TextOptions),
    #[serde(skip)]
    Custom(CustomHandler),
}

impl Default for SerializerConfig {
    fn default() -> Self {
        SerializerConfig::Text(TextOptions::default())
    }
}

impl SerializerConfig {
    pub fn custom<F>(handler: F) -> Self
    where
        F: Fn(&Packet) -> Result<String, FormatError> + Send + Sync + 'static,
    {
        SerializerConfig::Custom(CustomHandler::new(handler))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SerializerConfig::Xml(_) => "xml",
            SerializerConfig::Json(_) => "json",
            SerializerConfig::Text(_) => "text",
            SerializerConfig::Custom(_) => "custom",
        }
    }
}

#[derive(Debug, Clone)]
enum Encoder {
    Xml(XmlEncoder),
    Json(JsonEncoder),
    Text(TextEncoder),
    Custom(CustomHandler),
}

impl Encoder {
    fn resolve(config: &SerializerConfig) -> Self {
        match config {
            SerializerConfig::Xml(options) => Encoder::Xml(XmlEncoder::new(options)),
            SerializerConfig::Json(options) => Encoder::Json(JsonEncoder::new(options)),
            SerializerConfig::Text(options) => Encoder::Text(TextEncoder::new(options)),
            SerializerConfig::Custom(handler) => Encoder::Custom(handler.clone()),
        }
    }
}

/// Packet serializer with resolved options
#[derive(Debug, Clone)]
pub struct Serializer {
    encoder: Encoder,
    fallback: TextEncoder,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new(SerializerConfig::default())
    }
}

impl Serializer {
    pub fn new(config: SerializerConfig) -> Self {
        Self {
            encoder: Encoder::resolve(&config),
            fallback: TextEncoder::default(),
        }
    }

    /// Replace the active encoder; later packets use the new one
    pub fn set_serializer(&mut self, config: SerializerConfig) {
        self.encoder = Encoder::resolve(&config);
    }

    pub fn kind(&self) -> &'static str {
        match self.encoder {
            Encoder::Xml(_) => "xml",
            Encoder::Json(_) => "json",
            Encoder::Text(_) => "text",
            Encoder::Custom(_) => "custom",
        }
    }

    /// Encode a packet. Never fails: a failing custom handler falls back
    /// to the default text layout.
    pub fn stringify(&self, packet: &Packet) -> String {
        match &self.encoder {
            Encoder::Xml(encoder) => encoder.stringify(packet),
            Encoder::Json(encoder) => encoder.stringify(packet),
            Encoder::Text(encoder) => encoder.stringify(packet),
            Encoder::Custom(handler) => match handler.call(packet) {
                Ok(encoded) => encoded,
                Err(e) => {
                    warn!(error = %e, from = %packet.from, "Custom serializer failed, using text");
                    self.fallback.stringify(packet)
                }
            },
        }
    }

    pub fn encode(&self, packet: &Packet) -> Bytes {
        Bytes::from(self.stringify(packet))
    }
}

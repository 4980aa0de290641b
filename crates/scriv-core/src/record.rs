//! Log records and the packets that carry them from producers to consumers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::level::LogLevel;

/// Destination placeholder used until a consumer claims the packet
pub const UNCLAIMED: &str = "?";

/// Ordered sequence of arbitrary values attached to a record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(pub Vec<Value>);

impl Payload {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a value, consuming and returning the payload
    pub fn with(mut self, value: impl Into<Value>) -> Self {
        self.0.push(value.into());
        self
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Value>> for Payload {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self(vec![value])
    }
}

impl From<&str> for Payload {
    fn from(message: &str) -> Self {
        Self(vec![Value::from(message)])
    }
}

impl From<String> for Payload {
    fn from(message: String) -> Self {
        Self(vec![Value::from(message)])
    }
}

impl<const N: usize> From<[Value; N]> for Payload {
    fn from(values: [Value; N]) -> Self {
        Self(values.into())
    }
}

/// A single log event, immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub time: DateTime<Utc>,
    pub level: LogLevel,
    pub payload: Payload,
}

impl LogRecord {
    /// Create a record stamped with the current time
    pub fn new(level: LogLevel, payload: Payload) -> Self {
        Self::at(Utc::now(), level, payload)
    }

    pub fn at(time: DateTime<Utc>, level: LogLevel, payload: Payload) -> Self {
        Self {
            time,
            level,
            payload,
        }
    }
}

/// One event in flight, tagged with source and destination names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    pub record: LogRecord,
    pub from: String,
    pub to: String,
}

impl Packet {
    /// Create an unclaimed packet from a producer
    pub fn new(record: LogRecord, from: impl Into<String>) -> Self {
        Self {
            record,
            from: from.into(),
            to: UNCLAIMED.to_string(),
        }
    }

    /// Stamp the receiving consumer's name as the destination
    pub fn claim(&mut self, consumer: &str) {
        self.to.clear();
        self.to.push_str(consumer);
    }

    pub fn is_claimed(&self) -> bool {
        self.to != UNCLAIMED
    }

    pub fn level(&self) -> LogLevel {
        self.record.level
    }
}

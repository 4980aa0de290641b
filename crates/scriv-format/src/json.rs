//! JSON-lines encoder

use serde::{Deserialize, Serialize};

use scriv_core::Packet;

/// JSON encoder options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonOptions {
    /// Indent the output (default: false)
    pub pretty: Option<bool>,
    /// Separator appended after each packet (default: `"\n"`)
    pub delimiter: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JsonEncoder {
    pretty: bool,
    delimiter: String,
}

impl Default for JsonEncoder {
    fn default() -> Self {
        Self::new(&JsonOptions::default())
    }
}

impl JsonEncoder {
    pub fn new(options: &JsonOptions) -> Self {
        Self {
            pretty: options.pretty.unwrap_or(false),
            delimiter: options.delimiter.clone().unwrap_or_else(|| "\n".to_string()),
        }
    }

    pub fn stringify(&self, packet: &Packet) -> String {
        let encoded = if self.pretty {
            serde_json::to_string_pretty(packet)
        } else {
            serde_json::to_string(packet)
        };
        // Packets hold only strings, timestamps and JSON values, which always encode
        let mut out = encoded.unwrap_or_default();
        out.push_str(&self.delimiter);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriv_core::{LogLevel, LogRecord};
    use serde_json::Value;

    fn packet() -> Packet {
        Packet::new(LogRecord::new(LogLevel::Debug, "cache miss".into()), "cache")
    }

    #[test]
    fn test_default_is_one_line_per_packet() {
        let out = JsonEncoder::default().stringify(&packet());
        assert!(out.ends_with('\n'));
        assert_eq!(out.matches('\n').count(), 1);

        let parsed: Value = serde_json::from_str(out.trim_end()).unwrap();
        assert_eq!(parsed["from"], "cache");
        assert_eq!(parsed["record"]["level"], "debug");
    }

    #[test]
    fn test_custom_delimiter() {
        let encoder = JsonEncoder::new(&JsonOptions {
            delimiter: Some(",".into()),
            ..Default::default()
        });
        assert!(encoder.stringify(&packet()).ends_with("},"));
    }

    #[test]
    fn test_pretty_spans_lines() {
        let encoder = JsonEncoder::new(&JsonOptions {
            pretty: Some(true),
            delimiter: Some(String::new()),
        });
        let out = encoder.stringify(&packet());
        assert!(out.lines().count() > 3);
        let parsed: Packet = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.from, "cache");
    }
}

//! Structured-markup (XML) encoder
//!
//! Encodes the record of a packet as a `<record>` element. Objects become
//! child elements named after their keys, arrays become `<item>` children.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use scriv_core::Packet;

/// Indentation unit used in pretty mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTabWidth", into = "RawTabWidth")]
pub enum TabWidth {
    Spaces(usize),
    Tab,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawTabWidth {
    Spaces(usize),
    Keyword(String),
}

impl TryFrom<RawTabWidth> for TabWidth {
    type Error = String;

    fn try_from(raw: RawTabWidth) -> Result<Self, Self::Error> {
        match raw {
            RawTabWidth::Spaces(n) => Ok(TabWidth::Spaces(n)),
            RawTabWidth::Keyword(k) if k == "tab" => Ok(TabWidth::Tab),
            RawTabWidth::Keyword(k) => Err(format!("invalid tab width: {k}")),
        }
    }
}

impl From<TabWidth> for RawTabWidth {
    fn from(width: TabWidth) -> Self {
        match width {
            TabWidth::Spaces(n) => RawTabWidth::Spaces(n),
            TabWidth::Tab => RawTabWidth::Keyword("tab".to_string()),
        }
    }
}

/// XML encoder options; unset options take their own default
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XmlOptions {
    /// Emit an `<?xml ...?>` preamble (default: false)
    pub preamble: Option<bool>,
    /// Ignored: the preamble always declares UTF-8
    pub encoding: Option<String>,
    /// Indent nested elements (default: false)
    pub pretty: Option<bool>,
    /// Indentation in pretty mode (default: 2 spaces)
    pub tab_width: Option<TabWidth>,
    /// Add a `type` attribute to every element (default: false)
    pub typed: Option<bool>,
    /// Maximum nesting depth; zero or negative means unbounded (default: unbounded)
    pub depth: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct XmlEncoder {
    preamble: bool,
    indent: Option<String>,
    typed: bool,
    depth: Option<usize>,
}

impl Default for XmlEncoder {
    fn default() -> Self {
        Self::new(&XmlOptions::default())
    }
}

impl XmlEncoder {
    pub fn new(options: &XmlOptions) -> Self {
        let indent = options.pretty.unwrap_or(false).then(|| {
            match options.tab_width.unwrap_or(TabWidth::Spaces(2)) {
                TabWidth::Spaces(n) => " ".repeat(n),
                TabWidth::Tab => "\t".to_string(),
            }
        });
        let depth = options
            .depth
            .filter(|d| *d > 0)
            .and_then(|d| usize::try_from(d).ok());

        Self {
            preamble: options.preamble.unwrap_or(false),
            indent,
            typed: options.typed.unwrap_or(false),
            depth,
        }
    }

    pub fn stringify(&self, packet: &Packet) -> String {
        let mut out = String::new();
        if self.preamble {
            out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
            if self.indent.is_some() {
                out.push('\n');
            }
        }
        let record = serde_json::to_value(&packet.record).unwrap_or(Value::Null);
        self.element(&mut out, "record", &record, 0);
        out.push('\n');
        out
    }

    fn pad(&self, out: &mut String, level: usize) {
        if let Some(indent) = &self.indent {
            for _ in 0..level {
                out.push_str(indent);
            }
        }
    }

    fn open(&self, out: &mut String, name: &str, value: &Value) {
        out.push('<');
        out.push_str(name);
        if self.typed {
            out.push_str(" type=\"");
            out.push_str(type_name(value));
            out.push('"');
        }
    }

    fn element(&self, out: &mut String, name: &str, value: &Value, level: usize) {
        self.pad(out, level);
        self.open(out, name, value);

        let children: Vec<(String, &Value)> = match value {
            Value::Null => {
                out.push_str("/>");
                return;
            }
            Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                out.push('>');
                out.push_str(&escape(&scalar_text(value)));
                close(out, name);
                return;
            }
            Value::Array(items) => items.iter().map(|v| ("item".to_string(), v)).collect(),
            Value::Object(map) => map.iter().map(|(k, v)| (element_name(k), v)).collect(),
        };

        out.push('>');
        if self.depth.is_some_and(|max| level >= max) {
            out.push_str(&escape(&value.to_string()));
            close(out, name);
            return;
        }
        if children.is_empty() {
            close(out, name);
            return;
        }
        for (child_name, child) in children {
            if self.indent.is_some() {
                out.push('\n');
            }
            self.element(out, &child_name, child, level + 1);
        }
        if self.indent.is_some() {
            out.push('\n');
            self.pad(out, level);
        }
        close(out, name);
    }
}

fn close(out: &mut String, name: &str) {
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Map an object key to a valid element name
fn element_name(key: &str) -> String {
    let mut name: String = key
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !name.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        name.insert(0, '_');
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use scriv_core::{LogLevel, LogRecord, Payload};
    use serde_json::json;

    fn packet(payload: Vec<Value>) -> Packet {
        let time = DateTime::parse_from_rfc3339("2024-06-07T08:09:10Z")
            .unwrap()
            .with_timezone(&Utc);
        Packet::new(LogRecord::at(time, LogLevel::Info, Payload::from(payload)), "api")
    }

    #[test]
    fn test_compact_record() {
        let out = XmlEncoder::default().stringify(&packet(vec![json!("a<b"), json!(3)]));
        assert_eq!(
            out,
            "<record><level>info</level><payload><item>a&lt;b</item><item>3</item></payload>\
             <time>2024-06-07T08:09:10Z</time></record>\n"
        );
    }

    #[test]
    fn test_preamble_and_typed() {
        let encoder = XmlEncoder::new(&XmlOptions {
            preamble: Some(true),
            typed: Some(true),
            encoding: Some("latin1".into()),
            ..Default::default()
        });
        let out = encoder.stringify(&packet(vec![Value::Null]));
        assert!(out.starts_with(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><record type=\"object\">"
        ));
        assert!(out.contains("<item type=\"null\"/>"));
    }

    #[test]
    fn test_pretty_indents() {
        let encoder = XmlEncoder::new(&XmlOptions {
            pretty: Some(true),
            tab_width: Some(TabWidth::Tab),
            ..Default::default()
        });
        let out = encoder.stringify(&packet(vec![json!({"user id": 7})]));
        assert!(out.contains("\n\t<level>info</level>"));
        assert!(out.contains("\n\t\t\t<user_id>7</user_id>"));
    }

    #[test]
    fn test_depth_limit_inlines_json() {
        let encoder = XmlEncoder::new(&XmlOptions {
            depth: Some(2),
            ..Default::default()
        });
        let out = encoder.stringify(&packet(vec![json!({"a": {"b": 1}})]));
        assert!(out.contains("<item>{&quot;a&quot;:{&quot;b&quot;:1}}</item>"));
    }

    #[test]
    fn test_tab_width_deserializes() {
        let opts: XmlOptions = serde_json::from_str(r#"{"tab_width": "tab"}"#).unwrap();
        assert_eq!(opts.tab_width, Some(TabWidth::Tab));
        let opts: XmlOptions = serde_json::from_str(r#"{"tab_width": 4}"#).unwrap();
        assert_eq!(opts.tab_width, Some(TabWidth::Spaces(4)));
    }
}

//! Delimited plain-text encoder

use serde::{Deserialize, Serialize};
use serde_json::Value;

use scriv_core::{LogLevel, Packet, date_only, full_time, time_only};

/// Text encoder options; unset options take their own default
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOptions {
    /// Include the date (default: true)
    pub date: Option<bool>,
    /// Include the time of day (default: true)
    pub time: Option<bool>,
    /// Include the level label (default: true)
    pub level: Option<bool>,
    /// Use abbreviated labels and route (default: false)
    pub minify: Option<bool>,
    /// Include the `[from => to]` route (default: false)
    pub route: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stamp {
    None,
    Full,
    DateOnly,
    TimeOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Labels {
    None,
    Minified,
    Full,
    Aligned,
}

/// Plain-text encoder with resolved options
#[derive(Debug, Clone)]
pub struct TextEncoder {
    stamp: Stamp,
    labels: Labels,
    route: Option<bool>,
}

impl Default for TextEncoder {
    fn default() -> Self {
        Self::new(&TextOptions::default())
    }
}

impl TextEncoder {
    pub fn new(options: &TextOptions) -> Self {
        let date = options.date.unwrap_or(true);
        let time = options.time.unwrap_or(true);
        let level = options.level.unwrap_or(true);
        let minify = options.minify.unwrap_or(false);
        let route = options.route.unwrap_or(false);

        let stamp = match (date, time) {
            (true, true) => Stamp::Full,
            (true, false) => Stamp::DateOnly,
            (false, true) => Stamp::TimeOnly,
            (false, false) => Stamp::None,
        };

        let labels = match (level, minify, route) {
            (false, _, _) => Labels::None,
            (true, true, _) => Labels::Minified,
            (true, false, true) => Labels::Full,
            (true, false, false) => Labels::Aligned,
        };

        Self {
            stamp,
            labels,
            // Some(minified) when the route is shown
            route: route.then_some(minify),
        }
    }

    fn label(&self, level: LogLevel) -> &'static str {
        match self.labels {
            Labels::None => "",
            Labels::Minified => match level {
                LogLevel::Log => "[L]: ",
                LogLevel::Error => "[E]: ",
                LogLevel::Info => "[I]: ",
                LogLevel::Confirm => "[C]: ",
                LogLevel::Debug => "[D]: ",
                LogLevel::Warn => "[W]: ",
            },
            Labels::Full => match level {
                LogLevel::Log => "[LOG]: ",
                LogLevel::Error => "[ERROR]: ",
                LogLevel::Info => "[INFO]: ",
                LogLevel::Confirm => "[CONFIRM]: ",
                LogLevel::Debug => "[DEBUG]: ",
                LogLevel::Warn => "[WARNING]: ",
            },
            Labels::Aligned => match level {
                LogLevel::Log => "[LOG]:    \t",
                LogLevel::Error => "[ERROR]:  \t",
                LogLevel::Info => "[INFO]:   \t",
                LogLevel::Confirm => "[CONFIRM]:\t",
                LogLevel::Debug => "[DEBUG]:  \t",
                LogLevel::Warn => "[WARNING]:\t",
            },
        }
    }

    pub fn stringify(&self, packet: &Packet) -> String {
        let mut out = String::new();

        match self.route {
            Some(true) => out.push_str(&format!("[{}=>{}]", packet.from, packet.to)),
            Some(false) => out.push_str(&format!("[{} => {}]", packet.from, packet.to)),
            None => {}
        }

        let time = &packet.record.time;
        match self.stamp {
            Stamp::Full => out.push_str(&full_time(time)),
            Stamp::DateOnly => out.push_str(&date_only(time)),
            Stamp::TimeOnly => out.push_str(&time_only(time)),
            Stamp::None => {}
        }

        out.push_str(self.label(packet.record.level));

        for item in packet.record.payload.values() {
            if let Some(rendered) = render_item(item) {
                out.push_str(" | ");
                out.push_str(&rendered);
            }
        }

        out.push('\n');
        out
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(render_scalar).collect::<Vec<_>>().join(","),
        Value::Object(_) => "Object".to_string(),
    }
}

fn render_item(value: &Value) -> Option<String> {
    let rendered = match value {
        Value::Null => return None,
        Value::Array(items) if items.is_empty() => "[]".to_string(),
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(render_scalar).collect::<Vec<_>>().join(", ")
        ),
        other => render_scalar(other),
    };
    (!rendered.is_empty()).then_some(rendered)
}

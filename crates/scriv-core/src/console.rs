//! Human-readable console echo for producers
//!
//! Everything here is a pure function of its arguments; whether ANSI
//! escapes are emitted is an explicit flag, never read from the process
//! environment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::level::LogLevel;
use crate::producer::RunMode;

/// Foreground/background colors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Purple,
    Turquoise,
    White,
}

impl Color {
    fn code(self) -> u8 {
        match self {
            Color::Black => 0,
            Color::Red => 1,
            Color::Green => 2,
            Color::Yellow => 3,
            Color::Blue => 4,
            Color::Purple => 5,
            Color::Turquoise => 6,
            Color::White => 7,
        }
    }

    pub fn for_level(level: LogLevel) -> Self {
        match level {
            LogLevel::Log => Color::White,
            LogLevel::Error => Color::Red,
            LogLevel::Info => Color::Turquoise,
            LogLevel::Confirm => Color::Green,
            LogLevel::Debug => Color::Purple,
            LogLevel::Warn => Color::Yellow,
        }
    }
}

/// Text styles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Reset,
    Bold,
    Faded,
    Italic,
    Underline,
    Flicker,
}

impl Style {
    fn code(self) -> u8 {
        match self {
            Style::Reset => 0,
            Style::Bold => 1,
            Style::Faded => 2,
            Style::Italic => 3,
            Style::Underline => 4,
            Style::Flicker => 5,
        }
    }
}

/// Build an SGR escape sequence. With no arguments this is the reset sequence.
pub fn dye(style: Option<Style>, fg: Option<Color>, bg: Option<Color>, ansi: bool) -> String {
    if !ansi {
        return String::new();
    }
    let mut codes = Vec::with_capacity(3);
    if let Some(style) = style {
        codes.push(style.code().to_string());
    }
    if let Some(fg) = fg {
        codes.push(format!("3{}", fg.code()));
    }
    if let Some(bg) = bg {
        codes.push(format!("4{}", bg.code()));
    }
    if codes.is_empty() {
        return "\x1b[0m".to_string();
    }
    format!("\x1b[{}m", codes.join(";"))
}

fn emoji(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Log => "\u{1F4C4}",
        LogLevel::Error => "\u{26D4}",
        LogLevel::Info => "\u{1F50D}",
        LogLevel::Debug => "\u{1F527}",
        LogLevel::Warn => "\u{26A1}",
        LogLevel::Confirm => "\u{2705}",
    }
}

/// `[DD.MM.YYYY|hh:mm:ss]`
pub fn full_time(time: &DateTime<Utc>) -> String {
    time.format("[%d.%m.%Y|%H:%M:%S]").to_string()
}

/// `[DD.MM.YYYY]`
pub fn date_only(time: &DateTime<Utc>) -> String {
    time.format("[%d.%m.%Y]").to_string()
}

/// `[hh:mm:ss]`
pub fn time_only(time: &DateTime<Utc>) -> String {
    time.format("[%H:%M:%S]").to_string()
}

/// Presentation options for the console echo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrettyOptions {
    pub on: bool,
    pub title: String,
    pub time: bool,
    pub emoji: bool,
}

impl Default for PrettyOptions {
    fn default() -> Self {
        Self {
            on: true,
            title: String::new(),
            time: true,
            emoji: false,
        }
    }
}

/// Console echo configuration of a producer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub on: bool,
    pub run_mode: RunMode,
    pub pretty: PrettyOptions,
    /// Emit ANSI escapes
    pub ansi: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            on: true,
            run_mode: RunMode::Development,
            pretty: PrettyOptions::default(),
            ansi: true,
        }
    }
}

impl ConsoleConfig {
    /// Console echo switched off entirely
    pub fn silent() -> Self {
        Self {
            on: false,
            ..Default::default()
        }
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Format one console line for a record
pub fn format_console_line(
    level: LogLevel,
    time: &DateTime<Utc>,
    payload: &[Value],
    pretty: &PrettyOptions,
    ansi: bool,
) -> String {
    let body = payload.iter().map(render_value).collect::<Vec<_>>().join(" ");
    let label = level.as_str().to_uppercase();

    if !pretty.on {
        return format!("{label}: {body}");
    }

    let head = if pretty.emoji { emoji(level).to_string() } else { label };
    let stamp = if pretty.time {
        format!("{} ", full_time(time))
    } else {
        String::new()
    };

    format!(
        "{}{}: {}{}\n{}{}",
        dye(Some(Style::Bold), Some(Color::for_level(level)), None, ansi),
        head,
        stamp,
        pretty.title,
        body,
        dye(None, None, None, ansi),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_dye_disabled_is_empty() {
        assert_eq!(dye(Some(Style::Bold), Some(Color::Red), None, false), "");
    }

    #[test]
    fn test_dye_sequences() {
        assert_eq!(dye(None, None, None, true), "\x1b[0m");
        assert_eq!(dye(Some(Style::Bold), Some(Color::Red), None, true), "\x1b[1;31m");
        assert_eq!(dye(None, Some(Color::Green), Some(Color::Blue), true), "\x1b[32;44m");
        assert_eq!(dye(None, None, Some(Color::White), true), "\x1b[47m");
    }

    #[test]
    fn test_time_formats() {
        assert_eq!(full_time(&at()), "[02.01.2024|03:04:05]");
        assert_eq!(date_only(&at()), "[02.01.2024]");
        assert_eq!(time_only(&at()), "[03:04:05]");
    }

    #[test]
    fn test_plain_console_line() {
        let line = format_console_line(
            LogLevel::Warn,
            &at(),
            &[json!("disk"), json!(93)],
            &PrettyOptions::default(),
            false,
        );
        assert_eq!(line, "WARN: [02.01.2024|03:04:05] \ndisk 93");
    }

    #[test]
    fn test_emoji_and_title() {
        let pretty = PrettyOptions {
            emoji: true,
            time: false,
            title: "api".into(),
            ..Default::default()
        };
        let line = format_console_line(LogLevel::Confirm, &at(), &[json!("ok")], &pretty, false);
        assert_eq!(line, "\u{2705}: api\nok");
    }

    #[test]
    fn test_pretty_off() {
        let pretty = PrettyOptions {
            on: false,
            ..Default::default()
        };
        let line = format_console_line(LogLevel::Info, &at(), &[json!("x")], &pretty, true);
        assert_eq!(line, "INFO: x");
    }
}

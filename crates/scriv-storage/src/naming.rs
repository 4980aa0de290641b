//! File naming templates
//!
//! A template such as `log-{YYYY}-{MM}-{DD}_{hh}-{mm}-{ss}.log` expands to
//! a concrete file name and compiles to an anchored regex that recognizes
//! every name it can produce. Date and time tokens use UTC.
//!
//! | token     | expands to                     | matches                      |
//! |-----------|--------------------------------|------------------------------|
//! | `{YYYY}`  | four-digit year                | `\d{4}`                      |
//! | `{MM}`    | month `01`-`12`                | `(0[1-9]\|1[0-2])`           |
//! | `{DD}`    | day `01`-`31`                  | `(0[1-9]\|[12][0-9]\|3[01])` |
//! | `{hh}`    | hour `00`-`23`                 | `(0[0-9]\|1[0-9]\|2[0-3])`   |
//! | `{mm}`    | minute `00`-`59`               | `[0-5][0-9]`                 |
//! | `{ss}`    | second `00`-`59`               | `[0-5][0-9]`                 |
//! | `{chunk}` | `(<n>)`                        | `\(\d+\)`                    |
//! | `{hash}`  | `<base36 millis>-<base36 rand>`| `[a-zA-Z0-9]+-[a-zA-Z0-9]+`  |

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Timelike, Utc};
use rand::Rng;
use regex::{Captures, Regex};

use crate::error::ConfigError;

/// Template used when none is configured
pub const DEFAULT_PATTERN: &str = "log-{YYYY}-{MM}-{DD}_{hh}-{mm}-{ss}.log";

/// Extension appended to archived files
pub const COMPRESSED_EXT: &str = "gz";

const CHUNK_TOKEN: &str = "{chunk}";
const HASH_TOKEN: &str = "{hash}";

static TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(YYYY|MM|DD|hh|mm|ss|chunk|hash)\}").expect("token regex is valid")
});

static CHUNK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d+)\)").expect("chunk regex is valid"));

fn token_fragment(token: &str) -> &'static str {
    match token {
        "YYYY" => r"\d{4}",
        "MM" => "(0[1-9]|1[0-2])",
        "DD" => "(0[1-9]|[12][0-9]|3[01])",
        "hh" => "(0[0-9]|1[0-9]|2[0-3])",
        "mm" | "ss" => "[0-5][0-9]",
        "chunk" => r"\(\d+\)",
        // "hash"
        _ => "[a-zA-Z0-9]+-[a-zA-Z0-9]+",
    }
}

/// Add `{chunk}` and `{hash}` if the template lacks them, before the
/// extension when there is one.
pub fn ensure_chunk_and_hash(template: &str) -> String {
    let (base, extension) = match template.rfind('.') {
        Some(dot) => template.split_at(dot),
        None => (template, ""),
    };

    let mut base = base.to_string();
    if !template.contains(CHUNK_TOKEN) {
        base.push('-');
        base.push_str(CHUNK_TOKEN);
    }
    if !template.contains(HASH_TOKEN) {
        base.push('-');
        base.push_str(HASH_TOKEN);
    }
    base + extension
}

/// Compile a template into an anchored regex; literal text is matched verbatim.
pub fn compile(template: &str) -> Result<Regex, ConfigError> {
    let mut source = String::from("^");
    let mut last = 0;
    for captures in TOKEN_REGEX.captures_iter(template) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        source.push_str(&regex::escape(&template[last..whole.start()]));
        source.push_str(token_fragment(&captures[1]));
        last = whole.end();
    }
    source.push_str(&regex::escape(&template[last..]));
    source.push('$');

    Regex::new(&source).map_err(|e| ConfigError::InvalidPattern(e.to_string()))
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Base-36 millisecond timestamp plus a random base-36 suffix
pub fn generate_unique_hash() -> String {
    let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
    let random: u64 = rand::rng().random_range(36u64.pow(7)..36u64.pow(11));
    format!("{}-{}", to_base36(millis), to_base36(random))
}

/// Chunk number embedded in a file name as `(<n>)`, or 1 when absent
pub fn extract_chunk(file_name: &str) -> u32 {
    CHUNK_REGEX
        .captures(file_name)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(1)
}

/// A validated file naming template with its compiled matcher
#[derive(Debug, Clone)]
pub struct NamingPattern {
    template: String,
    matcher: Regex,
}

impl Default for NamingPattern {
    fn default() -> Self {
        // The default template is known to compile
        Self::new(DEFAULT_PATTERN).expect("default pattern is valid")
    }
}

impl NamingPattern {
    /// Build a pattern from a template. An empty template selects
    /// [`DEFAULT_PATTERN`]; path separators are rejected.
    pub fn new(template: &str) -> Result<Self, ConfigError> {
        let template = if template.trim().is_empty() {
            DEFAULT_PATTERN
        } else {
            template
        };
        if template.contains('/') || template.contains('\\') {
            return Err(ConfigError::InvalidPattern(format!(
                "'{template}' must be a file name, not a path"
            )));
        }

        let template = ensure_chunk_and_hash(template);
        let matcher = compile(&template)?;
        Ok(Self { template, matcher })
    }

    /// Template including the `{chunk}` and `{hash}` tokens
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn expand(&self, time: DateTime<Utc>, chunk: u32, hash: &str) -> String {
        TOKEN_REGEX
            .replace_all(&self.template, |captures: &Captures<'_>| match &captures[1] {
                "YYYY" => format!("{:04}", time.year()),
                "MM" => format!("{:02}", time.month()),
                "DD" => format!("{:02}", time.day()),
                "hh" => format!("{:02}", time.hour()),
                "mm" => format!("{:02}", time.minute()),
                "ss" => format!("{:02}", time.second()),
                "chunk" => format!("({chunk})"),
                _ => hash.to_string(),
            })
            .into_owned()
    }

    /// Fresh file name for `chunk` at the current time
    pub fn file_name(&self, chunk: u32) -> String {
        self.expand(Utc::now(), chunk, &generate_unique_hash())
    }

    /// Whether `name` was produced by this pattern, compressed or not
    pub fn matches(&self, name: &str) -> bool {
        self.matcher.is_match(name)
            || strip_compressed(name).is_some_and(|plain| self.matcher.is_match(plain))
    }

    /// Whether `name` was produced by this pattern and is not compressed
    pub fn matches_uncompressed(&self, name: &str) -> bool {
        strip_compressed(name).is_none() && self.matcher.is_match(name)
    }
}

fn strip_compressed(name: &str) -> Option<&str> {
    name.strip_suffix(COMPRESSED_EXT)?.strip_suffix('.')
}

//! Human duration strings such as `"14D"` or `"90m"`

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::error::ConfigError;

const SECOND_MS: u64 = 1_000;
const MINUTE_MS: u64 = 60 * SECOND_MS;
const HOUR_MS: u64 = 60 * MINUTE_MS;
const DAY_MS: u64 = 24 * HOUR_MS;

/// Fallback for zero or negative lifetimes
pub const MONTH: Duration = Duration::from_millis(30 * DAY_MS);

/// Default age after which files are deleted
pub const DEFAULT_RETENTION: &str = "14D";

/// Default age after which files are compressed (half of the default retention)
pub const DEFAULT_ARCHIVE_AFTER: &str = "7D";

static LIFETIME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-?\d+)(ms|s|m|h|D|W|M|Y)$").expect("lifetime regex is valid")
});

fn unit_ms(unit: &str) -> u64 {
    match unit {
        "ms" => 1,
        "s" => SECOND_MS,
        "m" => MINUTE_MS,
        "h" => HOUR_MS,
        "D" => DAY_MS,
        "W" => 7 * DAY_MS,
        "M" => 30 * DAY_MS,
        // "Y"
        _ => 365 * DAY_MS,
    }
}

/// Parse a lifetime string into a duration.
///
/// Units are case-sensitive: `ms`, `s`, `m` (minutes), `h`, `D`, `W`,
/// `M` (30 days) and `Y` (365 days). A value of zero or below yields
/// [`MONTH`] instead of an error.
pub fn parse_lifetime(input: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidLifetime(input.to_string());
    let captures = LIFETIME_REGEX.captures(input.trim()).ok_or_else(invalid)?;

    let amount: i64 = captures[1].parse().map_err(|_| invalid())?;
    if amount <= 0 {
        return Ok(MONTH);
    }

    let ms = (amount as u64)
        .checked_mul(unit_ms(&captures[2]))
        .ok_or_else(invalid)?;
    Ok(Duration::from_millis(ms))
}

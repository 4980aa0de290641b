//! Five-field cron schedules evaluated in UTC
//!
//! Expressions are `minute hour day-of-month month day-of-week` and are
//! parsed by [`saffron`]. An expression that can never fire is rejected.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use saffron::Cron;

use crate::error::ConfigError;

/// Every fifteen minutes; used for the current-file existence check
pub const EVERY_QUARTER_HOUR: &str = "*/15 * * * *";

/// Midnight UTC
pub const DAILY_AT_MIDNIGHT: &str = "0 0 * * *";

/// A parsed cron expression
#[derive(Clone)]
pub struct CronSchedule {
    expression: String,
    cron: Arc<Cron>,
}

impl CronSchedule {
    pub fn parse(expression: &str) -> Result<Self, ConfigError> {
        let fields = expression.split_whitespace().count();
        if fields != 5 {
            return Err(ConfigError::schedule(
                expression,
                format!("expected 5 fields, found {fields}"),
            ));
        }

        let cron: Cron = expression
            .parse()
            .map_err(|e| ConfigError::schedule(expression, format!("{e:?}")))?;
        if !cron.any() {
            return Err(ConfigError::schedule(expression, "never fires"));
        }

        Ok(Self {
            expression: expression.to_string(),
            cron: Arc::new(cron),
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// First firing time strictly after `after`
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.cron.next_after(after)
    }

    /// Time to wait from `now` until the next firing
    pub fn delay_from(&self, now: DateTime<Utc>) -> Option<Duration> {
        let next = self.next_after(now)?;
        (next - now).to_std().ok()
    }
}

impl PartialEq for CronSchedule {
    fn eq(&self, other: &Self) -> bool {
        self.expression == other.expression
    }
}

impl Eq for CronSchedule {}

impl fmt::Debug for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CronSchedule").field(&self.expression).finish()
    }
}

impl FromStr for CronSchedule {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

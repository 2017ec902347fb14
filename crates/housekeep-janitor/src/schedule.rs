//! Cron-style sweep schedule

use crate::JanitorError;
use chrono::{DateTime, Local};
use cron::Schedule;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// When scheduled sweeps run
///
/// Accepts the standard five-field syntax (`min hour dom month dow`) as well
/// as the six/seven-field form with a leading seconds field. Expressions are
/// evaluated in local time.
///
/// # Examples
///
/// ```
/// use chrono::{Local, TimeZone};
/// use housekeep_janitor::SweepSchedule;
///
/// let schedule = SweepSchedule::parse("0 6 * * *").unwrap();
/// let now = Local.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap();
/// let next = schedule.next_after(now).unwrap();
/// assert_eq!(next, Local.with_ymd_and_hms(2024, 5, 2, 6, 0, 0).unwrap());
/// ```
#[derive(Clone)]
pub struct SweepSchedule {
    expression: String,
    schedule: Schedule,
}

impl SweepSchedule {
    /// Parse a cron expression
    pub fn parse(expression: &str) -> Result<Self, JanitorError> {
        let expression = expression.trim();
        let fields = expression.split_whitespace().count();

        // The cron crate always wants a seconds field
        let normalized = if fields == 5 {
            format!("0 {expression}")
        } else {
            expression.to_string()
        };

        let schedule = Schedule::from_str(&normalized).map_err(|e| {
            JanitorError::Config(format!(
                "invalid value '{expression}' for config field 'sweep-schedule'. \
                 Expected a cron-style expression, like '59 23 * * *' ({e})"
            ))
        })?;

        Ok(Self {
            expression: expression.to_string(),
            schedule,
        })
    }

    /// Expression as written in the configuration
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// First scheduled time strictly after `now`
    pub fn next_after(&self, now: DateTime<Local>) -> Option<DateTime<Local>> {
        self.schedule.after(&now).next()
    }

    /// Next scheduled time and how long to wait for it
    pub fn delay_until_next(&self, now: DateTime<Local>) -> Option<(DateTime<Local>, Duration)> {
        let next = self.next_after(now)?;
        let delay = (next - now).to_std().unwrap_or(Duration::ZERO);
        Some((next, delay))
    }
}

impl fmt::Debug for SweepSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SweepSchedule").field(&self.expression).finish()
    }
}

impl fmt::Display for SweepSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

impl PartialEq for SweepSchedule {
    fn eq(&self, other: &Self) -> bool {
        self.expression == other.expression
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_five_field_expression() {
        let schedule = SweepSchedule::parse("30 23 * * *").unwrap();
        let now = Local.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        assert_eq!(
            schedule.next_after(now),
            Some(Local.with_ymd_and_hms(2024, 5, 1, 23, 30, 0).unwrap())
        );
        assert_eq!(schedule.expression(), "30 23 * * *");
    }

    #[test]
    fn test_six_field_expression_with_seconds() {
        let schedule = SweepSchedule::parse("*/10 * * * * *").unwrap();
        let now = Local.with_ymd_and_hms(2024, 5, 1, 12, 0, 3).unwrap();

        assert_eq!(
            schedule.next_after(now),
            Some(Local.with_ymd_and_hms(2024, 5, 1, 12, 0, 10).unwrap())
        );
    }

    #[test]
    fn test_next_is_strictly_after_now() {
        let schedule = SweepSchedule::parse("0 6 * * *").unwrap();
        let now = Local.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap();

        assert_eq!(
            schedule.next_after(now),
            Some(Local.with_ymd_and_hms(2024, 5, 2, 6, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_delay_until_next() {
        let schedule = SweepSchedule::parse("0 6 * * *").unwrap();
        let now = Local.with_ymd_and_hms(2024, 5, 1, 5, 0, 0).unwrap();

        let (_, delay) = schedule.delay_until_next(now).unwrap();
        assert_eq!(delay, Duration::from_secs(3600));
    }

    #[test]
    fn test_invalid_expression_names_field() {
        let err = SweepSchedule::parse("every morning").unwrap_err();
        assert!(err.to_string().contains("sweep-schedule"));
        assert!(SweepSchedule::parse("61 * * * *").is_err());
    }
}

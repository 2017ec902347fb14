//! Configuration for housekeeping operations
//!
//! Defines the maximum image age and the sweep schedule.

use crate::{JanitorError, SweepSchedule};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default sweep schedule: every day at 06:00
pub const DEFAULT_SWEEP_SCHEDULE: &str = "0 6 * * *";

/// Default maximum image age: one week
pub const DEFAULT_MAX_AGE: &str = "1w";

/// Configuration for the housekeeping service
///
/// Loaded from TOML. Keys use the kebab-case names of the configuration
/// file; missing keys take their defaults.
///
/// ```toml
/// sweep-schedule = "0 6 * * *"
/// max-age = "3d12h"
/// ```
///
/// # Examples
///
/// ```
/// use housekeep_janitor::HousekeepConfig;
/// use std::time::Duration;
///
/// let config = HousekeepConfig::from_toml_str("max-age = \"3d12h\"").unwrap();
/// assert_eq!(config.max_age, Duration::from_secs(84 * 3600));
/// assert_eq!(config.sweep_schedule.expression(), "0 6 * * *");
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawConfig")]
pub struct HousekeepConfig {
    /// When scheduled sweeps run
    pub sweep_schedule: SweepSchedule,

    /// Images unused for longer than this are deleted by a sweep
    pub max_age: Duration,
}

/// On-disk form of [`HousekeepConfig`]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawConfig {
    #[serde(default = "default_sweep_schedule")]
    sweep_schedule: String,

    #[serde(default = "default_max_age")]
    max_age: String,
}

fn default_sweep_schedule() -> String {
    DEFAULT_SWEEP_SCHEDULE.to_string()
}

fn default_max_age() -> String {
    DEFAULT_MAX_AGE.to_string()
}

impl TryFrom<RawConfig> for HousekeepConfig {
    type Error = String;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        let message = |e: JanitorError| match e {
            JanitorError::Config(msg) => msg,
            other => other.to_string(),
        };
        Ok(Self {
            sweep_schedule: SweepSchedule::parse(&raw.sweep_schedule).map_err(message)?,
            max_age: parse_max_age(&raw.max_age).map_err(message)?,
        })
    }
}

/// Parse a duration such as `"1w"`, `"3d12h"` or `"90min"`
pub fn parse_max_age(value: &str) -> Result<Duration, JanitorError> {
    humantime::parse_duration(value.trim()).map_err(|e| {
        JanitorError::Config(format!(
            "invalid value '{value}' for config field 'max-age'. \
             Expected a qualified time duration, like '3d12h' ({e})"
        ))
    })
}

impl Default for HousekeepConfig {
    /// Daily sweep at 06:00, one week maximum age
    fn default() -> Self {
        Self {
            sweep_schedule: SweepSchedule::parse(DEFAULT_SWEEP_SCHEDULE)
                .expect("default sweep schedule is a valid cron expression"),
            max_age: Duration::from_secs(7 * 86400),
        }
    }
}

impl HousekeepConfig {
    /// Images unused for longer than this are stale
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// When scheduled sweeps run
    pub fn schedule(&self) -> &SweepSchedule {
        &self.sweep_schedule
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, JanitorError> {
        toml::from_str(contents).map_err(|e| JanitorError::Config(e.message().to_string()))
    }

    /// Load configuration from a TOML file
    ///
    /// A missing file yields the default configuration.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, JanitorError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents).map_err(|e| match e {
                JanitorError::Config(msg) => {
                    JanitorError::Config(format!("{}: {}", path.display(), msg))
                }
                other => other,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no configuration file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(JanitorError::Config(format!(
                "failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = HousekeepConfig::default();
        assert_eq!(config.sweep_schedule.expression(), "0 6 * * *");
        assert_eq!(config.max_age, Duration::from_secs(7 * 86400));
    }

    #[test]
    fn test_empty_file_takes_defaults() {
        let config = HousekeepConfig::from_toml_str("").unwrap();
        assert_eq!(config, HousekeepConfig::default());
    }

    #[test]
    fn test_parse_both_fields() {
        let config = HousekeepConfig::from_toml_str(
            r#"
            sweep-schedule = "59 23 * * *"
            max-age = "2d"
            "#,
        )
        .unwrap();

        assert_eq!(config.sweep_schedule.expression(), "59 23 * * *");
        assert_eq!(config.max_age, Duration::from_secs(2 * 86400));
    }

    #[test]
    fn test_max_age_formats() {
        assert_eq!(parse_max_age("1w").unwrap(), Duration::from_secs(7 * 86400));
        assert_eq!(parse_max_age("3d12h").unwrap(), Duration::from_secs(84 * 3600));
        assert_eq!(parse_max_age("90min").unwrap(), Duration::from_secs(90 * 60));
        assert!(parse_max_age("soon").is_err());
    }

    #[test]
    fn test_invalid_values_name_the_field() {
        let err = HousekeepConfig::from_toml_str("max-age = \"forever\"").unwrap_err();
        assert!(err.to_string().contains("max-age"));

        let err = HousekeepConfig::from_toml_str("sweep-schedule = \"daily\"").unwrap_err();
        assert!(err.to_string().contains("sweep-schedule"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(HousekeepConfig::from_toml_str("max_age = \"1d\"").is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = HousekeepConfig::from_file(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, HousekeepConfig::default());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max-age = \"12h\"").unwrap();

        let config = HousekeepConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_age, Duration::from_secs(12 * 3600));
    }
}

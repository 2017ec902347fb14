//! State module - the persisted image usage record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Durable record of image usage
///
/// Holds the last time each image was referenced and the watermark used to
/// resume the engine's event stream. The serialized form is the state file:
///
/// ```json
/// {"timestamp": "2024-05-01T06:00:00Z", "last_used": {"sha256:abc": "2024-05-01T05:59:58Z"}}
/// ```
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use housekeep_domain::State;
///
/// let mut state = State::new();
/// let t = Utc.timestamp_opt(1000, 0).unwrap();
/// state.touch("sha256:abc", t);
/// assert_eq!(state.last_used("sha256:abc"), Some(t));
/// assert!(state.forget("sha256:abc"));
/// assert!(!state.forget("sha256:abc"));
/// ```
///
/// Both keys are required and no others are allowed, so a file of some other
/// shape is rejected instead of reading as an empty record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct State {
    /// Time of the last processed event; `None` replays from the beginning
    #[serde(rename = "timestamp", deserialize_with = "required_watermark")]
    pub watermark: Option<DateTime<Utc>>,

    /// Image id → last time it was used
    pub last_used: HashMap<String, DateTime<Utc>>,
}

/// `timestamp` may be null but must be present
fn required_watermark<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::deserialize(deserializer)
}

/// Result of [`State::advance_watermark`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatermarkAdvance {
    /// The watermark moved forward (or was set for the first time)
    Advanced,
    /// The event is older than the watermark; the watermark was kept
    Regressed {
        /// Watermark that was kept
        current: DateTime<Utc>,
    },
}

impl State {
    /// Create an empty state: no watermark, no tracked images
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `image` was used at `time`
    pub fn touch(&mut self, image: impl Into<String>, time: DateTime<Utc>) {
        self.last_used.insert(image.into(), time);
    }

    /// Stop tracking `image`
    ///
    /// Returns `false` when there was no entry to remove.
    pub fn forget(&mut self, image: &str) -> bool {
        self.last_used.remove(image).is_some()
    }

    /// Last recorded use of `image`
    pub fn last_used(&self, image: &str) -> Option<DateTime<Utc>> {
        self.last_used.get(image).copied()
    }

    /// Move the watermark to `time` unless that would move it backwards
    pub fn advance_watermark(&mut self, time: DateTime<Utc>) -> WatermarkAdvance {
        match self.watermark {
            Some(current) if time < current => WatermarkAdvance::Regressed { current },
            _ => {
                self.watermark = Some(time);
                WatermarkAdvance::Advanced
            }
        }
    }

    /// Entries last used strictly before `cutoff`
    pub fn stale_images(&self, cutoff: DateTime<Utc>) -> Vec<(String, DateTime<Utc>)> {
        self.last_used
            .iter()
            .filter(|(_, last_used)| **last_used < cutoff)
            .map(|(image, last_used)| (image.clone(), *last_used))
            .collect()
    }

    /// Number of tracked images
    pub fn len(&self) -> usize {
        self.last_used.len()
    }

    /// True when no image is tracked
    pub fn is_empty(&self) -> bool {
        self.last_used.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_new_state_is_empty() {
        let state = State::new();
        assert_eq!(state.watermark, None);
        assert!(state.is_empty());
    }

    #[test]
    fn test_touch_overwrites_previous_use() {
        let mut state = State::new();
        state.touch("sha256:abc", at(1000));
        state.touch("sha256:abc", at(2000));

        assert_eq!(state.len(), 1);
        assert_eq!(state.last_used("sha256:abc"), Some(at(2000)));
    }

    #[test]
    fn test_forget_missing_entry_leaves_state_unchanged() {
        let mut state = State::new();
        state.touch("sha256:abc", at(1000));
        let before = state.clone();

        assert!(!state.forget("sha256:missing"));
        assert_eq!(state, before);
    }

    #[test]
    fn test_watermark_advances_and_refuses_regression() {
        let mut state = State::new();
        assert_eq!(state.advance_watermark(at(2000)), WatermarkAdvance::Advanced);
        assert_eq!(
            state.advance_watermark(at(1500)),
            WatermarkAdvance::Regressed { current: at(2000) }
        );
        assert_eq!(state.watermark, Some(at(2000)));

        // Equal timestamps are common within one second and are not a regression
        assert_eq!(state.advance_watermark(at(2000)), WatermarkAdvance::Advanced);
    }

    #[test]
    fn test_stale_images_uses_strict_cutoff() {
        let mut state = State::new();
        state.touch("old", at(100));
        state.touch("edge", at(500));
        state.touch("fresh", at(900));

        let stale = state.stale_images(at(500));
        assert_eq!(stale, vec![("old".to_string(), at(100))]);
    }

    #[test]
    fn test_serialized_shape() {
        let mut state = State::new();
        state.advance_watermark(at(2000));
        state.touch("sha256:abc", at(1000));

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["timestamp"], "1970-01-01T00:33:20Z");
        assert_eq!(value["last_used"]["sha256:abc"], "1970-01-01T00:16:40Z");
    }

    #[test]
    fn test_deserialize_rejects_other_shapes() {
        for json in [
            "{}",
            r#"{"last_used": {}}"#,
            r#"{"timestamp": null}"#,
            r#"{"timestamp": null, "lastUsed": {}}"#,
            r#"{"timestamp": null, "last_used": {}, "images": {}}"#,
        ] {
            assert!(serde_json::from_str::<State>(json).is_err(), "accepted {json}");
        }
    }

    #[test]
    fn test_deserialize_accepts_offsets_and_null_watermark() {
        let json = r#"{
            "timestamp": null,
            "last_used": {"sha256:abc": "2024-05-01T08:00:00+02:00"}
        }"#;
        let state: State = serde_json::from_str(json).unwrap();

        assert_eq!(state.watermark, None);
        assert_eq!(
            state.last_used("sha256:abc"),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap())
        );
    }
}

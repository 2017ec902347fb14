//! Event module - engine lifecycle records and their effect on state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Image actions that count as a use of the image
///
/// `import`, `load` and `pull` are always followed by a `save` event with the
/// same effect, and `push` does not use the image, so none of them appear here.
const IMAGE_USE_ACTIONS: [&str; 3] = ["save", "tag", "untag"];

/// An immutable lifecycle record received from the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Resource type ("image", "container", "network", ...)
    pub kind: String,

    /// What happened ("tag", "delete", "create", "exec_create: sh", ...)
    pub action: String,

    /// Identifier of the resource the event is about
    pub subject_id: String,

    /// When the engine recorded the event
    pub time: DateTime<Utc>,
}

/// What an event asks the state tracker to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventEffect<'a> {
    /// Record a use of the image at the event time
    Touch {
        /// Image id
        image: &'a str,
    },
    /// The image is gone, stop tracking it
    Forget {
        /// Image id
        image: &'a str,
    },
    /// A container was created; its image must be looked up
    InspectContainer {
        /// Container id
        container: &'a str,
    },
    /// No state change
    Ignore,
}

impl Event {
    /// Create an event
    pub fn new(
        kind: impl Into<String>,
        action: impl Into<String>,
        subject_id: impl Into<String>,
        time: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: kind.into(),
            action: action.into(),
            subject_id: subject_id.into(),
            time,
        }
    }

    /// Classify the event
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use housekeep_domain::{Event, EventEffect};
    ///
    /// let event = Event::new("image", "pull", "nginx:latest", Utc::now());
    /// assert_eq!(event.effect(), EventEffect::Ignore);
    ///
    /// let event = Event::new("container", "exec_create: sh", "c0ffee", Utc::now());
    /// assert_eq!(event.effect(), EventEffect::InspectContainer { container: "c0ffee" });
    /// ```
    pub fn effect(&self) -> EventEffect<'_> {
        match self.kind.as_str() {
            "image" if self.action == "delete" => EventEffect::Forget {
                image: &self.subject_id,
            },
            "image" if IMAGE_USE_ACTIONS.contains(&self.action.as_str()) => EventEffect::Touch {
                image: &self.subject_id,
            },
            // Docker appends the command to exec actions ("exec_create: sh -c ...")
            "container"
                if self.action.starts_with("create") || self.action.starts_with("exec_create") =>
            {
                EventEffect::InspectContainer {
                    container: &self.subject_id,
                }
            }
            _ => EventEffect::Ignore,
        }
    }
}

/// Subset of the engine's container description the tracker needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    /// Container id
    pub id: String,

    /// Image the container was created from
    pub image: String,
}

/// One line of the engine's image delete response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeletedItem {
    /// A tag was removed from the image
    Untagged(String),
    /// An image layer or the image itself was removed
    Deleted(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: &str, action: &str) -> Event {
        Event::new(kind, action, "subject", Utc::now())
    }

    #[test]
    fn test_image_use_actions_touch() {
        for action in ["save", "tag", "untag"] {
            assert_eq!(
                event("image", action).effect(),
                EventEffect::Touch { image: "subject" },
                "action {action}"
            );
        }
    }

    #[test]
    fn test_image_delete_forgets() {
        assert_eq!(
            event("image", "delete").effect(),
            EventEffect::Forget { image: "subject" }
        );
    }

    #[test]
    fn test_ignored_image_actions() {
        for action in ["import", "load", "pull", "push", "prune"] {
            assert_eq!(event("image", action).effect(), EventEffect::Ignore, "action {action}");
        }
    }

    #[test]
    fn test_container_creation_actions_inspect() {
        for action in ["create", "exec_create", "exec_create: /bin/sh -c true"] {
            assert_eq!(
                event("container", action).effect(),
                EventEffect::InspectContainer { container: "subject" },
                "action {action}"
            );
        }
    }

    #[test]
    fn test_other_events_are_ignored() {
        assert_eq!(event("container", "start").effect(), EventEffect::Ignore);
        assert_eq!(event("container", "destroy").effect(), EventEffect::Ignore);
        assert_eq!(event("network", "create").effect(), EventEffect::Ignore);
        assert_eq!(event("volume", "delete").effect(), EventEffect::Ignore);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::State;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use std::collections::HashMap;

    const ACTIONS: [&str; 6] = ["save", "tag", "untag", "delete", "pull", "push"];

    proptest! {
        /// Property: after any image event sequence, exactly the images whose
        /// latest qualifying event is a use are tracked, at that event's time
        #[test]
        fn test_image_events_track_latest_use(
            steps in proptest::collection::vec((0usize..4, 0usize..ACTIONS.len()), 0..60),
        ) {
            let mut state = State::new();
            let mut expected: HashMap<String, DateTime<Utc>> = HashMap::new();

            for (i, (image, action)) in steps.into_iter().enumerate() {
                let time = Utc.timestamp_opt(1_000 + i as i64, 0).unwrap();
                let image = format!("sha256:{image}");
                let event = Event::new("image", ACTIONS[action], image.clone(), time);

                match event.effect() {
                    EventEffect::Touch { image } => state.touch(image, time),
                    EventEffect::Forget { image } => {
                        state.forget(image);
                    }
                    _ => {}
                }

                match ACTIONS[action] {
                    "delete" => {
                        expected.remove(&image);
                    }
                    "save" | "tag" | "untag" => {
                        expected.insert(image, time);
                    }
                    _ => {}
                }
            }

            prop_assert_eq!(state.last_used, expected);
        }
    }
}

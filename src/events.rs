//! Event descriptions
//!
//! Raw app events arrive as `{eventName, eventParams, timestamp}` objects.
//! They are parsed into an [`EventKind`] carrying only the parameters that kind
//! needs, and each kind maps to a one-line description. Reflection answers
//! also carry an edit link and a transcript. Unknown event names parse fine
//! and simply have no description.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::GridError;

/// Raw event as delivered by the app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "eventName")]
    pub event_name: String,
    #[serde(rename = "eventParams", default)]
    pub event_params: Map<String, Value>,
    /// Milliseconds since epoch; producers send either a number or a string
    #[serde(default)]
    pub timestamp: Option<Value>,
}

impl RawEvent {
    /// Parse a raw event from JSON
    pub fn from_json(json: &str) -> Result<Self, GridError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Timestamp as integer milliseconds
    pub fn timestamp_millis(&self) -> Option<i64> {
        match self.timestamp.as_ref()? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn param(&self, key: &str) -> Result<&Value, GridError> {
        self.event_params
            .get(key)
            .ok_or_else(|| GridError::missing_param(&self.event_name, key))
    }

    /// Parameter rendered as a string; numbers are accepted too
    fn param_str(&self, key: &str) -> Result<String, GridError> {
        match self.param(key)? {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            _ => Err(GridError::missing_param(&self.event_name, key)),
        }
    }

    fn param_f64(&self, key: &str) -> Result<f64, GridError> {
        let value = match self.param(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        value.ok_or_else(|| GridError::missing_param(&self.event_name, key))
    }
}

/// Recognized event kinds and the parameters each one needs
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    ReadStory {
        story_id: String,
    },
    ReflectionResponded {
        story_id: String,
        page_id: String,
        transcript: Option<String>,
    },
    ReflectionPlaybackStart,
    ChallengePicked {
        challenge: Value,
    },
    PlayProgressAnimation {
        overall_progress: f64,
    },
    StoryUnlocked {
        story_id: String,
    },
    GeostorySubmitted,
    GeostoryViewed,
    EmotionLogged {
        role: String,
        emotions: Vec<String>,
    },
    AppStartup,
    Unrecognized(String),
}

impl EventKind {
    /// Parse the kind-specific payload out of a raw event
    pub fn from_raw(raw: &RawEvent) -> Result<Self, GridError> {
        let kind = match raw.event_name.as_str() {
            "READ_STORY" => EventKind::ReadStory {
                story_id: raw.param_str("STORY_ID")?,
            },
            "REFLECTION_RESPONDED" => EventKind::ReflectionResponded {
                story_id: raw.param_str("STORY_ID")?,
                page_id: raw.param_str("PAGE_ID")?,
                transcript: raw
                    .event_params
                    .get("transcript")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
            "REFLECTION_PLAYBACK_START" => EventKind::ReflectionPlaybackStart,
            "CHALLENGE_PICKED" => {
                // Producers send the challenge as an embedded JSON string
                let challenge = match raw.param("CHALLENGE_JSON")? {
                    Value::String(s) => serde_json::from_str(s)?,
                    other => other.clone(),
                };
                EventKind::ChallengePicked { challenge }
            }
            "PLAY_PROGRESS_ANIMATION" => EventKind::PlayProgressAnimation {
                overall_progress: raw.param_f64("OVERALL_PROGRESS")?,
            },
            "STORY_UNLOCKED" => EventKind::StoryUnlocked {
                story_id: raw.param_str("STORY_ID")?,
            },
            "GEOSTORY_SUBMITTED" => EventKind::GeostorySubmitted,
            "GEOSTORY_VIEWED" => EventKind::GeostoryViewed,
            "EMOTION_LOGGED" => {
                let emotions = raw
                    .param("list_of_emotions")?
                    .as_array()
                    .ok_or_else(|| GridError::missing_param(&raw.event_name, "list_of_emotions"))?
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect();
                EventKind::EmotionLogged {
                    role: raw.param_str("role")?,
                    emotions,
                }
            }
            "APP_STARTUP" => EventKind::AppStartup,
            other => EventKind::Unrecognized(other.to_string()),
        };
        Ok(kind)
    }

    /// Wire name of the event
    pub fn name(&self) -> &str {
        match self {
            EventKind::ReadStory { .. } => "READ_STORY",
            EventKind::ReflectionResponded { .. } => "REFLECTION_RESPONDED",
            EventKind::ReflectionPlaybackStart => "REFLECTION_PLAYBACK_START",
            EventKind::ChallengePicked { .. } => "CHALLENGE_PICKED",
            EventKind::PlayProgressAnimation { .. } => "PLAY_PROGRESS_ANIMATION",
            EventKind::StoryUnlocked { .. } => "STORY_UNLOCKED",
            EventKind::GeostorySubmitted => "GEOSTORY_SUBMITTED",
            EventKind::GeostoryViewed => "GEOSTORY_VIEWED",
            EventKind::EmotionLogged { .. } => "EMOTION_LOGGED",
            EventKind::AppStartup => "APP_STARTUP",
            EventKind::Unrecognized(name) => name,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, EventKind::Unrecognized(_))
    }
}

/// Lookups needed to render descriptions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DescriptionContext {
    /// Story id to display title
    #[serde(default)]
    pub stories: HashMap<String, String>,
    /// Person id of the family's caregiver
    #[serde(default)]
    pub caregiver_person_id: Option<String>,
    /// Person id of the family's child
    #[serde(default)]
    pub child_person_id: Option<String>,
}

impl DescriptionContext {
    fn story_title<'a>(&'a self, story_id: &'a str) -> &'a str {
        self.stories.get(story_id).map_or(story_id, String::as_str)
    }
}

/// A parsed event
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub timestamp_millis: Option<i64>,
}

impl Event {
    pub fn from_raw(raw: &RawEvent) -> Result<Self, GridError> {
        Ok(Self {
            kind: EventKind::from_raw(raw)?,
            timestamp_millis: raw.timestamp_millis(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, GridError> {
        Self::from_raw(&RawEvent::from_json(json)?)
    }

    /// One-line description, `None` for unrecognized events
    pub fn description(&self, ctx: &DescriptionContext) -> Result<Option<String>, GridError> {
        let text = match &self.kind {
            EventKind::ReadStory { story_id } => {
                format!("Reading storybook: {}.", ctx.story_title(story_id))
            }
            EventKind::ReflectionResponded { .. } => "Answering a question".to_string(),
            EventKind::ReflectionPlaybackStart => "Replaying the recorded answer".to_string(),
            EventKind::ChallengePicked { challenge } => {
                let adult = challenge_goal(challenge, ctx.caregiver_person_id.as_deref())?;
                let child = challenge_goal(challenge, ctx.child_person_id.as_deref())?;
                format!(
                    "Picked a fitness challenge. Caregiver: {} steps, child {} steps.",
                    adult, child
                )
            }
            EventKind::PlayProgressAnimation { overall_progress } => {
                if *overall_progress >= 1.0 {
                    "Family fitness challenge completed.".to_string()
                } else {
                    "Family did not complete the fitness challenge.".to_string()
                }
            }
            EventKind::StoryUnlocked { story_id } => {
                format!("Unlocked a story chapter in: {}.", ctx.story_title(story_id))
            }
            EventKind::GeostorySubmitted => "Adult shared a story".to_string(),
            EventKind::GeostoryViewed => "Listened to a community story".to_string(),
            EventKind::EmotionLogged { role, emotions } => {
                format!("Emotion: {} felt {}.", role, emotions.join(", "))
            }
            EventKind::AppStartup => "Starting the app".to_string(),
            EventKind::Unrecognized(_) => return Ok(None),
        };
        Ok(Some(text))
    }

    /// Deep link for editing the event, where the kind supports one.
    ///
    /// The link is keyed by the event timestamp, so an untimed event has none.
    pub fn edit_uri(&self, user_id: &str) -> Option<String> {
        match (&self.kind, self.timestamp_millis) {
            (
                EventKind::ReflectionResponded {
                    story_id, page_id, ..
                },
                Some(timestamp),
            ) => Some(format!(
                "/reflection/edit/{}/{}/{}/{}",
                user_id, story_id, page_id, timestamp
            )),
            _ => None,
        }
    }

    /// Recorded transcript; empty when a reflection carries none
    pub fn transcript(&self) -> Option<String> {
        match &self.kind {
            EventKind::ReflectionResponded { transcript, .. } => {
                Some(transcript.clone().unwrap_or_default())
            }
            _ => None,
        }
    }
}

/// Rounded step goal of one person in a challenge payload
fn challenge_goal(challenge: &Value, person_id: Option<&str>) -> Result<i64, GridError> {
    let person_id = person_id.ok_or_else(|| GridError::missing_param("CHALLENGE_PICKED", "person_id"))?;
    challenge
        .get("challenges_by_person")
        .and_then(|by_person| by_person.get(person_id))
        .and_then(|entry| entry.get("goal"))
        .and_then(Value::as_f64)
        .map(|goal| goal.round() as i64)
        .ok_or_else(|| {
            GridError::missing_param(
                "CHALLENGE_PICKED",
                &format!("challenges_by_person.{}.goal", person_id),
            )
        })
}

/// Keys of the events whose name is one of `names`
pub fn filter_events<'a, K: 'a>(
    events: impl IntoIterator<Item = (&'a K, &'a RawEvent)>,
    names: &[&str],
) -> Vec<&'a K> {
    events
        .into_iter()
        .filter(|(_, event)| names.contains(&event.event_name.as_str()))
        .map(|(key, _)| key)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn ctx() -> DescriptionContext {
        DescriptionContext {
            stories: HashMap::from([("s1".to_string(), "The Brave Fox".to_string())]),
            caregiver_person_id: Some("10".to_string()),
            child_person_id: Some("11".to_string()),
        }
    }

    fn describe(json: &str) -> Option<String> {
        Event::from_json(json).unwrap().description(&ctx()).unwrap()
    }

    #[test]
    fn test_story_descriptions() {
        assert_eq!(
            describe(r#"{"eventName":"READ_STORY","eventParams":{"STORY_ID":"s1"}}"#).as_deref(),
            Some("Reading storybook: The Brave Fox.")
        );
        assert_eq!(
            describe(r#"{"eventName":"STORY_UNLOCKED","eventParams":{"STORY_ID":"s1"}}"#)
                .as_deref(),
            Some("Unlocked a story chapter in: The Brave Fox.")
        );
    }

    #[test]
    fn test_fixed_descriptions() {
        let cases = [
            ("REFLECTION_PLAYBACK_START", "Replaying the recorded answer"),
            ("GEOSTORY_SUBMITTED", "Adult shared a story"),
            ("GEOSTORY_VIEWED", "Listened to a community story"),
            ("APP_STARTUP", "Starting the app"),
        ];
        for (name, expected) in cases {
            let json = format!(r#"{{"eventName":"{}"}}"#, name);
            assert_eq!(describe(&json).as_deref(), Some(expected));
        }
    }

    #[test]
    fn test_challenge_picked() {
        let json = r#"{
            "eventName": "CHALLENGE_PICKED",
            "eventParams": {
                "CHALLENGE_JSON": "{\"challenges_by_person\":{\"10\":{\"goal\":5999.6},\"11\":{\"goal\":3000.2}}}"
            }
        }"#;
        assert_eq!(
            describe(json).as_deref(),
            Some("Picked a fitness challenge. Caregiver: 6000 steps, child 3000 steps.")
        );
    }

    #[test]
    fn test_progress_animation() {
        assert_eq!(
            describe(r#"{"eventName":"PLAY_PROGRESS_ANIMATION","eventParams":{"OVERALL_PROGRESS":"1.0"}}"#)
                .as_deref(),
            Some("Family fitness challenge completed.")
        );
        assert_eq!(
            describe(r#"{"eventName":"PLAY_PROGRESS_ANIMATION","eventParams":{"OVERALL_PROGRESS":0.4}}"#)
                .as_deref(),
            Some("Family did not complete the fitness challenge.")
        );
    }

    #[test]
    fn test_emotion_logged() {
        let json = r#"{"eventName":"EMOTION_LOGGED","eventParams":{"role":"child","list_of_emotions":["happy","tired"]}}"#;
        assert_eq!(describe(json).as_deref(), Some("Emotion: child felt happy, tired."));
    }

    #[test]
    fn test_unrecognized_has_no_description() {
        let event = Event::from_json(r#"{"eventName":"SOMETHING_NEW"}"#).unwrap();
        assert!(!event.kind.is_recognized());
        assert_eq!(event.description(&ctx()).unwrap(), None);
        assert_eq!(event.edit_uri("u1"), None);
        assert_eq!(event.transcript(), None);
    }

    #[test]
    fn test_reflection_edit_uri_and_transcript() {
        let json = r#"{
            "eventName": "REFLECTION_RESPONDED",
            "eventParams": {"STORY_ID": "s1", "PAGE_ID": 4, "transcript": "we went to the park"},
            "timestamp": "1704139440000"
        }"#;
        let event = Event::from_json(json).unwrap();

        assert_eq!(
            event.edit_uri("u1").as_deref(),
            Some("/reflection/edit/u1/s1/4/1704139440000")
        );
        assert_eq!(event.transcript().as_deref(), Some("we went to the park"));
        assert_eq!(
            event.description(&ctx()).unwrap().as_deref(),
            Some("Answering a question")
        );
    }

    #[test]
    fn test_untimed_reflection_has_no_edit_uri() {
        let json = r#"{"eventName":"REFLECTION_RESPONDED","eventParams":{"STORY_ID":"s1","PAGE_ID":4}}"#;
        let event = Event::from_json(json).unwrap();

        assert_eq!(event.timestamp_millis, None);
        assert_eq!(event.edit_uri("u1"), None);
        assert_eq!(event.transcript().as_deref(), Some(""));
    }

    #[test]
    fn test_reflection_without_transcript() {
        let json = r#"{"eventName":"REFLECTION_RESPONDED","eventParams":{"STORY_ID":"s1","PAGE_ID":"2"},"timestamp":5}"#;
        let event = Event::from_json(json).unwrap();
        assert_eq!(event.transcript().as_deref(), Some(""));
    }

    #[test]
    fn test_missing_param() {
        let result = Event::from_json(r#"{"eventName":"READ_STORY","eventParams":{}}"#);
        assert!(matches!(result, Err(GridError::MissingParam { .. })));
    }

    #[test]
    fn test_filter_events() {
        let mut events = BTreeMap::new();
        events.insert("a".to_string(), RawEvent::from_json(r#"{"eventName":"APP_STARTUP"}"#).unwrap());
        events.insert("b".to_string(), RawEvent::from_json(r#"{"eventName":"READ_STORY"}"#).unwrap());
        events.insert("c".to_string(), RawEvent::from_json(r#"{"eventName":"GEOSTORY_VIEWED"}"#).unwrap());

        let keys = filter_events(&events, &["READ_STORY", "GEOSTORY_VIEWED"]);
        assert_eq!(keys, vec!["b", "c"]);
    }
}

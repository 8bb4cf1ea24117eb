//! Hook events as recorded in the daily JSONL logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::event_type::EventKind;
use crate::types::SessionId;

/// One line of a daily event log.
///
/// Deserialization accepts any JSON object and never rejects one for the
/// shape of its fields. A field that is missing, `null` or of the wrong type
/// falls back to its default: `None`, or `EventKind::Other("")` for the kind.
/// An unparseable `timestamp` and an empty `session_id` also become `None`.
/// When both a field and its alias are present (`timestamp` and `ts`), the
/// first one holding a string wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    /// When the hook fired. `None` if absent or not RFC 3339.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Which hook fired.
    #[serde(rename = "event")]
    pub kind: EventKind,

    /// The session this event belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

const TIMESTAMP_KEYS: &[&str] = &["timestamp", "ts"];
const KIND_KEYS: &[&str] = &["event", "hook_event_name"];
const SESSION_KEYS: &[&str] = &["session_id", "sessionId"];

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let fields = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_fields(&fields))
    }
}

impl Event {
    /// Creates an event with no attribution.
    pub const fn new(
        timestamp: Option<DateTime<Utc>>,
        kind: EventKind,
        session_id: Option<SessionId>,
    ) -> Self {
        Self {
            timestamp,
            kind,
            session_id,
            project: None,
            ticket: None,
            model: None,
        }
    }

    fn from_fields(fields: &Map<String, Value>) -> Self {
        let timestamp = string_field(fields, TIMESTAMP_KEYS)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        let kind = string_field(fields, KIND_KEYS)
            .map_or_else(EventKind::default, |s| s.parse().unwrap_or_default());
        let session_id = string_field(fields, SESSION_KEYS).and_then(|s| SessionId::new(s).ok());
        let attribution = |key: &str| string_field(fields, &[key]).map(str::to_owned);

        Self {
            timestamp,
            kind,
            session_id,
            project: attribution("project"),
            ticket: attribution("ticket"),
            model: attribution("model"),
        }
    }

    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    #[must_use]
    pub fn with_ticket(mut self, ticket: impl Into<String>) -> Self {
        self.ticket = Some(ticket.into());
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// The first string stored under any of `keys`.
fn string_field<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| fields.get(*key).and_then(Value::as_str))
}

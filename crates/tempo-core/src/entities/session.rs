use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::justification::{Justification, deserialize_justifications};
use crate::dates::{format_session_date, parse_session_date};
use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// SessionKey
// ---------------------------------------------------------------------------

/// Identity of a session: one class on one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawKey", into = "RawKey")]
pub struct SessionKey {
    class_id: String,
    date: NaiveDate,
}

impl SessionKey {
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if the class ID is blank or contains `/`.
    pub fn new(class_id: impl Into<String>, date: NaiveDate) -> Result<Self, CoreError> {
        let class_id = class_id.into().trim().to_string();
        if class_id.is_empty() {
            return Err(CoreError::validation("class id must not be empty"));
        }
        if class_id.contains('/') {
            return Err(CoreError::validation(format!(
                "class id '{class_id}' must not contain '/'"
            )));
        }
        Ok(Self { class_id, date })
    }

    /// Build a key from raw strings, normalizing compact dates.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for a blank class ID or malformed date.
    pub fn parse(class_id: &str, date: &str) -> Result<Self, CoreError> {
        Self::new(class_id, parse_session_date(date)?)
    }

    #[must_use]
    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Cache key of the single-session document: `session/{class}/{date}`.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!("{}{}", Self::class_prefix(&self.class_id), format_session_date(self.date))
    }

    /// Prefix shared by every session cache key of one class.
    #[must_use]
    pub fn class_prefix(class_id: &str) -> String {
        format!("session/{class_id}/")
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.class_id, format_session_date(self.date))
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawKey {
    class_id: String,
    date: String,
}

impl TryFrom<RawKey> for SessionKey {
    type Error = CoreError;

    fn try_from(raw: RawKey) -> Result<Self, Self::Error> {
        Self::parse(&raw.class_id, &raw.date)
    }
}

impl From<SessionKey> for RawKey {
    fn from(key: SessionKey) -> Self {
        Self {
            date: format_session_date(key.date),
            class_id: key.class_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Observations
// ---------------------------------------------------------------------------

/// One entry of the append-only observation history.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ObservationEntry {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<DateTime<Utc>>,
}

/// Free-text observations of a session.
///
/// Legacy documents hold a single string that is replaced on every update;
/// newer documents hold an append-only history. The shape found on read is
/// the shape written back.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum Observations {
    History(Vec<ObservationEntry>),
    Text(String),
}

impl Default for Observations {
    fn default() -> Self {
        Self::History(Vec::new())
    }
}

impl Observations {
    /// Apply an observation update in the shape already present.
    pub fn update(&mut self, text: &str, at: DateTime<Utc>) {
        match self {
            Self::History(entries) => entries.push(ObservationEntry {
                text: text.to_string(),
                at: Some(at),
            }),
            Self::Text(current) => *current = text.to_string(),
        }
    }

    /// The most recent observation text, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&str> {
        match self {
            Self::History(entries) => entries.last().map(|e| e.text.as_str()),
            Self::Text(s) if s.is_empty() => None,
            Self::Text(s) => Some(s.as_str()),
        }
    }
}

fn deserialize_observations<'de, D>(d: D) -> Result<Observations, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(d)?.unwrap_or(Value::Null) {
        Value::Null => Ok(Observations::default()),
        Value::String(s) => Ok(Observations::Text(s)),
        Value::Array(items) => Ok(Observations::History(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(text) => Some(ObservationEntry { text, at: None }),
                    other => serde_json::from_value(other).ok(),
                })
                .collect(),
        )),
        other => Err(serde::de::Error::custom(format!(
            "observations must be a string or a list, got {other}"
        ))),
    }
}

/// Read a categorical student list, tolerating `null`, numeric IDs, blanks,
/// duplicates, and legacy `{studentId: true}` maps.
fn deserialize_student_ids<'de, D>(d: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<String> = match Option::<Value>::deserialize(d)?.unwrap_or(Value::Null) {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Value::Object(map) => map
            .into_iter()
            .filter(|(_, v)| v.as_bool().unwrap_or(true))
            .map(|(k, _)| k)
            .collect(),
        _ => Vec::new(),
    };

    let mut seen = BTreeSet::new();
    Ok(raw
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect())
}

// ---------------------------------------------------------------------------
// SessionDocument (wire shape)
// ---------------------------------------------------------------------------

/// Session as stored in the remote document store.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionDocument {
    #[serde(alias = "class_id")]
    pub class_id: String,
    pub date: String,
    #[serde(default, alias = "teacher_id", skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_student_ids")]
    #[schemars(with = "Vec<String>")]
    pub present: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_student_ids")]
    #[schemars(with = "Vec<String>")]
    pub absent: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_student_ids")]
    #[schemars(with = "Vec<String>")]
    pub late: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_justifications")]
    #[schemars(with = "Vec<Justification>")]
    pub justifications: Vec<Justification>,
    #[serde(default, deserialize_with = "deserialize_observations")]
    #[schemars(with = "Observations")]
    pub observations: Observations,
    #[serde(
        default,
        deserialize_with = "deserialize_student_ids",
        skip_serializing_if = "Vec::is_empty"
    )]
    #[schemars(with = "Vec<String>")]
    pub roster: Vec<String>,
    #[serde(default)]
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One class occurrence on one date, the unit of attendance recording.
///
/// Invariant (enforced by the reconciler, tolerated by the resolver): a
/// student appears in at most one of `present`, `absent`, `late`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SessionDocument", into = "SessionDocument")]
pub struct Session {
    pub key: SessionKey,
    pub teacher_id: Option<String>,
    pub present: Vec<String>,
    pub absent: Vec<String>,
    pub late: Vec<String>,
    pub justifications: Vec<Justification>,
    pub observations: Observations,
    /// Students enrolled in the class. Empty when the roster is unknown.
    pub roster: Vec<String>,
    /// Monotonic write counter; 0 means never stored.
    pub version: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Empty session with no statuses, justifications, or observations.
    #[must_use]
    pub fn skeleton(key: SessionKey) -> Self {
        Self {
            key,
            teacher_id: None,
            present: Vec::new(),
            absent: Vec::new(),
            late: Vec::new(),
            justifications: Vec::new(),
            observations: Observations::default(),
            roster: Vec::new(),
            version: 0,
            updated_at: None,
        }
    }

    /// Decode a stored document, normalizing legacy shapes.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if identity fields are missing or
    /// malformed, or the document is not an object.
    pub fn from_json(value: Value) -> Result<Self, CoreError> {
        serde_json::from_value(value)
            .map_err(|e| CoreError::Validation(format!("invalid session document: {e}")))
    }

    /// Encode to the wire document shape.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Other` if serialization fails.
    pub fn to_json(&self) -> Result<Value, CoreError> {
        serde_json::to_value(self).map_err(|e| CoreError::Other(e.into()))
    }

    #[must_use]
    pub fn justification_for(&self, student_id: &str) -> Option<&Justification> {
        self.justifications
            .iter()
            .find(|j| j.student_id == student_id)
    }

    /// Every student referenced by the lists, the justifications, or the roster.
    #[must_use]
    pub fn referenced_students(&self) -> BTreeSet<&str> {
        self.present
            .iter()
            .chain(&self.absent)
            .chain(&self.late)
            .chain(&self.roster)
            .map(String::as_str)
            .chain(self.justifications.iter().map(|j| j.student_id.as_str()))
            .collect()
    }

    /// Whether `student_id` may be recorded for this session.
    #[must_use]
    pub fn admits(&self, student_id: &str) -> bool {
        self.roster.is_empty() || self.roster.iter().any(|s| s == student_id)
    }
}

impl TryFrom<SessionDocument> for Session {
    type Error = CoreError;

    fn try_from(doc: SessionDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            key: SessionKey::parse(&doc.class_id, &doc.date)?,
            teacher_id: doc.teacher_id.filter(|t| !t.trim().is_empty()),
            present: doc.present,
            absent: doc.absent,
            late: doc.late,
            justifications: doc.justifications,
            observations: doc.observations,
            roster: doc.roster,
            version: doc.version,
            updated_at: doc.updated_at,
        })
    }
}

impl From<Session> for SessionDocument {
    fn from(s: Session) -> Self {
        Self {
            class_id: s.key.class_id().to_string(),
            date: format_session_date(s.key.date()),
            teacher_id: s.teacher_id,
            present: s.present,
            absent: s.absent,
            late: s.late,
            justifications: s.justifications,
            observations: s.observations,
            roster: s.roster,
            version: s.version,
            updated_at: s.updated_at,
        }
    }
}

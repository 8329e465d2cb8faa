use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::dates::{day_name_to_index, parse_session_date};
use crate::errors::CoreError;

/// One weekly occurrence of a class.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSlot {
    /// Day name as entered in the catalog (e.g. `"Miércoles"`).
    pub day: String,
    #[serde(default, alias = "startTime", skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, alias = "endTime", skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

impl ScheduleSlot {
    /// Weekday index of this slot, or `None` if the day name is unknown.
    #[must_use]
    pub fn weekday(&self) -> Option<u32> {
        day_name_to_index(&self.day)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorPermissions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_take_attendance: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_edit_class: Option<bool>,
}

/// Structured collaborator entry. Permission flags may be nested under
/// `permissions` or written directly on the entry.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorGrant {
    #[serde(alias = "id", alias = "teacher_id")]
    pub teacher_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<CollaboratorPermissions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_take_attendance: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_edit_class: Option<bool>,
}

/// A collaborating teacher: either a bare identifier or a structured grant.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum CollaboratorEntry {
    Id(String),
    Grant(CollaboratorGrant),
}

impl CollaboratorEntry {
    #[must_use]
    pub fn teacher_id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Grant(g) => &g.teacher_id,
        }
    }

    /// Explicit flag if present, else `true`.
    #[must_use]
    pub fn can_take_attendance(&self) -> bool {
        match self {
            Self::Id(_) => true,
            Self::Grant(g) => g
                .permissions
                .as_ref()
                .and_then(|p| p.can_take_attendance)
                .or(g.can_take_attendance)
                .unwrap_or(true),
        }
    }

    /// Explicit flag if present, else `false`.
    #[must_use]
    pub fn can_edit_class(&self) -> bool {
        match self {
            Self::Id(_) => false,
            Self::Grant(g) => g
                .permissions
                .as_ref()
                .and_then(|p| p.can_edit_class)
                .or(g.can_edit_class)
                .unwrap_or(false),
        }
    }
}

/// A class from the catalog: weekly slots and/or a one-off emergency date.
///
/// Read-only to Tempo. Malformed schedule, emergency date, or collaborator
/// fields decode as empty rather than failing the whole entry.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledClass {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(alias = "teacher_id")]
    pub teacher_id: String,
    #[serde(default, deserialize_with = "deserialize_slots")]
    #[schemars(with = "Vec<ScheduleSlot>")]
    pub schedule: Vec<ScheduleSlot>,
    #[serde(
        default,
        alias = "emergency_date",
        deserialize_with = "deserialize_emergency_date",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<NaiveDate>")]
    pub emergency_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_collaborators")]
    #[schemars(with = "Vec<CollaboratorEntry>")]
    pub collaborators: Vec<CollaboratorEntry>,
}

impl ScheduledClass {
    /// Decode one catalog entry.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` when `id` or `teacherId` is missing.
    pub fn from_json(value: Value) -> Result<Self, CoreError> {
        let class: Self = serde_json::from_value(value)
            .map_err(|e| CoreError::Validation(format!("invalid class entry: {e}")))?;
        if class.id.trim().is_empty() || class.teacher_id.trim().is_empty() {
            return Err(CoreError::validation(
                "class entry needs a non-empty id and teacherId",
            ));
        }
        Ok(class)
    }

    #[must_use]
    pub fn collaborator(&self, teacher_id: &str) -> Option<&CollaboratorEntry> {
        self.collaborators
            .iter()
            .find(|c| c.teacher_id() == teacher_id)
    }
}

/// Slots may be a list of `{day, start, end}` objects, a list of bare day
/// names, or a `{day: {start, end}}` map. Anything else yields no slots.
fn deserialize_slots<'de, D>(d: D) -> Result<Vec<ScheduleSlot>, D::Error>
where
    D: Deserializer<'de>,
{
    let slots = match Option::<Value>::deserialize(d)?.unwrap_or(Value::Null) {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(day) => Some(ScheduleSlot {
                    day,
                    start: None,
                    end: None,
                }),
                other => serde_json::from_value::<ScheduleSlot>(other).ok(),
            })
            .collect(),
        Value::Object(map) => map
            .into_iter()
            .map(|(day, times)| ScheduleSlot {
                day,
                start: times
                    .get("start")
                    .or_else(|| times.get("startTime"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                end: times
                    .get("end")
                    .or_else(|| times.get("endTime"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
            .collect(),
        _ => Vec::new(),
    };
    Ok(slots)
}

fn deserialize_emergency_date<'de, D>(d: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(d)?
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| parse_session_date(s).ok()))
}

fn deserialize_collaborators<'de, D>(d: D) -> Result<Vec<CollaboratorEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(d)?.unwrap_or(Value::Null) {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<CollaboratorEntry>(item).ok())
            .filter(|c| !c.teacher_id().trim().is_empty())
            .collect(),
        _ => Vec::new(),
    })
}

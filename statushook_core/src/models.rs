use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum KindParseError {
    #[error("unknown event type: {0}")]
    Unknown(String),
}

/// Lifecycle event emitted by a pipeline job.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Running,
    Done,
    Failed,
    Progress,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Running => "running",
            EventKind::Done => "done",
            EventKind::Failed => "failed",
            EventKind::Progress => "progress",
        }
    }

    /// The status written onto the record, or `None` for events that only report progress.
    pub fn status(&self) -> Option<&'static str> {
        match self {
            EventKind::Running | EventKind::Done | EventKind::Failed => Some(self.as_str()),
            EventKind::Progress => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = KindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(EventKind::Running),
            "done" => Ok(EventKind::Done),
            "failed" => Ok(EventKind::Failed),
            "progress" => Ok(EventKind::Progress),
            other => Err(KindParseError::Unknown(other.to_string())),
        }
    }
}

/// Inbound webhook body.
///
/// `type` stays a raw string so that unknown kinds decode successfully and are
/// rejected by the tracker rather than by the JSON decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: EventPayload,
}

impl Event {
    pub fn new(kind: impl Into<String>, evidence_path: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: EventPayload {
                evidence_path: evidence_path.into(),
                progress: None,
            },
        }
    }

    pub fn parsed_kind(&self) -> Result<EventKind, KindParseError> {
        self.kind.parse()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    #[serde(rename = "evidencePath", default)]
    pub evidence_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
}

/// Named attribute of a resolved record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub id: String,
    pub name: String,
    pub value: String,
}

/// A board card or document, with field names already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub fields: Vec<CustomField>,
}

impl Record {
    pub fn field(&self, name: &str) -> Option<&CustomField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.field(name).map(|f| f.value.as_str())
    }
}

/// Field definition of a scope (board or collection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub id: String,
    pub name: String,
}

/// Field value as stored by the backend, addressed by id only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawField {
    pub id: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: String,
    pub fields: Vec<RawField>,
}

/// Result of a backend lookup: the scope's field definitions and candidate records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordScan {
    pub field_defs: Vec<FieldDef>,
    pub records: Vec<RawRecord>,
}

/// A single-field change together with the full rebuilt field list.
///
/// Backends whose update call replaces the whole field array send `fields`;
/// backends with partial writes only need `field` and `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdate {
    pub record_id: String,
    pub fields: Vec<CustomField>,
    pub field: String,
    pub value: String,
}

/// What handling an event did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Updated { record_id: String, status: String },
    Acknowledged,
}

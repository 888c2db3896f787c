//! Outpass request record and the values that flow into and out of it.
//!
//! A record is keyed by the student's roll number; there is no surrogate id.
//! Records are owned by the [`RecordStore`](crate::storage::RecordStore) and
//! every workflow operation addresses them by id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{OutpassError, Result};

/// Lifecycle status of an outpass request.
///
/// `Pending` is the only initial state. `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutpassStatus {
    Pending,
    Approved,
    Rejected,
}

impl OutpassStatus {
    /// The canonical spelling used in storage and API payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutpassStatus::Pending => "Pending",
            OutpassStatus::Approved => "Approved",
            OutpassStatus::Rejected => "Rejected",
        }
    }

    /// Check if no further transition is defined out of this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OutpassStatus::Approved | OutpassStatus::Rejected)
    }
}

impl std::fmt::Display for OutpassStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OutpassStatus {
    type Err = OutpassError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Pending" => Ok(OutpassStatus::Pending),
            "Approved" => Ok(OutpassStatus::Approved),
            "Rejected" => Ok(OutpassStatus::Rejected),
            other => Err(OutpassError::Internal(format!(
                "Unknown stored status '{}'",
                other
            ))),
        }
    }
}

/// A staff decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// Parse a raw decision value, accepting any letter case.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "approve" => Ok(Decision::Approve),
            "reject" => Ok(Decision::Reject),
            _ => Err(OutpassError::ValidationError(
                r#"Invalid decision. Must be either "approve" or "reject""#.to_string(),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        }
    }
}

/// A persisted outpass request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutpassRequest {
    /// Roll/registration number; the natural key.
    pub id: String,
    pub student_name: String,
    pub student_mobile: String,
    pub parent_mobile: String,
    pub reason: String,
    pub status: OutpassStatus,
    pub created_at: DateTime<Utc>,
    /// Set by the write that moved the record out of Pending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
}

impl OutpassRequest {
    /// The compact view returned alongside a freshly created record.
    pub fn summary(&self) -> RequestSummary {
        RequestSummary {
            id: self.id.clone(),
            student_name: self.student_name.clone(),
            reason: self.reason.clone(),
            status: self.status,
        }
    }
}

/// Summary view of a request: `{id, studentName, reason, status}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSummary {
    pub id: String,
    pub student_name: String,
    pub reason: String,
    pub status: OutpassStatus,
}

/// Deserialize an optional text field that clients may send as a JSON number.
///
/// Roll and phone numbers often arrive unquoted; they are kept as their
/// decimal text. `null` reads as absent.
pub(crate) fn string_or_number<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number, found {}",
            other
        ))),
    }
}

/// Raw submission payload as received from a student.
///
/// Every field is optional here so that validation, not deserialization,
/// decides which field is reported as missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOutpassRequest {
    #[serde(default, deserialize_with = "string_or_number")]
    pub student_name: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub roll_number: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub student_mobile: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub parent_mobile: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub reason: Option<String>,
}

/// A validated submission, ready to be inserted with status Pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub id: String,
    pub student_name: String,
    pub student_mobile: String,
    pub parent_mobile: String,
    pub reason: String,
}

impl NewOutpassRequest {
    /// Validate the submission, naming the first missing field in declaration order.
    pub fn validate(self) -> Result<NewRecord> {
        fn required(value: Option<String>, field: &str) -> Result<String> {
            match value {
                Some(v) if !v.trim().is_empty() => Ok(v),
                _ => Err(OutpassError::MissingField(field.to_string())),
            }
        }

        let student_name = required(self.student_name, "studentName")?;
        let id = required(self.roll_number, "rollNumber")?;
        let student_mobile = required(self.student_mobile, "studentMobile")?;
        let parent_mobile = required(self.parent_mobile, "parentMobile")?;
        let reason = required(self.reason, "reason")?;

        Ok(NewRecord {
            id,
            student_name,
            student_mobile,
            parent_mobile,
            reason,
        })
    }
}

impl NewRecord {
    /// Materialize the record as it is first stored.
    pub fn into_pending(self, created_at: DateTime<Utc>) -> OutpassRequest {
        OutpassRequest {
            id: self.id,
            student_name: self.student_name,
            student_mobile: self.student_mobile,
            parent_mobile: self.parent_mobile,
            reason: self.reason,
            status: OutpassStatus::Pending,
            created_at,
            decided_at: None,
        }
    }
}

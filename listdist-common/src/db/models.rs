//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered field agent (one roster entry)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub created_at: DateTime<Utc>,
}

/// One validated contact row from an uploaded list
///
/// `first_name` and `phone` are never empty; all three fields are trimmed.
/// Fields are private so that the only way to obtain a record is through
/// [`ContactRecord::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    first_name: String,
    phone: String,
    notes: String,
}

impl ContactRecord {
    /// Build a record from raw cell text
    ///
    /// Returns `None` when `first_name` or `phone` is missing or blank.
    /// Missing notes become an empty string.
    pub fn new(first_name: Option<&str>, phone: Option<&str>, notes: Option<&str>) -> Option<Self> {
        let first_name = first_name.map(str::trim).filter(|s| !s.is_empty())?;
        let phone = phone.map(str::trim).filter(|s| !s.is_empty())?;
        let notes = notes.map(str::trim).unwrap_or_default();

        Some(Self {
            first_name: first_name.to_string(),
            phone: phone.to_string(),
            notes: notes.to_string(),
        })
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }
}

/// A persisted record-to-agent assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub upload_id: Uuid,
    /// Index of the record within its upload's plan
    pub position: i64,
    pub record: ContactRecord,
    pub created_at: DateTime<Utc>,
}

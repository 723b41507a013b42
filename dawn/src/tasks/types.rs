//! Task records and the validation that turns raw payloads into them

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Status of a task that has not been completed yet
pub const NEEDS_ACTION: &str = "needsAction";

/// Id the service accepts for the account's implicit list
pub const DEFAULT_LIST_ID: &str = "@default";

/// Maximum items requested per list
pub const MAX_RESULTS: u32 = 100;

/// Why a raw record was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("malformed record: {0}")]
    Malformed(String),

    #[error("field '{0}' is empty")]
    Empty(&'static str),
}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        ValidationError::Malformed(err.to_string())
    }
}

/// Task list as the service sends it
#[derive(Debug, Deserialize)]
struct RawTaskList {
    id: String,
    title: String,
}

/// Task item as the service sends it
#[derive(Debug, Deserialize)]
struct RawTask {
    id: String,
    title: String,
    status: String,
    due: Option<String>,
    updated: Option<String>,
}

/// One remote task list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskListDescriptor {
    pub id: String,
    pub title: String,
}

impl TaskListDescriptor {
    /// Synthetic descriptor for the account's default list
    pub fn default_list() -> Self {
        Self {
            id: DEFAULT_LIST_ID.to_string(),
            title: "Default".to_string(),
        }
    }

    /// Validate a raw list payload
    pub fn from_raw(raw: &Value) -> Result<Self, ValidationError> {
        let list = RawTaskList::deserialize(raw)?;
        non_empty(&list.id, "id")?;
        non_empty(&list.title, "title")?;
        Ok(Self {
            id: list.id,
            title: list.title,
        })
    }
}

/// Parameters for one per-list item request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    pub list_id: String,
    pub max_results: u32,
    pub show_completed: bool,
    pub show_hidden: bool,
}

impl TaskQuery {
    /// Open items of a list: no completed, no hidden, up to [`MAX_RESULTS`]
    pub fn open_items(list_id: impl Into<String>) -> Self {
        Self {
            list_id: list_id.into(),
            max_results: MAX_RESULTS,
            show_completed: false,
            show_hidden: false,
        }
    }
}

/// A to-do item normalized for ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub title: String,
    pub status: String,

    /// Calendar day the task is due
    pub due: Option<NaiveDate>,

    /// Last update time, standing in for creation time
    pub created_or_updated: Option<DateTime<Utc>>,
}

impl TaskRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status: NEEDS_ACTION.to_string(),
            due: None,
            created_or_updated: None,
        }
    }

    pub fn with_due(mut self, due: NaiveDate) -> Self {
        self.due = Some(due);
        self
    }

    pub fn with_updated(mut self, updated: DateTime<Utc>) -> Self {
        self.created_or_updated = Some(updated);
        self
    }

    /// Validate a raw task payload
    ///
    /// `due` and `updated` must be strings when present; values that do not
    /// parse as dates are kept as absent.
    pub fn from_raw(raw: &Value) -> Result<Self, ValidationError> {
        let task = RawTask::deserialize(raw)?;
        non_empty(&task.id, "id")?;
        non_empty(&task.title, "title")?;
        non_empty(&task.status, "status")?;

        Ok(Self {
            id: task.id,
            title: task.title,
            status: task.status,
            due: task.due.as_deref().and_then(parse_due),
            created_or_updated: task.updated.as_deref().and_then(parse_timestamp),
        })
    }

    pub fn is_needs_action(&self) -> bool {
        self.status == NEEDS_ACTION
    }

    /// Title contains "urgent" in any case
    pub fn is_urgent(&self) -> bool {
        self.title.to_lowercase().contains("urgent")
    }

    /// Due strictly before `today`
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.due.is_some_and(|due| due < today)
    }
}

fn non_empty(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(())
}

/// Parse a due value: RFC 3339 (its calendar date) or a bare `YYYY-MM-DD`
pub fn parse_due(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            debug!(value = %s, error = %e, "parse_due: unparsable, treating as absent");
            None
        }
    }
}

/// Parse an RFC 3339 timestamp into UTC
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            debug!(value = %s, error = %e, "parse_timestamp: unparsable, treating as absent");
            None
        }
    }
}

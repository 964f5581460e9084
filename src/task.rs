//! Task data structure and related functionality.
//!
//! This module defines the core `Task` struct, the `NewTask` input used to create
//! one, and the on-disk representation of due dates.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fields::Priority;

/// A single work item.
///
/// Field names on disk follow the established task file layout
/// (`title`, `description`, `priority`, `dueDate`, `isCompleted`). The `id` is
/// assigned by the store and never written out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    #[serde(skip)]
    pub id: u64,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    #[serde(rename = "dueDate", with = "due_date_format")]
    pub due_date: NaiveDate,
    #[serde(rename = "isCompleted")]
    pub completed: bool,
}

impl Task {
    /// Human-readable status label.
    pub fn status_label(&self) -> &'static str {
        if self.completed {
            "Completed"
        } else {
            "Pending"
        }
    }

    /// Multi-line detail text shown when a task is selected.
    pub fn detail(&self) -> String {
        format!(
            "Title: {}\n\nDescription:\n{}\n\nPriority: {}\nDue Date: {}\nStatus: {}",
            self.title,
            self.description,
            self.priority,
            self.due_date.format("%Y-%m-%d"),
            self.status_label()
        )
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.completed {
            write!(f, "{} (Completed)", self.title)
        } else {
            f.write_str(&self.title)
        }
    }
}

/// Field values for a task that has not been created yet.
///
/// Priority and due date are optional here so that an unselected form field can
/// be passed through and rejected by the store's validation.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        priority: Priority,
        due_date: NaiveDate,
    ) -> Self {
        NewTask {
            title: title.into(),
            description: description.into(),
            priority: Some(priority),
            due_date: Some(due_date),
        }
    }
}

/// `dueDate` is written as `YYYY-MM-DD`. Older files stored a full date-time
/// (`2025-01-01T00:00:00`), so anything after the date part is accepted and dropped.
mod due_date_format {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(raw.trim()).ok_or_else(|| de::Error::custom(format!("invalid dueDate '{raw}'")))
    }

    fn parse(s: &str) -> Option<NaiveDate> {
        if let Ok(d) = NaiveDate::parse_from_str(s, FORMAT) {
            return Some(d);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.date_naive());
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(dt.date());
        }
        None
    }
}

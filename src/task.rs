//! Task, subtask and comment data structures.
//!
//! This module defines the core `Task` struct and the request types used to
//! create and update tasks. Field names in the persisted form are camelCase
//! and must round-trip losslessly.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::{Priority, Status};

/// A single unit of work with its lifecycle metadata.
///
/// `id` and `created_at` are set once at creation and never change. Optional
/// scalar fields are absent from the persisted form unless supplied; the
/// tag, subtask and comment arrays are always present, possibly empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub completed: bool,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_hours: Option<f64>,
    pub status: Status,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

/// A checklist item owned by a task. Only whole-list replacement is
/// supported; subtasks have no individual lifecycle operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

/// An annotation appended to a task. Comments are append-only and owned
/// exclusively by their parent task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Fields accepted when creating a task. Everything except the title is
/// optional; the service fills in the stated defaults.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub due_date: Option<NaiveDate>,
    pub assignee: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub subtasks: Vec<Subtask>,
}

/// The closed set of fields a partial update may touch.
///
/// `id`, `created_at` and `comments` are deliberately not representable
/// here; comments change only through the dedicated comment operation.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub due_date: Option<NaiveDate>,
    pub clear_due_date: bool,
    pub assignee: Option<String>,
    pub category: Option<String>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub tags: Option<Vec<String>>,
    pub subtasks: Option<Vec<Subtask>>,
}

impl TaskPatch {
    /// Overlay the supplied fields onto `task`, leaving the rest untouched.
    /// A whitespace-only assignee or category clears the field.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(ref title) = self.title {
            task.title = title.clone();
        }
        if let Some(ref desc) = self.description {
            task.description = desc.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if self.clear_due_date {
            task.due_date = None;
        }
        if let Some(due) = self.due_date {
            task.due_date = Some(due);
        }
        if let Some(ref a) = self.assignee {
            task.assignee = if a.trim().is_empty() { None } else { Some(a.trim().to_string()) };
        }
        if let Some(ref c) = self.category {
            task.category = if c.trim().is_empty() { None } else { Some(c.trim().to_string()) };
        }
        if let Some(hours) = self.estimated_hours {
            task.estimated_hours = Some(hours);
        }
        if let Some(hours) = self.actual_hours {
            task.actual_hours = Some(hours);
        }
        if let Some(ref tags) = self.tags {
            task.tags = tags.clone();
        }
        if let Some(ref subtasks) = self.subtasks {
            task.subtasks = subtasks.clone();
        }
    }

    /// True when no field is set, in which case an update is a no-op write.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.due_date.is_none()
            && !self.clear_due_date
            && self.assignee.is_none()
            && self.category.is_none()
            && self.estimated_hours.is_none()
            && self.actual_hours.is_none()
            && self.tags.is_none()
            && self.subtasks.is_none()
    }
}

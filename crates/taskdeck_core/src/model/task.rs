//! Task domain model.
//!
//! # Invariants
//! - `id` and `created_at` are fixed at creation.
//! - `title` is non-blank for every task created or updated through the store.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{normalize_title, ValidationError};

/// Stable task identifier, unique within its owning project.
pub type TaskId = Uuid;

/// A single actionable item owned by one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Creates an incomplete task with a fresh id and the current timestamp.
    pub fn new(title: impl Into<String>, description: Option<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title, Utc::now()).described(description)
    }

    /// Creates a task with caller-provided identity.
    ///
    /// Used by snapshot decoding where identity already exists.
    pub fn with_id(id: TaskId, title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            completed: false,
            created_at,
        }
    }

    fn described(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}

/// Input for creating a task inside a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Validates input and builds the task.
    pub fn into_task(self) -> Result<Task, ValidationError> {
        let title = normalize_title(&self.title)?;
        let mut task = Task::new(title, self.description);
        task.completed = self.completed;
        Ok(task)
    }
}

/// Shallow partial update for a task. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    /// Trims and checks the title, if one is provided.
    pub fn normalized(mut self) -> Result<Self, ValidationError> {
        if let Some(title) = self.title.as_deref() {
            self.title = Some(normalize_title(title)?);
        }
        Ok(self)
    }

    /// Merges provided fields into `task`.
    pub fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}

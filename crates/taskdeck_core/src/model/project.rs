//! Project domain model.
//!
//! # Responsibility
//! - Define the project record and its exclusively owned task list.
//! - Derive progress and display section from stored flags.
//!
//! # Invariants
//! - `id` and `created_at` are fixed at creation.
//! - `tasks` keeps insertion order; new tasks are appended.
//! - `completed` is an independent flag, never derived from tasks.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use uuid::Uuid;

use super::task::{Task, TaskId};
use super::theme::ThemeColor;
use super::{normalize_title, ValidationError};

/// Stable project identifier, unique within the collection.
pub type ProjectId = Uuid;

/// Top-level trackable unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub tasks: Vec<Task>,
    pub pinned: bool,
    pub theme: ThemeColor,
}

/// Display grouping derived from `pinned` and `completed`.
///
/// Declaration order is rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    /// Every pinned project, completed or not.
    Pinned,
    /// Not pinned, not completed.
    InProgress,
    /// Not pinned, completed.
    Completed,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Pinned, Section::InProgress, Section::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pinned => "pinned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    /// Inverse of `as_str`.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|section| section.as_str() == value)
    }
}

/// Task completion summary, recomputed on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    /// Completed fraction in `0.0..=1.0`; `0.0` for a project without tasks.
    pub fn ratio(self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64
    }

    /// Completed share rounded half-up to a whole percent.
    pub fn percent(self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let rounded = (self.completed * 200 + self.total) / (self.total * 2);
        rounded.min(100) as u8
    }
}

impl Project {
    /// Creates an empty, unpinned, incomplete project with a fresh id.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title, Utc::now())
    }

    /// Creates a project with caller-provided identity.
    ///
    /// Used by snapshot decoding where identity already exists.
    pub fn with_id(id: ProjectId, title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            completed: false,
            created_at,
            tasks: Vec::new(),
            pinned: false,
            theme: ThemeColor::Default,
        }
    }

    pub fn section(&self) -> Section {
        match (self.pinned, self.completed) {
            (true, _) => Section::Pinned,
            (false, false) => Section::InProgress,
            (false, true) => Section::Completed,
        }
    }

    pub fn progress(&self) -> Progress {
        Progress {
            completed: self.tasks.iter().filter(|task| task.completed).count(),
            total: self.tasks.len(),
        }
    }

    pub fn task_mut(&mut self, task_id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == task_id)
    }

    /// Tasks in detail-view order: incomplete first, then newest first.
    ///
    /// Stored task order is left untouched.
    pub fn sorted_tasks(&self) -> Vec<&Task> {
        let mut tasks = self.tasks.iter().collect::<Vec<_>>();
        tasks.sort_by(|a, b| match a.completed.cmp(&b.completed) {
            Ordering::Equal => b.created_at.cmp(&a.created_at),
            other => other,
        });
        tasks
    }
}

/// Input for creating a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProject {
    pub title: String,
    pub description: Option<String>,
    pub theme: Option<ThemeColor>,
}

impl NewProject {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Validates input and builds the project.
    pub fn into_project(self) -> Result<Project, ValidationError> {
        let title = normalize_title(&self.title)?;
        let mut project = Project::new(title);
        project.description = self.description;
        project.theme = self.theme.unwrap_or_default();
        Ok(project)
    }
}

/// Shallow partial update for a project. `None` leaves a field untouched.
///
/// Identity, creation time and the task list are not patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub title: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub pinned: Option<bool>,
    pub theme: Option<ThemeColor>,
}

impl ProjectPatch {
    /// Trims and checks the title, if one is provided.
    pub fn normalized(mut self) -> Result<Self, ValidationError> {
        if let Some(title) = self.title.as_deref() {
            self.title = Some(normalize_title(title)?);
        }
        Ok(self)
    }

    /// Merges provided fields into `project`.
    pub fn apply(self, project: &mut Project) {
        if let Some(title) = self.title {
            project.title = title;
        }
        if let Some(description) = self.description {
            project.description = description;
        }
        if let Some(completed) = self.completed {
            project.completed = completed;
        }
        if let Some(pinned) = self.pinned {
            project.pinned = pinned;
        }
        if let Some(theme) = self.theme {
            project.theme = theme;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NewProject, Progress, Project, ProjectPatch, Section};
    use crate::model::task::Task;
    use crate::model::theme::ThemeColor;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn new_project_has_documented_defaults() {
        let project = NewProject::titled("Launch").into_project().unwrap();
        assert_eq!(project.title, "Launch");
        assert!(project.tasks.is_empty());
        assert!(!project.pinned);
        assert!(!project.completed);
        assert_eq!(project.theme, ThemeColor::Default);
    }

    #[test]
    fn section_gives_pin_precedence_over_completion() {
        let mut project = Project::new("p");
        assert_eq!(project.section(), Section::InProgress);
        project.completed = true;
        assert_eq!(project.section(), Section::Completed);
        project.pinned = true;
        assert_eq!(project.section(), Section::Pinned);
    }

    #[test]
    fn section_identifiers_parse_back() {
        for section in Section::ALL {
            assert_eq!(Section::parse(section.as_str()), Some(section));
        }
        assert_eq!(Section::parse("archived"), None);
    }

    #[test]
    fn percent_rounds_half_up() {
        let progress = Progress {
            completed: 1,
            total: 3,
        };
        assert_eq!(progress.percent(), 33);
        let progress = Progress {
            completed: 1,
            total: 8,
        };
        assert_eq!(progress.percent(), 13);
        let empty = Progress {
            completed: 0,
            total: 0,
        };
        assert_eq!(empty.percent(), 0);
        assert_eq!(empty.ratio(), 0.0);
    }

    #[test]
    fn sorted_tasks_puts_incomplete_and_newest_first() {
        let mut project = Project::new("p");
        let old_open = Task::with_id(Uuid::new_v4(), "old open", Utc.timestamp_opt(100, 0).unwrap());
        let new_open = Task::with_id(Uuid::new_v4(), "new open", Utc.timestamp_opt(300, 0).unwrap());
        let mut done = Task::with_id(Uuid::new_v4(), "done", Utc.timestamp_opt(500, 0).unwrap());
        done.completed = true;
        project.tasks = vec![old_open.clone(), done.clone(), new_open.clone()];

        let titles = project
            .sorted_tasks()
            .into_iter()
            .map(|task| task.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(titles, vec!["new open", "old open", "done"]);
        assert_eq!(project.tasks[1].id, done.id);
    }

    #[test]
    fn patch_merges_only_provided_fields() {
        let mut project = NewProject {
            title: "Launch".to_string(),
            description: Some("q3".to_string()),
            theme: Some(ThemeColor::Blue),
        }
        .into_project()
        .unwrap();

        ProjectPatch {
            completed: Some(true),
            ..ProjectPatch::default()
        }
        .apply(&mut project);

        assert!(project.completed);
        assert_eq!(project.title, "Launch");
        assert_eq!(project.description.as_deref(), Some("q3"));
        assert_eq!(project.theme, ThemeColor::Blue);
    }
}

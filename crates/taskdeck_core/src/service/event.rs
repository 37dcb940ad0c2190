//! Structured outcomes emitted by store mutations.
//!
//! The store never renders notifications; callers map these values to
//! whatever presentation they use.

use crate::model::project::{ProjectId, Section};
use crate::model::task::TaskId;
use crate::model::theme::ThemeColor;

/// What a successful mutation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    ProjectCreated {
        project_id: ProjectId,
    },
    ProjectUpdated {
        project_id: ProjectId,
    },
    ProjectDeleted {
        project_id: ProjectId,
        removed_tasks: usize,
    },
    ProjectPinned {
        project_id: ProjectId,
    },
    ProjectUnpinned {
        project_id: ProjectId,
    },
    ProjectThemeChanged {
        project_id: ProjectId,
        theme: ThemeColor,
    },
    ProjectsReordered {
        project_id: ProjectId,
        section: Section,
        from: usize,
        to: usize,
        clamped: bool,
    },
    OrderRestored,
    TaskAdded {
        project_id: ProjectId,
        task_id: TaskId,
    },
    TaskUpdated {
        project_id: ProjectId,
        task_id: TaskId,
    },
    TaskDeleted {
        project_id: ProjectId,
        task_id: TaskId,
    },
    DarkModeChanged {
        enabled: bool,
    },
}

impl StoreEvent {
    /// Stable event name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ProjectCreated { .. } => "project_created",
            Self::ProjectUpdated { .. } => "project_updated",
            Self::ProjectDeleted { .. } => "project_deleted",
            Self::ProjectPinned { .. } => "project_pinned",
            Self::ProjectUnpinned { .. } => "project_unpinned",
            Self::ProjectThemeChanged { .. } => "project_theme_changed",
            Self::ProjectsReordered { .. } => "projects_reordered",
            Self::OrderRestored => "order_restored",
            Self::TaskAdded { .. } => "task_added",
            Self::TaskUpdated { .. } => "task_updated",
            Self::TaskDeleted { .. } => "task_deleted",
            Self::DarkModeChanged { .. } => "dark_mode_changed",
        }
    }

    /// Project the event refers to, if any.
    pub fn project_id(&self) -> Option<ProjectId> {
        match self {
            Self::ProjectCreated { project_id }
            | Self::ProjectUpdated { project_id }
            | Self::ProjectDeleted { project_id, .. }
            | Self::ProjectPinned { project_id }
            | Self::ProjectUnpinned { project_id }
            | Self::ProjectThemeChanged { project_id, .. }
            | Self::ProjectsReordered { project_id, .. }
            | Self::TaskAdded { project_id, .. }
            | Self::TaskUpdated { project_id, .. }
            | Self::TaskDeleted { project_id, .. } => Some(*project_id),
            Self::OrderRestored | Self::DarkModeChanged { .. } => None,
        }
    }

    /// Task the event refers to, if any.
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            Self::TaskAdded { task_id, .. }
            | Self::TaskUpdated { task_id, .. }
            | Self::TaskDeleted { task_id, .. } => Some(*task_id),
            _ => None,
        }
    }

    /// Short notification headline.
    pub fn title(&self) -> &'static str {
        match self {
            Self::ProjectCreated { .. } => "Project created",
            Self::ProjectUpdated { .. } => "Project updated",
            Self::ProjectDeleted { .. } => "Project deleted",
            Self::ProjectPinned { .. } => "Project pinned",
            Self::ProjectUnpinned { .. } => "Project unpinned",
            Self::ProjectThemeChanged { .. } => "Theme updated",
            Self::ProjectsReordered { .. } => "Projects reordered",
            Self::OrderRestored => "Order restored",
            Self::TaskAdded { .. } => "Task added",
            Self::TaskUpdated { .. } => "Task updated",
            Self::TaskDeleted { .. } => "Task deleted",
            Self::DarkModeChanged { enabled: true } => "Dark mode enabled",
            Self::DarkModeChanged { enabled: false } => "Light mode enabled",
        }
    }

    /// Longer notification body.
    pub fn message(&self) -> &'static str {
        match self {
            Self::ProjectCreated { .. } => "Your new project has been created successfully.",
            Self::ProjectUpdated { .. } => "Your project has been updated successfully.",
            Self::ProjectDeleted { .. } => "Your project has been deleted.",
            Self::ProjectPinned { .. } => "Your project has been pinned to the top.",
            Self::ProjectUnpinned { .. } => "Your project has been unpinned.",
            Self::ProjectThemeChanged { .. } => "Project theme has been updated.",
            Self::ProjectsReordered { .. } => "Your projects have been reordered successfully.",
            Self::OrderRestored => "Projects are sorted by pin, status and date again.",
            Self::TaskAdded { .. } => "Your task has been added to the project.",
            Self::TaskUpdated { .. } => "Your task has been updated successfully.",
            Self::TaskDeleted { .. } => "Your task has been deleted.",
            Self::DarkModeChanged { enabled: true } => "Switched to dark mode",
            Self::DarkModeChanged { enabled: false } => "Switched to light mode",
        }
    }

    /// Whether the notification should be styled as destructive.
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            Self::ProjectDeleted { .. } | Self::TaskDeleted { .. }
        )
    }
}

/// Result of writing the collection back to the blob store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistStatus {
    Saved,
    /// Nothing changed, so nothing was written.
    Unchanged,
    /// The in-memory mutation stands, but will not survive a reload.
    Failed { message: String },
}

/// Event plus persistence result of one applied mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOutcome {
    pub event: StoreEvent,
    pub persistence: PersistStatus,
}

impl StoreOutcome {
    /// `false` only when a write was attempted and failed.
    pub fn is_persisted(&self) -> bool {
        !matches!(self.persistence, PersistStatus::Failed { .. })
    }

    /// User-facing durability warning, when the write failed.
    pub fn warning(&self) -> Option<String> {
        match &self.persistence {
            PersistStatus::Saved | PersistStatus::Unchanged => None,
            PersistStatus::Failed { message } => Some(format!(
                "Changes are kept for this session but could not be saved: {message}"
            )),
        }
    }
}

//! Project/task state store.
//!
//! # Responsibility
//! - Own the canonical collection of projects and their tasks.
//! - Apply user intents as read-modify-persist mutations.
//! - Expose the derived three-section display view.
//!
//! # Invariants
//! - Exactly one writer: every mutation takes `&mut self` and runs to
//!   completion, including the persist attempt, before returning.
//! - Rejected input and unknown ids never mutate or persist anything.
//! - A failed persist keeps the in-memory mutation and is reported in the
//!   returned `StoreOutcome`.
//! - Loading never fails; malformed persisted state yields an empty
//!   collection.
//! - Persisted projects that could not be read are never overwritten.

use crate::model::project::{NewProject, Project, ProjectId, ProjectPatch, Section};
use crate::model::task::{NewTask, TaskId, TaskPatch};
use crate::model::theme::ThemeColor;
use crate::model::ValidationError;
use crate::repo::blob_store::BlobStore;
use crate::repo::snapshot::{
    decode_dark_mode, decode_manual_sections, decode_projects, encode_dark_mode,
    encode_manual_sections, encode_projects, SnapshotResult, DARK_MODE_KEY, MANUAL_ORDER_KEY,
    PROJECTS_KEY,
};
use crate::service::event::{PersistStatus, StoreEvent, StoreOutcome};
use crate::service::ordering::{
    apply_reorder, display_cmp, sections, ManualSections, ProjectSections, ReorderPlan,
};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type StoreResult<T> = Result<T, StoreError>;

/// Rejections returned by store operations. None of them are fatal; the
/// store stays usable and unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Validation(ValidationError),
    ProjectNotFound(ProjectId),
    TaskNotFound {
        project_id: ProjectId,
        task_id: TaskId,
    },
    /// Flat display index does not address a project.
    IndexOutOfRange {
        index: usize,
        len: usize,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::TaskNotFound {
                project_id,
                task_id,
            } => write!(f, "task not found: {task_id} in project {project_id}"),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "display index {index} out of range for {len} project(s)")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Store construction options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Display preference used when no `darkMode` value is persisted.
    pub prefers_dark_mode: bool,
}

/// What happened while reading persisted state at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub project_count: usize,
    pub task_count: usize,
    /// Reason persisted projects were discarded, when they were.
    pub discarded: Option<String>,
    /// Storage error that prevented reading persisted projects. The stored
    /// blob is left untouched while this is set.
    pub read_error: Option<String>,
}

impl LoadReport {
    pub fn recovered(&self) -> bool {
        self.discarded.is_some()
    }

    pub fn read_failed(&self) -> bool {
        self.read_error.is_some()
    }
}

/// Handle returned by `subscribe`.
pub type SubscriptionId = u64;

type Listener = Box<dyn FnMut(&StoreOutcome)>;

/// Single source of truth for projects, tasks, ordering and persistence.
pub struct ProjectStore<S: BlobStore> {
    blob: S,
    projects: Vec<Project>,
    manual: ManualSections,
    manual_dirty: bool,
    /// Set while persisted projects exist but could not be read.
    write_blocked: Option<String>,
    dark_mode: bool,
    load_report: LoadReport,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
}

impl<S: BlobStore> ProjectStore<S> {
    /// Reads persisted state from `blob` and builds the store.
    ///
    /// # Side effects
    /// - Emits `store_load` logging events; malformed state is logged at
    ///   `warn` and discarded.
    pub fn load(blob: S, config: StoreConfig) -> Self {
        let started_at = Instant::now();
        let mut report = LoadReport::default();

        let projects = match blob.get(PROJECTS_KEY) {
            Ok(None) => Vec::new(),
            Ok(Some(raw)) => match decode_projects(&raw) {
                Ok(projects) => projects,
                Err(err) => {
                    warn!(
                        "event=store_load module=store status=recovered error_code=malformed_state error={}",
                        err
                    );
                    report.discarded = Some(err.to_string());
                    Vec::new()
                }
            },
            Err(err) => {
                error!(
                    "event=store_load module=store status=error error_code=blob_read_failed error={}",
                    err
                );
                report.read_error = Some(err.to_string());
                Vec::new()
            }
        };

        let manual = match blob.get(MANUAL_ORDER_KEY) {
            Ok(Some(raw)) => decode_manual_sections(&raw).unwrap_or_else(|err| {
                warn!(
                    "event=store_load module=store status=recovered key={} error={}",
                    MANUAL_ORDER_KEY, err
                );
                ManualSections::default()
            }),
            Ok(None) => ManualSections::default(),
            Err(err) => {
                warn!(
                    "event=store_load module=store status=recovered key={} error={}",
                    MANUAL_ORDER_KEY, err
                );
                ManualSections::default()
            }
        };

        let dark_mode = match blob.get(DARK_MODE_KEY) {
            Ok(Some(raw)) => decode_dark_mode(&raw).unwrap_or_else(|err| {
                warn!(
                    "event=store_load module=store status=recovered key={} error={}",
                    DARK_MODE_KEY, err
                );
                config.prefers_dark_mode
            }),
            Ok(None) => config.prefers_dark_mode,
            Err(err) => {
                warn!(
                    "event=store_load module=store status=recovered key={} error={}",
                    DARK_MODE_KEY, err
                );
                config.prefers_dark_mode
            }
        };

        report.project_count = projects.len();
        report.task_count = projects.iter().map(|project| project.tasks.len()).sum();
        info!(
            "event=store_load module=store status=ok projects={} tasks={} recovered={} read_failed={} duration_ms={}",
            report.project_count,
            report.task_count,
            report.recovered(),
            report.read_failed(),
            started_at.elapsed().as_millis()
        );

        Self {
            blob,
            projects,
            manual,
            manual_dirty: false,
            write_blocked: report.read_error.clone(),
            dark_mode,
            load_report: report,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    pub fn blob_store(&self) -> &S {
        &self.blob
    }

    pub fn into_blob_store(self) -> S {
        self.blob
    }

    /// Full collection in canonical stored order.
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Pinned, In-Progress and Completed sections, newest first unless the
    /// user rearranged a section.
    pub fn sections(&self) -> ProjectSections<'_> {
        sections(&self.projects, &self.manual)
    }

    /// Sections whose order is a manual arrangement.
    pub fn manual_sections(&self) -> &ManualSections {
        &self.manual
    }

    /// Flattened display list; indices into it are what `reorder_projects`
    /// accepts.
    pub fn display_order(&self) -> Vec<&Project> {
        self.sections().flatten()
    }

    pub fn get_project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == id)
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    /// Registers a listener invoked after every applied mutation, in
    /// registration order.
    pub fn subscribe(&mut self, listener: impl FnMut(&StoreOutcome) + 'static) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` when `id` was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Creates a project at the front of the collection.
    pub fn add_project(&mut self, input: NewProject) -> StoreResult<StoreOutcome> {
        let project = input.into_project()?;
        let project_id = project.id;
        self.projects.insert(0, project);
        Ok(self.commit(StoreEvent::ProjectCreated { project_id }))
    }

    /// Shallow-merges `patch` into the project.
    pub fn update_project(
        &mut self,
        id: ProjectId,
        patch: ProjectPatch,
    ) -> StoreResult<StoreOutcome> {
        let patch = patch.normalized()?;
        let project = self.project_mut(id)?;
        let before = project.section();
        patch.apply(project);
        let after = project.section();
        self.section_changed(before, after);
        Ok(self.commit(StoreEvent::ProjectUpdated { project_id: id }))
    }

    /// Removes the project together with every task it owns.
    pub fn delete_project(&mut self, id: ProjectId) -> StoreResult<StoreOutcome> {
        let index = self
            .projects
            .iter()
            .position(|project| project.id == id)
            .ok_or(StoreError::ProjectNotFound(id))?;
        let removed = self.projects.remove(index);
        Ok(self.commit(StoreEvent::ProjectDeleted {
            project_id: id,
            removed_tasks: removed.tasks.len(),
        }))
    }

    pub fn toggle_pin_project(&mut self, id: ProjectId) -> StoreResult<StoreOutcome> {
        let project = self.project_mut(id)?;
        let before = project.section();
        project.pinned = !project.pinned;
        let after = project.section();
        let event = if project.pinned {
            StoreEvent::ProjectPinned { project_id: id }
        } else {
            StoreEvent::ProjectUnpinned { project_id: id }
        };
        self.section_changed(before, after);
        Ok(self.commit(event))
    }

    /// Flips the project's own completion flag; tasks are not touched.
    pub fn toggle_project_completed(&mut self, id: ProjectId) -> StoreResult<StoreOutcome> {
        let project = self.project_mut(id)?;
        let before = project.section();
        project.completed = !project.completed;
        let after = project.section();
        self.section_changed(before, after);
        Ok(self.commit(StoreEvent::ProjectUpdated { project_id: id }))
    }

    /// Sets the project's theme from its text identifier.
    ///
    /// # Errors
    /// - `Validation(UnknownTheme)` for identifiers outside the enumerated set.
    pub fn update_project_theme(&mut self, id: ProjectId, theme: &str) -> StoreResult<StoreOutcome> {
        let theme = theme.parse::<ThemeColor>()?;
        self.project_mut(id)?.theme = theme;
        Ok(self.commit(StoreEvent::ProjectThemeChanged {
            project_id: id,
            theme,
        }))
    }

    /// Appends a task to the project's task list.
    pub fn add_task(&mut self, project_id: ProjectId, input: NewTask) -> StoreResult<StoreOutcome> {
        let task = input.into_task()?;
        let task_id = task.id;
        self.project_mut(project_id)?.tasks.push(task);
        Ok(self.commit(StoreEvent::TaskAdded {
            project_id,
            task_id,
        }))
    }

    pub fn update_task(
        &mut self,
        project_id: ProjectId,
        task_id: TaskId,
        patch: TaskPatch,
    ) -> StoreResult<StoreOutcome> {
        let patch = patch.normalized()?;
        let task = self
            .project_mut(project_id)?
            .task_mut(task_id)
            .ok_or(StoreError::TaskNotFound {
                project_id,
                task_id,
            })?;
        patch.apply(task);
        Ok(self.commit(StoreEvent::TaskUpdated {
            project_id,
            task_id,
        }))
    }

    pub fn toggle_task_completed(
        &mut self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> StoreResult<StoreOutcome> {
        let task = self
            .project_mut(project_id)?
            .task_mut(task_id)
            .ok_or(StoreError::TaskNotFound {
                project_id,
                task_id,
            })?;
        task.completed = !task.completed;
        Ok(self.commit(StoreEvent::TaskUpdated {
            project_id,
            task_id,
        }))
    }

    pub fn delete_task(
        &mut self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> StoreResult<StoreOutcome> {
        let project = self.project_mut(project_id)?;
        let index = project
            .tasks
            .iter()
            .position(|task| task.id == task_id)
            .ok_or(StoreError::TaskNotFound {
                project_id,
                task_id,
            })?;
        project.tasks.remove(index);
        Ok(self.commit(StoreEvent::TaskDeleted {
            project_id,
            task_id,
        }))
    }

    /// Moves one project within its display section.
    ///
    /// Indices address `display_order()`. The destination is clamped into
    /// the section holding `start_index`; the event reports whether that
    /// happened. The reassembled section order becomes the stored order and
    /// the section is marked as manually arranged. A move onto its own
    /// position changes and writes nothing.
    ///
    /// # Errors
    /// - `IndexOutOfRange` when `start_index` does not address a project.
    pub fn reorder_projects(
        &mut self,
        start_index: usize,
        end_index: usize,
    ) -> StoreResult<StoreOutcome> {
        let (plan, project_id) = {
            let lengths = self.sections().lengths();
            let plan = ReorderPlan::resolve(lengths, start_index, end_index).ok_or(
                StoreError::IndexOutOfRange {
                    index: start_index,
                    len: lengths.total(),
                },
            )?;
            (plan, self.sections().get(plan.section)[plan.from].id)
        };
        let event = StoreEvent::ProjectsReordered {
            project_id,
            section: plan.section,
            from: plan.from,
            to: plan.to,
            clamped: plan.clamped,
        };
        if plan.is_noop() {
            return Ok(self.finish(event, PersistStatus::Unchanged));
        }

        let projects = std::mem::take(&mut self.projects);
        self.projects = apply_reorder(projects, plan, &self.manual);
        if self.manual.mark(plan.section) {
            self.manual_dirty = true;
        }
        Ok(self.commit(event))
    }

    /// Re-sorts the stored order by pin, completion and newest creation
    /// time, discarding every manual arrangement.
    pub fn restore_default_order(&mut self) -> StoreOutcome {
        self.projects.sort_by(display_cmp);
        if self.manual.clear() {
            self.manual_dirty = true;
        }
        self.commit(StoreEvent::OrderRestored)
    }

    /// Flips the dark-mode preference and persists it under its own key.
    pub fn toggle_dark_mode(&mut self) -> StoreOutcome {
        self.dark_mode = !self.dark_mode;
        let persistence = self.write_key(DARK_MODE_KEY, Ok(encode_dark_mode(self.dark_mode)));
        self.finish(
            StoreEvent::DarkModeChanged {
                enabled: self.dark_mode,
            },
            persistence,
        )
    }

    fn project_mut(&mut self, id: ProjectId) -> StoreResult<&mut Project> {
        self.projects
            .iter_mut()
            .find(|project| project.id == id)
            .ok_or_else(|| {
                debug!("event=store_lookup module=store status=not_found project_id={id}");
                StoreError::ProjectNotFound(id)
            })
    }

    /// A section gaining a project falls back to recency order.
    fn section_changed(&mut self, before: Section, after: Section) {
        if before != after && self.manual.unmark(after) {
            self.manual_dirty = true;
        }
    }

    fn commit(&mut self, event: StoreEvent) -> StoreOutcome {
        let mut persistence = self.persist_projects();
        if self.manual_dirty {
            let manual = self.write_key(MANUAL_ORDER_KEY, encode_manual_sections(&self.manual));
            if manual == PersistStatus::Saved {
                self.manual_dirty = false;
            }
            if persistence == PersistStatus::Saved {
                persistence = manual;
            }
        }
        self.finish(event, persistence)
    }

    fn persist_projects(&mut self) -> PersistStatus {
        if let Some(reason) = self.write_blocked.clone() {
            // Retry the read; only an absent blob is safe to replace.
            match self.blob.get(PROJECTS_KEY) {
                Ok(None) => {
                    info!(
                        "event=store_persist module=store status=unblocked key={} reason=blob_absent",
                        PROJECTS_KEY
                    );
                    self.write_blocked = None;
                }
                Ok(Some(_)) | Err(_) => {
                    error!(
                        "event=store_persist module=store status=blocked key={} error={}",
                        PROJECTS_KEY, reason
                    );
                    return PersistStatus::Failed {
                        message: format!(
                            "saved projects could not be read ({reason}); they were not overwritten"
                        ),
                    };
                }
            }
        }
        self.write_key(PROJECTS_KEY, encode_projects(&self.projects))
    }

    fn write_key(&mut self, key: &str, encoded: SnapshotResult<String>) -> PersistStatus {
        let written = encoded.map_err(|err| err.to_string()).and_then(|raw| {
            self.blob
                .set(key, &raw)
                .map(|()| raw.len())
                .map_err(|err| err.to_string())
        });

        match written {
            Ok(bytes) => {
                debug!(
                    "event=store_persist module=store status=ok key={} bytes={}",
                    key, bytes
                );
                PersistStatus::Saved
            }
            Err(message) => {
                error!(
                    "event=store_persist module=store status=error key={} error={}",
                    key, message
                );
                PersistStatus::Failed { message }
            }
        }
    }

    fn finish(&mut self, event: StoreEvent, persistence: PersistStatus) -> StoreOutcome {
        let outcome = StoreOutcome { event, persistence };
        debug!(
            "event={} module=store status=ok persisted={}",
            outcome.event.kind(),
            outcome.is_persisted()
        );
        for (_, listener) in &mut self.listeners {
            listener(&outcome);
        }
        outcome
    }
}

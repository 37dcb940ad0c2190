//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose project/task store intents to Dart via FRB.
//! - Translate store outcomes into flat response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Each call runs one full load-mutate-persist cycle while holding the
//!   process-wide store lock, so there is exactly one writer at a time.
//! - Ids cross the boundary as UUID strings, timestamps as epoch millis.

use log::warn;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use taskdeck_core::db::open_db;
use taskdeck_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    NewProject, NewTask, Project, ProjectPatch, ProjectStore, SqliteBlobStore, StoreConfig,
    StoreOutcome, StoreResult, Task, TaskPatch, ThemeColor,
};
use uuid::Uuid;

const STORE_DB_FILE_NAME: &str = "taskdeck_store.sqlite3";
static STORE_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static STORE_LOCK: Mutex<()> = Mutex::new(());

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Task read model for detail views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskView {
    pub task_id: String,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub created_at_ms: i64,
}

/// Project read model for list and detail views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectView {
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub pinned: bool,
    /// Theme identifier (`default|blue|green|...`).
    pub theme: String,
    pub created_at_ms: i64,
    pub completed_tasks: u32,
    pub total_tasks: u32,
    pub progress_percent: u32,
    /// Tasks in detail-view order: incomplete first, newest first.
    pub tasks: Vec<TaskView>,
}

/// Full list-view snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSnapshotResponse {
    pub ok: bool,
    pub pinned: Vec<ProjectView>,
    pub in_progress: Vec<ProjectView>,
    pub completed: Vec<ProjectView>,
    pub dark_mode: bool,
    /// Diagnostics message; mentions discarded or unreadable state.
    pub message: String,
}

/// Generic action response envelope for store intents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreActionResponse {
    /// Whether the intent was applied.
    pub ok: bool,
    pub project_id: Option<String>,
    pub task_id: Option<String>,
    /// Notification headline, or failure summary.
    pub title: String,
    /// Notification body, or failure detail.
    pub message: String,
    /// Whether the notification should be styled as destructive.
    pub destructive: bool,
    /// Present when the change was applied but could not be saved.
    pub warning: Option<String>,
}

impl StoreActionResponse {
    fn applied(outcome: &StoreOutcome) -> Self {
        Self {
            ok: true,
            project_id: outcome.event.project_id().map(|id| id.to_string()),
            task_id: outcome.event.task_id().map(|id| id.to_string()),
            title: outcome.event.title().to_string(),
            message: outcome.event.message().to_string(),
            destructive: outcome.event.is_destructive(),
            warning: outcome.warning(),
        }
    }

    fn failure(operation: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            project_id: None,
            task_id: None,
            title: format!("{operation} failed"),
            message: message.into(),
            destructive: false,
            warning: None,
        }
    }
}

/// Returns sections and display preference for the list view.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; `ok=false` with empty sections on storage failure.
#[flutter_rust_bridge::frb(sync)]
pub fn store_snapshot() -> StoreSnapshotResponse {
    let result = with_store(|store| {
        let view = store.sections();
        let report = store.load_report();
        let message = match (&report.read_error, &report.discarded) {
            (Some(reason), _) => format!("Saved projects could not be read: {reason}"),
            (None, Some(reason)) => {
                format!("Saved projects could not be read and were reset: {reason}")
            }
            (None, None) => format!("Loaded {} project(s).", view.len()),
        };
        StoreSnapshotResponse {
            ok: !report.read_failed(),
            pinned: view.pinned.iter().map(|p| to_project_view(p)).collect(),
            in_progress: view.in_progress.iter().map(|p| to_project_view(p)).collect(),
            completed: view.completed.iter().map(|p| to_project_view(p)).collect(),
            dark_mode: store.dark_mode(),
            message,
        }
    });

    result.unwrap_or_else(|err| StoreSnapshotResponse {
        ok: false,
        pinned: Vec::new(),
        in_progress: Vec::new(),
        completed: Vec::new(),
        dark_mode: false,
        message: format!("store_snapshot failed: {err}"),
    })
}

/// Looks up one project for the detail view. `None` when absent or on
/// storage failure.
#[flutter_rust_bridge::frb(sync)]
pub fn store_get_project(project_id: String) -> Option<ProjectView> {
    let id = parse_id(&project_id).ok()?;
    with_store(|store| store.get_project(id).map(to_project_view))
        .ok()
        .flatten()
}

/// Creates a project at the top of its section.
///
/// Blank titles and unknown theme identifiers are rejected.
#[flutter_rust_bridge::frb(sync)]
pub fn store_add_project(
    title: String,
    description: Option<String>,
    theme: Option<String>,
) -> StoreActionResponse {
    let theme = match theme.as_deref().map(str::parse::<ThemeColor>).transpose() {
        Ok(theme) => theme,
        Err(err) => return StoreActionResponse::failure("store_add_project", err.to_string()),
    };
    let input = NewProject {
        title,
        description: normalize_description(description),
        theme,
    };
    run_action("store_add_project", |store| store.add_project(input))
}

/// Shallow-merges provided fields into a project.
///
/// `description = Some("")` clears the description.
#[flutter_rust_bridge::frb(sync)]
pub fn store_update_project(
    project_id: String,
    title: Option<String>,
    description: Option<String>,
    completed: Option<bool>,
) -> StoreActionResponse {
    let patch = ProjectPatch {
        title,
        description: description.map(|value| normalize_description(Some(value))),
        completed,
        ..ProjectPatch::default()
    };
    run_project_action("store_update_project", &project_id, |store, id| {
        store.update_project(id, patch)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn store_delete_project(project_id: String) -> StoreActionResponse {
    run_project_action("store_delete_project", &project_id, |store, id| {
        store.delete_project(id)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn store_toggle_pin_project(project_id: String) -> StoreActionResponse {
    run_project_action("store_toggle_pin_project", &project_id, |store, id| {
        store.toggle_pin_project(id)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn store_toggle_project_completed(project_id: String) -> StoreActionResponse {
    run_project_action("store_toggle_project_completed", &project_id, |store, id| {
        store.toggle_project_completed(id)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn store_set_project_theme(project_id: String, theme: String) -> StoreActionResponse {
    run_project_action("store_set_project_theme", &project_id, |store, id| {
        store.update_project_theme(id, theme.as_str())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn store_add_task(
    project_id: String,
    title: String,
    description: Option<String>,
) -> StoreActionResponse {
    let input = NewTask {
        title,
        description: normalize_description(description),
        completed: false,
    };
    run_project_action("store_add_task", &project_id, |store, id| {
        store.add_task(id, input)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn store_update_task(
    project_id: String,
    task_id: String,
    title: Option<String>,
    description: Option<String>,
    completed: Option<bool>,
) -> StoreActionResponse {
    let patch = TaskPatch {
        title,
        description: description.map(|value| normalize_description(Some(value))),
        completed,
    };
    run_task_action("store_update_task", &project_id, &task_id, |store, pid, tid| {
        store.update_task(pid, tid, patch)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn store_toggle_task_completed(project_id: String, task_id: String) -> StoreActionResponse {
    run_task_action(
        "store_toggle_task_completed",
        &project_id,
        &task_id,
        |store, pid, tid| store.toggle_task_completed(pid, tid),
    )
}

#[flutter_rust_bridge::frb(sync)]
pub fn store_delete_task(project_id: String, task_id: String) -> StoreActionResponse {
    run_task_action("store_delete_task", &project_id, &task_id, |store, pid, tid| {
        store.delete_task(pid, tid)
    })
}

/// Moves a project within its display section.
///
/// Indices address the flattened list `pinned ++ in_progress ++ completed`
/// from `store_snapshot`.
#[flutter_rust_bridge::frb(sync)]
pub fn store_reorder_projects(start_index: u32, end_index: u32) -> StoreActionResponse {
    run_action("store_reorder_projects", |store| {
        store.reorder_projects(start_index as usize, end_index as usize)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn store_restore_default_order() -> StoreActionResponse {
    run_action("store_restore_default_order", |store| {
        Ok(store.restore_default_order())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn store_toggle_dark_mode() -> StoreActionResponse {
    run_action("store_toggle_dark_mode", |store| Ok(store.toggle_dark_mode()))
}

fn run_action(
    operation: &str,
    f: impl FnOnce(&mut ProjectStore<SqliteBlobStore<'_>>) -> StoreResult<StoreOutcome>,
) -> StoreActionResponse {
    match with_store(f) {
        Ok(Ok(outcome)) => StoreActionResponse::applied(&outcome),
        Ok(Err(err)) => StoreActionResponse::failure(operation, err.to_string()),
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error operation={operation} error={err}");
            StoreActionResponse::failure(operation, err)
        }
    }
}

fn run_project_action(
    operation: &str,
    project_id: &str,
    f: impl FnOnce(&mut ProjectStore<SqliteBlobStore<'_>>, Uuid) -> StoreResult<StoreOutcome>,
) -> StoreActionResponse {
    match parse_id(project_id) {
        Ok(id) => run_action(operation, |store| f(store, id)),
        Err(err) => StoreActionResponse::failure(operation, err),
    }
}

fn run_task_action(
    operation: &str,
    project_id: &str,
    task_id: &str,
    f: impl FnOnce(&mut ProjectStore<SqliteBlobStore<'_>>, Uuid, Uuid) -> StoreResult<StoreOutcome>,
) -> StoreActionResponse {
    match (parse_id(project_id), parse_id(task_id)) {
        (Ok(pid), Ok(tid)) => run_action(operation, |store| f(store, pid, tid)),
        (Err(err), _) | (_, Err(err)) => StoreActionResponse::failure(operation, err),
    }
}

fn resolve_store_db_path() -> PathBuf {
    STORE_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("TASKDECK_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(STORE_DB_FILE_NAME)
        })
        .clone()
}

fn with_store<T>(f: impl FnOnce(&mut ProjectStore<SqliteBlobStore<'_>>) -> T) -> Result<T, String> {
    // State is reloaded from disk on every call, so poisoning is ignored.
    let _guard = STORE_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let conn = open_db(resolve_store_db_path()).map_err(|err| format!("store DB open failed: {err}"))?;
    let blob = SqliteBlobStore::try_new(&conn).map_err(|err| format!("store init failed: {err}"))?;
    let mut store = ProjectStore::load(blob, StoreConfig::default());
    Ok(f(&mut store))
}

fn parse_id(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|err| format!("invalid id `{raw}`: {err}"))
}

fn normalize_description(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn to_project_view(project: &Project) -> ProjectView {
    let progress = project.progress();
    ProjectView {
        project_id: project.id.to_string(),
        title: project.title.clone(),
        description: project.description.clone(),
        completed: project.completed,
        pinned: project.pinned,
        theme: project.theme.as_str().to_string(),
        created_at_ms: project.created_at.timestamp_millis(),
        completed_tasks: progress.completed as u32,
        total_tasks: progress.total as u32,
        progress_percent: u32::from(progress.percent()),
        tasks: project.sorted_tasks().into_iter().map(to_task_view).collect(),
    }
}

fn to_task_view(task: &Task) -> TaskView {
    TaskView {
        task_id: task.id.to_string(),
        title: task.title.clone(),
        description: task.description.clone(),
        completed: task.completed,
        created_at_ms: task.created_at.timestamp_millis(),
    }
}

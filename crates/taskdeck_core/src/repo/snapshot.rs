//! Persisted blob codec for the project collection and display preference.
//!
//! # Responsibility
//! - Encode the full collection as one JSON array under the `projects` key.
//! - Decode blobs written by this and earlier schema versions.
//!
//! # Invariants
//! - Every persisted field has a declared default; records missing
//!   `pinned`, `theme`, `completed`, `description` or `tasks` decode cleanly.
//! - Unrecognized `theme` or `pinned` values fall back to their defaults
//!   instead of invalidating the collection.
//! - Timestamps are written as RFC 3339 text and read from RFC 3339 text or
//!   epoch milliseconds.
//! - Duplicate ids are rejected instead of masked.

use crate::model::project::{Project, ProjectId, Section};
use crate::model::task::{Task, TaskId};
use crate::model::theme::ThemeColor;
use crate::service::ordering::ManualSections;
use chrono::{DateTime, TimeZone, Utc};
use log::warn;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Blob key holding the serialized project collection.
pub const PROJECTS_KEY: &str = "projects";
/// Blob key holding the dark-mode display preference.
pub const DARK_MODE_KEY: &str = "darkMode";
/// Blob key listing sections whose stored order is a manual arrangement.
pub const MANUAL_ORDER_KEY: &str = "manualOrder";

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Persisted state that cannot be turned into a valid collection.
#[derive(Debug)]
pub enum SnapshotError {
    Json(serde_json::Error),
    InvalidData(String),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "malformed persisted state: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted state: {message}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectRecord {
    id: ProjectId,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    completed: bool,
    created_at: TimestampRecord,
    #[serde(default)]
    tasks: Vec<TaskRecord>,
    #[serde(default)]
    pinned: Option<Value>,
    #[serde(default)]
    theme: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    id: TaskId,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    completed: bool,
    created_at: TimestampRecord,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TimestampRecord {
    Text(String),
    EpochMillis(i64),
}

impl TimestampRecord {
    fn into_utc(self) -> SnapshotResult<DateTime<Utc>> {
        match self {
            Self::Text(raw) => DateTime::parse_from_rfc3339(raw.trim())
                .map(|value| value.with_timezone(&Utc))
                .map_err(|err| SnapshotError::InvalidData(format!("timestamp `{raw}`: {err}"))),
            Self::EpochMillis(millis) => Utc
                .timestamp_millis_opt(millis)
                .single()
                .ok_or_else(|| {
                    SnapshotError::InvalidData(format!("timestamp {millis} is out of range"))
                }),
        }
    }
}

/// Serializes the full collection for the `projects` key.
pub fn encode_projects(projects: &[Project]) -> SnapshotResult<String> {
    Ok(serde_json::to_string(projects)?)
}

/// Parses the `projects` blob, filling defaults for fields absent in
/// older records.
///
/// # Errors
/// - `Json` when the blob is not an array of project records.
/// - `InvalidData` for unparseable timestamps or duplicate ids.
pub fn decode_projects(raw: &str) -> SnapshotResult<Vec<Project>> {
    let records: Vec<ProjectRecord> = serde_json::from_str(raw)?;
    let mut seen = HashSet::with_capacity(records.len());
    let mut projects = Vec::with_capacity(records.len());

    for record in records {
        if !seen.insert(record.id) {
            return Err(SnapshotError::InvalidData(format!(
                "duplicate project id {}",
                record.id
            )));
        }
        projects.push(project_from_record(record)?);
    }

    Ok(projects)
}

/// Serializes the manually arranged sections for the `manualOrder` key.
pub fn encode_manual_sections(manual: &ManualSections) -> SnapshotResult<String> {
    let ids = manual.iter().map(Section::as_str).collect::<Vec<_>>();
    Ok(serde_json::to_string(&ids)?)
}

/// Parses the `manualOrder` blob. Unknown section identifiers are skipped.
pub fn decode_manual_sections(raw: &str) -> SnapshotResult<ManualSections> {
    let ids: Vec<String> = serde_json::from_str(raw)?;
    Ok(ids
        .iter()
        .filter_map(|id| {
            let section = Section::parse(id);
            if section.is_none() {
                warn!(
                    "event=snapshot_decode module=repo status=recovered key={} reason=unknown_section",
                    MANUAL_ORDER_KEY
                );
            }
            section
        })
        .collect())
}

/// Serializes the dark-mode flag for the `darkMode` key.
pub fn encode_dark_mode(enabled: bool) -> String {
    enabled.to_string()
}

/// Parses the `darkMode` blob.
pub fn decode_dark_mode(raw: &str) -> SnapshotResult<bool> {
    Ok(serde_json::from_str(raw)?)
}

fn project_from_record(record: ProjectRecord) -> SnapshotResult<Project> {
    let theme = match record.theme {
        None | Some(Value::Null) => ThemeColor::default(),
        Some(raw) => {
            let theme = ThemeColor::from_persisted(raw.as_str());
            if raw.as_str() != Some(theme.as_str()) {
                warn!(
                    "event=snapshot_decode module=repo status=recovered project_id={} reason=unknown_theme fallback={}",
                    record.id, theme
                );
            }
            theme
        }
    };
    let pinned = match record.pinned {
        None | Some(Value::Null) => false,
        Some(Value::Bool(pinned)) => pinned,
        Some(_) => {
            warn!(
                "event=snapshot_decode module=repo status=recovered project_id={} reason=invalid_pinned fallback=false",
                record.id
            );
            false
        }
    };

    let mut project = Project::with_id(record.id, record.title, record.created_at.into_utc()?);
    project.description = record.description;
    project.completed = record.completed;
    project.pinned = pinned;
    project.theme = theme;

    let mut task_ids = HashSet::with_capacity(record.tasks.len());
    for task_record in record.tasks {
        if !task_ids.insert(task_record.id) {
            return Err(SnapshotError::InvalidData(format!(
                "duplicate task id {} in project {}",
                task_record.id, project.id
            )));
        }
        let mut task = Task::with_id(
            task_record.id,
            task_record.title,
            task_record.created_at.into_utc()?,
        );
        task.description = task_record.description;
        task.completed = task_record.completed;
        project.tasks.push(task);
    }

    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::{
        decode_dark_mode, decode_manual_sections, decode_projects, encode_manual_sections,
        encode_projects, SnapshotError,
    };
    use crate::model::project::NewProject;
    use crate::model::task::NewTask;
    use crate::model::project::Section;
    use crate::model::theme::ThemeColor;
    use crate::service::ordering::ManualSections;

    #[test]
    fn encoded_collection_decodes_to_equal_content() {
        let mut project = NewProject {
            title: "Launch".to_string(),
            description: Some("ship it".to_string()),
            theme: Some(ThemeColor::Purple),
        }
        .into_project()
        .unwrap();
        project.pinned = true;
        project
            .tasks
            .push(NewTask::titled("Write docs").into_task().unwrap());

        let raw = encode_projects(std::slice::from_ref(&project)).unwrap();
        let decoded = decode_projects(&raw).unwrap();

        assert_eq!(decoded, vec![project]);
    }

    #[test]
    fn encoded_form_uses_camel_case_and_iso_timestamps() {
        let project = NewProject::titled("Launch").into_project().unwrap();
        let raw = encode_projects(std::slice::from_ref(&project)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        let created_at = value[0]["createdAt"].as_str().unwrap();
        assert!(created_at.contains('T'));
        assert_eq!(value[0]["theme"], "default");
        assert_eq!(value[0]["pinned"], false);
    }

    #[test]
    fn legacy_record_without_pinned_or_theme_gets_defaults() {
        let raw = r#"[{
            "id": "6f1c2a9e-1b7f-4a51-9a59-1f0f7f3c2b10",
            "title": "Legacy",
            "completed": false,
            "createdAt": "2024-03-01T10:15:00.000Z",
            "tasks": [{
                "id": "0a3e7d4b-5c7e-4c39-8f52-2f5f4bb3a001",
                "title": "Old task",
                "completed": true,
                "createdAt": 1709288100000
            }]
        }]"#;

        let projects = decode_projects(raw).unwrap();
        assert_eq!(projects.len(), 1);
        assert!(!projects[0].pinned);
        assert_eq!(projects[0].theme, ThemeColor::Default);
        assert_eq!(projects[0].tasks.len(), 1);
        assert!(projects[0].tasks[0].completed);
        assert_eq!(projects[0].tasks[0].created_at.timestamp_millis(), 1_709_288_100_000);
    }

    #[test]
    fn unknown_theme_falls_back_to_default() {
        let raw = r#"[{
            "id": "6f1c2a9e-1b7f-4a51-9a59-1f0f7f3c2b10",
            "title": "Legacy",
            "createdAt": "2024-03-01T10:15:00Z",
            "theme": "ultraviolet"
        }]"#;

        let projects = decode_projects(raw).unwrap();
        assert_eq!(projects[0].theme, ThemeColor::Default);
    }

    #[test]
    fn non_string_theme_and_non_boolean_pinned_fall_back_to_defaults() {
        let raw = r#"[
            {"id": "6f1c2a9e-1b7f-4a51-9a59-1f0f7f3c2b10", "title": "Numeric theme",
             "createdAt": "2024-03-01T10:15:00Z", "theme": 3, "pinned": "yes"},
            {"id": "6f1c2a9e-1b7f-4a51-9a59-1f0f7f3c2b11", "title": "Null fields",
             "createdAt": "2024-03-02T10:15:00Z", "theme": null, "pinned": null},
            {"id": "6f1c2a9e-1b7f-4a51-9a59-1f0f7f3c2b12", "title": "Valid",
             "createdAt": "2024-03-03T10:15:00Z", "theme": "teal", "pinned": true}
        ]"#;

        let projects = decode_projects(raw).unwrap();
        assert_eq!(projects.len(), 3);
        assert_eq!(projects[0].theme, ThemeColor::Default);
        assert!(!projects[0].pinned);
        assert_eq!(projects[1].theme, ThemeColor::Default);
        assert!(!projects[1].pinned);
        assert_eq!(projects[2].theme, ThemeColor::Teal);
        assert!(projects[2].pinned);
    }

    #[test]
    fn manual_sections_encode_as_identifiers_and_skip_unknown_ones() {
        let manual = [Section::Completed, Section::InProgress]
            .into_iter()
            .collect::<ManualSections>();
        let raw = encode_manual_sections(&manual).unwrap();
        assert_eq!(raw, r#"["in_progress","completed"]"#);
        assert_eq!(decode_manual_sections(&raw).unwrap(), manual);

        let decoded = decode_manual_sections(r#"["pinned","archived"]"#).unwrap();
        assert_eq!(decoded.iter().collect::<Vec<_>>(), vec![Section::Pinned]);
        assert!(decode_manual_sections("{").is_err());
    }

    #[test]
    fn duplicate_project_ids_are_rejected() {
        let raw = r#"[
            {"id": "6f1c2a9e-1b7f-4a51-9a59-1f0f7f3c2b10", "title": "a", "createdAt": "2024-03-01T10:15:00Z"},
            {"id": "6f1c2a9e-1b7f-4a51-9a59-1f0f7f3c2b10", "title": "b", "createdAt": "2024-03-02T10:15:00Z"}
        ]"#;

        let err = decode_projects(raw).unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidData(message) if message.contains("duplicate")));
    }

    #[test]
    fn non_array_blob_is_malformed() {
        assert!(matches!(
            decode_projects("{\"projects\": []}").unwrap_err(),
            SnapshotError::Json(_)
        ));
        assert!(matches!(
            decode_projects("not json").unwrap_err(),
            SnapshotError::Json(_)
        ));
    }

    #[test]
    fn dark_mode_decodes_json_booleans_only() {
        assert!(decode_dark_mode("true").unwrap());
        assert!(!decode_dark_mode("false").unwrap());
        assert!(decode_dark_mode("\"yes\"").is_err());
    }
}

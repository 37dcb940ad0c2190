//! Core domain logic for TaskDeck.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::project::{NewProject, Progress, Project, ProjectId, ProjectPatch, Section};
pub use model::task::{NewTask, Task, TaskId, TaskPatch};
pub use model::theme::ThemeColor;
pub use model::ValidationError;
pub use repo::blob_store::{BlobResult, BlobStore, BlobStoreError, MemoryBlobStore, SqliteBlobStore};
pub use repo::snapshot::{SnapshotError, DARK_MODE_KEY, MANUAL_ORDER_KEY, PROJECTS_KEY};
pub use service::event::{PersistStatus, StoreEvent, StoreOutcome};
pub use service::ordering::{ManualSections, ProjectSections, ReorderPlan, SectionLengths};
pub use service::project_store::{
    LoadReport, ProjectStore, StoreConfig, StoreError, StoreResult, SubscriptionId,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

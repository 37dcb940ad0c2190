//! Domain model for the project/task tracker.
//!
//! # Responsibility
//! - Define canonical data structures used by the store and its callers.
//! - Own input validation for user-supplied titles and theme identifiers.
//!
//! # Invariants
//! - Every project and task is identified by a stable UUID.
//! - Tasks are owned by exactly one project; there are no cross-project
//!   references.
//! - Derived values (progress, section) are computed, never stored.

pub mod project;
pub mod task;
pub mod theme;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failures for user-supplied input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Title is empty after trimming whitespace.
    EmptyTitle,
    /// Theme identifier is not part of the enumerated set.
    UnknownTheme(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be blank"),
            Self::UnknownTheme(value) => write!(
                f,
                "unknown theme `{value}`; expected one of default|blue|green|purple|orange|pink|teal|yellow|red"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Trims a title and rejects it when nothing remains.
pub fn normalize_title(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

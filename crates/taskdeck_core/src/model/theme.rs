//! Project accent color model.
//!
//! # Invariants
//! - A project theme is always one of the enumerated `ThemeColor` values.
//! - Text identifiers are lowercase and stable; they are the persisted form.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use super::ValidationError;

/// Cosmetic accent color attached to a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeColor {
    #[default]
    Default,
    Blue,
    Green,
    Purple,
    Orange,
    Pink,
    Teal,
    Yellow,
    Red,
}

impl ThemeColor {
    /// Every selectable theme, in picker order.
    pub const ALL: [ThemeColor; 9] = [
        ThemeColor::Default,
        ThemeColor::Blue,
        ThemeColor::Green,
        ThemeColor::Purple,
        ThemeColor::Orange,
        ThemeColor::Pink,
        ThemeColor::Teal,
        ThemeColor::Yellow,
        ThemeColor::Red,
    ];

    /// Stable text identifier used in persisted state and at API boundaries.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Purple => "purple",
            Self::Orange => "orange",
            Self::Pink => "pink",
            Self::Teal => "teal",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }

    /// Parses a persisted identifier, falling back to `Default` for
    /// missing or unrecognized values.
    pub fn from_persisted(value: Option<&str>) -> Self {
        value
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }
}

impl Display for ThemeColor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeColor {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|theme| theme.as_str() == value)
            .ok_or_else(|| ValidationError::UnknownTheme(value.to_string()))
    }
}

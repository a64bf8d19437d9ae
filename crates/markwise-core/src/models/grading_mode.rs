use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The grading engine's closed mode vocabulary.
///
/// Serialized as the lowercase token (`"exact"`, `"keyword"`, ...). Human-facing
/// labels never reach the engine; they are translated through [`MODE_LABELS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradingMode {
    /// Full marks iff the normalized answer equals the normalized expected answer.
    Exact,
    /// Proportional credit for expected keywords found in the answer.
    Keyword,
    /// Tiered credit from an injected similarity score.
    Semantic,
    /// Always zero; a teacher supplies the final score out-of-band.
    Manual,
}

/// Every label the authoring flow can put on a button, and the mode it selects.
///
/// This table is the only translation from labels to modes.
pub const MODE_LABELS: &[(&str, GradingMode)] = &[
    ("Short Answer", GradingMode::Manual),
    ("Exact Match", GradingMode::Exact),
    ("Keyword Based", GradingMode::Keyword),
    ("AI Semantic", GradingMode::Semantic),
];

impl GradingMode {
    pub const ALL: [GradingMode; 4] = [
        GradingMode::Exact,
        GradingMode::Keyword,
        GradingMode::Semantic,
        GradingMode::Manual,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GradingMode::Exact => "exact",
            GradingMode::Keyword => "keyword",
            GradingMode::Semantic => "semantic",
            GradingMode::Manual => "manual",
        }
    }

    /// The human-facing label for this mode.
    pub fn label(self) -> &'static str {
        match self {
            GradingMode::Exact => "Exact Match",
            GradingMode::Keyword => "Keyword Based",
            GradingMode::Semantic => "AI Semantic",
            GradingMode::Manual => "Short Answer",
        }
    }

    /// Look a label up in [`MODE_LABELS`]. No case folding or trimming.
    pub fn lookup_label(label: &str) -> Option<GradingMode> {
        MODE_LABELS
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, mode)| *mode)
    }

    /// Translate a label, falling back to [`GradingMode::Manual`] when unknown.
    pub fn from_label(label: &str) -> GradingMode {
        Self::lookup_label(label).unwrap_or(GradingMode::Manual)
    }
}

impl fmt::Display for GradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GradingMode {
    type Err = CoreError;

    /// Parses the vocabulary token only, never a label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GradingMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| CoreError::UnrecognizedMode(s.to_string()))
    }
}

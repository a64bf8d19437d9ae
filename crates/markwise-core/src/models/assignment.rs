use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::grading_mode::GradingMode;
use super::student_details::StudentField;
use crate::error::CoreError;

pub const CODE_LEN: usize = 8;

/// Alphabet assignment codes are drawn from. Codes are stored uppercase.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// The 8-character student-facing handle of an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentCode(String);

impl AssignmentCode {
    /// Parse user input. Surrounding whitespace is ignored and case is folded
    /// to upper, so lookups are case-insensitive.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let code = input.trim().to_ascii_uppercase();
        if code.len() != CODE_LEN || !code.bytes().all(|b| CODE_ALPHABET.contains(&b)) {
            return Err(CoreError::InvalidCode(input.trim().to_string()));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssignmentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a teacher expects: one canonical string, or a keyword set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ExpectedAnswer {
    Canonical(String),
    Keywords(Vec<String>),
}

impl ExpectedAnswer {
    /// Build from the text a teacher typed while authoring.
    ///
    /// Keyword mode splits on whitespace; every other mode keeps the text whole.
    pub fn from_input(mode: GradingMode, text: &str) -> Result<Self, CoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CoreError::MalformedExpectedAnswer(
                "expected answer is empty".to_string(),
            ));
        }
        Ok(match mode {
            GradingMode::Keyword => {
                ExpectedAnswer::Keywords(text.split_whitespace().map(str::to_string).collect())
            }
            _ => ExpectedAnswer::Canonical(text.to_string()),
        })
    }

    /// The expected answer as one string (keywords joined by spaces).
    pub fn as_text(&self) -> String {
        match self {
            ExpectedAnswer::Canonical(s) => s.clone(),
            ExpectedAnswer::Keywords(words) => words.join(" "),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub code: AssignmentCode,
    pub owner_teacher_id: Uuid,
    pub title: String,
    pub question_text: String,
    pub expected: ExpectedAnswer,
    pub grading_mode: GradingMode,
    pub max_score: u32,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<jiff::Timestamp>,
    /// Details students must give before answering, in asking order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_fields: Vec<StudentField>,
    /// Set before the first submission is written. Once sealed, the grading
    /// parameters are frozen.
    #[serde(default)]
    pub sealed: bool,
    pub created_at: jiff::Timestamp,
}

fn default_active() -> bool {
    true
}

/// Why an assignment no longer accepts submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosedReason {
    Inactive,
    DeadlinePassed(jiff::Timestamp),
}

impl fmt::Display for ClosedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClosedReason::Inactive => f.write_str("assignment is no longer active"),
            ClosedReason::DeadlinePassed(at) => write!(f, "deadline passed at {at}"),
        }
    }
}

impl Assignment {
    pub fn closed_reason(&self, now: jiff::Timestamp) -> Option<ClosedReason> {
        if !self.active {
            return Some(ClosedReason::Inactive);
        }
        match self.deadline {
            Some(deadline) if now > deadline => Some(ClosedReason::DeadlinePassed(deadline)),
            _ => None,
        }
    }
}

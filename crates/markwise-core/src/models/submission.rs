use serde::{Deserialize, Serialize};

use super::assignment::AssignmentCode;
use super::grade::GradeFlag;
use super::student_details::StudentDetail;

/// One scored attempt, keyed by (assignment code, student identity).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub assignment_code: AssignmentCode,
    pub student_identity: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub student_details: Vec<StudentDetail>,
    pub raw_answer_text: String,
    pub score: u32,
    /// The assignment's max score when this attempt was graded.
    pub max_score: u32,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<GradeFlag>,
    pub graded_by: GradedBy,
    pub submitted_at: jiff::Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradedBy {
    Engine,
    Teacher,
}

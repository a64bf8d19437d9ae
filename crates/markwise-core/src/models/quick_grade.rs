use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::grading_mode::GradingMode;

/// A one-off grading request, kept for history only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickGrade {
    pub id: Uuid,
    pub raw_answer_text: String,
    pub expected_answer: String,
    pub max_score: u32,
    pub grading_mode: GradingMode,
    pub score: u32,
    pub explanation: String,
    pub graded_at: jiff::Timestamp,
}

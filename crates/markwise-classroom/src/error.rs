use markwise_core::error::CoreError;
use markwise_core::models::assignment::{AssignmentCode, ClosedReason};
use markwise_core::models::student_details::StudentField;
use markwise_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassroomError {
    #[error("no assignment with code {code}")]
    NotFound { code: String },

    #[error("malformed assignment: {0}")]
    MalformedAssignment(String),

    #[error("{student} has already submitted to {code}")]
    AlreadySubmitted {
        code: AssignmentCode,
        student: String,
    },

    #[error("assignment {code} is closed: {reason}")]
    Closed {
        code: AssignmentCode,
        reason: ClosedReason,
    },

    #[error("assignment {code} already has submissions")]
    SubmissionsExist { code: AssignmentCode },

    #[error("max score must be a positive integer, got {0}")]
    InvalidMaxScore(u32),

    #[error("score {score} is outside 0..={max_score}")]
    ScoreOutOfRange { score: u32, max_score: u32 },

    #[error("assignment {code} belongs to another teacher")]
    NotOwner { code: AssignmentCode },

    #[error("no submission from {student} for {code}")]
    SubmissionNotFound {
        code: AssignmentCode,
        student: String,
    },

    #[error("{field} is required for {code}")]
    MissingDetail {
        code: AssignmentCode,
        field: StudentField,
    },

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

//! markwise-classroom
//!
//! Assignments, submissions, and quick grades: the domain operations the
//! conversation layer dispatches to. All state lives in a
//! [`Bucket`](markwise_storage::Bucket).

pub mod analytics;
pub mod codes;
pub mod error;
pub mod ledger;
pub mod quick_grade;
pub mod registry;

pub use error::ClassroomError;
pub use ledger::{ResubmissionPolicy, SubmissionLedger};
pub use quick_grade::QuickGradeLog;
pub use registry::{AssignmentRegistry, NewAssignment};

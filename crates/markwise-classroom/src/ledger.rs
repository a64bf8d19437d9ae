use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use jiff::Timestamp;
use markwise_core::models::assignment::{Assignment, AssignmentCode};
use markwise_core::models::student_details::{StudentDetail, first_missing};
use markwise_core::models::submission::{GradedBy, Submission};
use markwise_core::store_keys;
use markwise_grading::{Similarity, grade};
use markwise_storage::state::{
    create_state, load_state, load_state_opt, save_state, save_state_if_match,
};
use markwise_storage::{Bucket, StorageError, objects};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ClassroomError;
use crate::registry::{load_assignment, seal};

/// What happens when a student submits to the same assignment twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResubmissionPolicy {
    /// Keep the first attempt; later ones fail with `AlreadySubmitted`.
    #[default]
    Reject,
    /// Replace the stored attempt with the new one.
    Overwrite,
}

impl FromStr for ResubmissionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(ResubmissionPolicy::Reject),
            "overwrite" => Ok(ResubmissionPolicy::Overwrite),
            other => Err(format!("expected 'reject' or 'overwrite', got '{other}'")),
        }
    }
}

impl fmt::Display for ResubmissionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResubmissionPolicy::Reject => f.write_str("reject"),
            ResubmissionPolicy::Overwrite => f.write_str("overwrite"),
        }
    }
}

pub const TEACHER_OVERRIDE_EXPLANATION: &str = "Score set by teacher";

pub struct SubmissionLedger {
    bucket: Arc<Bucket>,
    similarity: Arc<dyn Similarity>,
    policy: ResubmissionPolicy,
}

impl SubmissionLedger {
    pub fn new(
        bucket: Arc<Bucket>,
        similarity: Arc<dyn Similarity>,
        policy: ResubmissionPolicy,
    ) -> Self {
        Self {
            bucket,
            similarity,
            policy,
        }
    }

    pub fn policy(&self) -> ResubmissionPolicy {
        self.policy
    }

    /// Grade an answer against the stored assignment and persist the attempt.
    pub async fn record(
        &self,
        assignment_code: &str,
        student_identity: &str,
        raw_answer_text: &str,
    ) -> Result<Submission, ClassroomError> {
        self.record_with_details(assignment_code, student_identity, raw_answer_text, &[])
            .await
    }

    /// Like [`SubmissionLedger::record`], for assignments that ask the
    /// student for details first. Every required field needs a value.
    pub async fn record_with_details(
        &self,
        assignment_code: &str,
        student_identity: &str,
        raw_answer_text: &str,
        student_details: &[StudentDetail],
    ) -> Result<Submission, ClassroomError> {
        let (assignment, _) = load_assignment(&self.bucket, assignment_code).await?;
        let now = Timestamp::now();
        ensure_open(&assignment, now)?;
        if let Some(field) = first_missing(&assignment.required_fields, student_details) {
            return Err(ClassroomError::MissingDetail {
                code: assignment.code,
                field,
            });
        }

        let key = store_keys::submission(&assignment.code, student_identity);
        if self.policy == ResubmissionPolicy::Reject
            && objects::object_exists(&self.bucket, &key).await?
        {
            return Err(already_submitted(&assignment, student_identity));
        }

        // Once sealed the max score is fixed, so the grade below and the
        // stored max score cannot drift apart.
        let assignment = seal(&self.bucket, assignment.code.as_str()).await?;
        ensure_open(&assignment, now)?;

        let grade = grade(
            raw_answer_text,
            &assignment.expected,
            assignment.max_score,
            assignment.grading_mode,
            self.similarity.as_ref(),
        )
        .await;

        let student_details = student_details
            .iter()
            .filter(|d| !d.value.trim().is_empty())
            .map(|d| StudentDetail::new(d.field, d.value.trim()))
            .collect();

        let submission = Submission {
            assignment_code: assignment.code.clone(),
            student_identity: student_identity.to_string(),
            student_details,
            raw_answer_text: raw_answer_text.to_string(),
            score: grade.score,
            max_score: grade.max_score,
            explanation: grade.explanation,
            flag: grade.flag,
            graded_by: GradedBy::Engine,
            submitted_at: now,
        };

        match self.policy {
            ResubmissionPolicy::Reject => {
                match create_state(&self.bucket, &key, &submission).await {
                    Ok(_) => {}
                    Err(StorageError::AlreadyExists { .. }) => {
                        return Err(already_submitted(&assignment, student_identity));
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            ResubmissionPolicy::Overwrite => {
                save_state(&self.bucket, &key, &submission).await?;
            }
        }

        info!(
            code = %submission.assignment_code,
            student = student_identity,
            mode = %assignment.grading_mode,
            score = submission.score,
            max_score = submission.max_score,
            "recorded submission"
        );
        Ok(submission)
    }

    /// A student's stored attempt, if any.
    pub async fn find(
        &self,
        code: &AssignmentCode,
        student_identity: &str,
    ) -> Result<Option<Submission>, ClassroomError> {
        let key = store_keys::submission(code, student_identity);
        Ok(load_state_opt(&self.bucket, &key).await?)
    }

    /// Every attempt at an assignment, oldest first.
    pub async fn submissions_for(
        &self,
        code: &AssignmentCode,
    ) -> Result<Vec<Submission>, ClassroomError> {
        let prefix = store_keys::submissions_prefix(code);
        let keys = objects::list_objects(&self.bucket, &prefix).await?;
        let mut submissions = Vec::with_capacity(keys.len());
        for key in keys {
            match load_state::<Submission>(&self.bucket, &key).await {
                Ok((submission, _)) => submissions.push(submission),
                Err(StorageError::NotFound { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }
        submissions.sort_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then_with(|| a.student_identity.cmp(&b.student_identity))
        });
        Ok(submissions)
    }

    /// Set a submission's score by hand. Only the owning teacher may do this,
    /// and only within the max score the attempt was graded against.
    pub async fn override_score(
        &self,
        teacher_id: Uuid,
        assignment_code: &str,
        student_identity: &str,
        score: u32,
    ) -> Result<Submission, ClassroomError> {
        let (assignment, _) = load_assignment(&self.bucket, assignment_code).await?;
        if assignment.owner_teacher_id != teacher_id {
            return Err(ClassroomError::NotOwner {
                code: assignment.code,
            });
        }

        let key = store_keys::submission(&assignment.code, student_identity);
        let loaded = load_state::<Submission>(&self.bucket, &key).await;
        let (mut submission, etag) = match loaded {
            Ok(found) => found,
            Err(StorageError::NotFound { .. }) => {
                return Err(ClassroomError::SubmissionNotFound {
                    code: assignment.code,
                    student: student_identity.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if score > submission.max_score {
            return Err(ClassroomError::ScoreOutOfRange {
                score,
                max_score: submission.max_score,
            });
        }

        let previous = submission.score;
        submission.score = score;
        submission.explanation = TEACHER_OVERRIDE_EXPLANATION.to_string();
        submission.flag = None;
        submission.graded_by = GradedBy::Teacher;

        if let Err(e) = save_state_if_match(&self.bucket, &key, &submission, &etag).await {
            warn!(
                code = %assignment.code,
                student = student_identity,
                error = %e,
                "score override lost a race"
            );
            return Err(e.into());
        }

        info!(
            code = %assignment.code,
            student = student_identity,
            previous,
            score,
            "teacher overrode score"
        );
        Ok(submission)
    }

    /// Total stored submissions across all assignments.
    pub async fn count(&self) -> Result<usize, ClassroomError> {
        Ok(objects::list_objects(&self.bucket, store_keys::SUBMISSIONS_PREFIX)
            .await?
            .len())
    }
}

fn ensure_open(assignment: &Assignment, now: Timestamp) -> Result<(), ClassroomError> {
    match assignment.closed_reason(now) {
        Some(reason) => Err(ClassroomError::Closed {
            code: assignment.code.clone(),
            reason,
        }),
        None => Ok(()),
    }
}

fn already_submitted(assignment: &Assignment, student: &str) -> ClassroomError {
    ClassroomError::AlreadySubmitted {
        code: assignment.code.clone(),
        student: student.to_string(),
    }
}

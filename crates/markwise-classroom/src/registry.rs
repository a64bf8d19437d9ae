use std::sync::Arc;

use jiff::Timestamp;
use markwise_core::models::assignment::{Assignment, AssignmentCode, ExpectedAnswer};
use markwise_core::models::grading_mode::GradingMode;
use markwise_core::models::student_details::StudentField;
use markwise_core::store_keys;
use markwise_grading::engine::keyword_set;
use markwise_storage::state::{
    create_state, load_state, load_state_opt, save_state_if_match, update_state,
};
use markwise_storage::{Bucket, StorageError, objects};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::codes::{CodeSource, RandomCodes};
use crate::error::ClassroomError;

/// Rounds of read-modify-write on one assignment before giving up.
const MAX_MODIFY_ROUNDS: usize = 16;

/// Codes of a teacher's assignments in creation order.
#[derive(Debug, Default, Serialize, Deserialize)]
struct OwnerIndex {
    codes: Vec<AssignmentCode>,
}

/// Everything a teacher supplies when publishing an assignment.
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub title: String,
    pub question_text: String,
    pub expected: ExpectedAnswer,
    pub grading_mode: GradingMode,
    pub max_score: u32,
    pub deadline: Option<Timestamp>,
    pub required_fields: Vec<StudentField>,
}

pub struct AssignmentRegistry {
    bucket: Arc<Bucket>,
    codes: Box<dyn CodeSource>,
}

impl AssignmentRegistry {
    pub fn new(bucket: Arc<Bucket>) -> Self {
        Self::with_code_source(bucket, Box::new(RandomCodes))
    }

    pub fn with_code_source(bucket: Arc<Bucket>, codes: Box<dyn CodeSource>) -> Self {
        Self { bucket, codes }
    }

    /// Publish an assignment under a fresh code.
    ///
    /// Candidate codes are drawn until one can be claimed; there is no
    /// attempt limit.
    pub async fn create(
        &self,
        owner: Uuid,
        draft: NewAssignment,
    ) -> Result<Assignment, ClassroomError> {
        validate(&draft)?;
        let created_at = Timestamp::now();
        if let Some(deadline) = draft.deadline
            && deadline <= created_at
        {
            return Err(ClassroomError::InvalidInput(
                "deadline must be in the future".to_string(),
            ));
        }

        let mut required_fields = Vec::with_capacity(draft.required_fields.len());
        for field in &draft.required_fields {
            if !required_fields.contains(field) {
                required_fields.push(*field);
            }
        }

        let mut collisions = 0u32;
        let assignment = loop {
            let code = AssignmentCode::parse(&self.codes.next_code())?;
            let assignment = Assignment {
                code: code.clone(),
                owner_teacher_id: owner,
                title: draft.title.trim().to_string(),
                question_text: draft.question_text.trim().to_string(),
                expected: draft.expected.clone(),
                grading_mode: draft.grading_mode,
                max_score: draft.max_score,
                active: true,
                deadline: draft.deadline,
                required_fields: required_fields.clone(),
                sealed: false,
                created_at,
            };
            let key = store_keys::assignment(&code);
            match create_state(&self.bucket, &key, &assignment).await {
                Ok(_) => break assignment,
                Err(StorageError::AlreadyExists { .. }) => {
                    collisions += 1;
                    debug!(code = %code, collisions, "assignment code taken, drawing again");
                }
                Err(e) => return Err(e.into()),
            }
        };

        let index_key = store_keys::owner_index(owner);
        update_state(&self.bucket, &index_key, |index: &mut OwnerIndex| {
            index.codes.push(assignment.code.clone());
        })
        .await?;

        info!(
            code = %assignment.code,
            teacher_id = %owner,
            mode = %assignment.grading_mode,
            max_score = assignment.max_score,
            required_fields = assignment.required_fields.len(),
            "created assignment"
        );
        Ok(assignment)
    }

    /// Find an assignment by code, case-insensitively.
    pub async fn lookup(&self, code: &str) -> Result<Assignment, ClassroomError> {
        let (assignment, _) = load_assignment(&self.bucket, code).await?;
        Ok(assignment)
    }

    /// Like [`AssignmentRegistry::lookup`] but refuses inactive or expired
    /// assignments.
    pub async fn lookup_open(
        &self,
        code: &str,
        now: Timestamp,
    ) -> Result<Assignment, ClassroomError> {
        let assignment = self.lookup(code).await?;
        match assignment.closed_reason(now) {
            Some(reason) => Err(ClassroomError::Closed {
                code: assignment.code,
                reason,
            }),
            None => Ok(assignment),
        }
    }

    /// A teacher's assignments, most recent first.
    pub async fn list_for_owner(
        &self,
        teacher_id: Uuid,
    ) -> Result<Vec<Assignment>, ClassroomError> {
        let index_key = store_keys::owner_index(teacher_id);
        let index: OwnerIndex = load_state_opt(&self.bucket, &index_key)
            .await?
            .unwrap_or_default();

        let mut assignments = Vec::with_capacity(index.codes.len());
        for code in index.codes.iter().rev() {
            let key = store_keys::assignment(code);
            match load_state::<Assignment>(&self.bucket, &key).await {
                Ok((assignment, _)) => assignments.push(assignment),
                Err(StorageError::NotFound { .. }) => {
                    warn!(
                        code = %code,
                        teacher_id = %teacher_id,
                        "owner index lists a missing assignment"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(assignments)
    }

    /// Look up an assignment and check that `teacher_id` owns it.
    pub async fn owned(&self, teacher_id: Uuid, code: &str) -> Result<Assignment, ClassroomError> {
        let assignment = self.lookup(code).await?;
        if assignment.owner_teacher_id != teacher_id {
            return Err(ClassroomError::NotOwner {
                code: assignment.code,
            });
        }
        Ok(assignment)
    }

    /// Change the max score. Only allowed while nobody has submitted.
    pub async fn set_max_score(
        &self,
        teacher_id: Uuid,
        code: &str,
        max_score: u32,
    ) -> Result<Assignment, ClassroomError> {
        if max_score == 0 {
            return Err(ClassroomError::InvalidMaxScore(max_score));
        }
        let edit = |assignment: &mut Assignment| assignment.max_score = max_score;
        self.modify_owned(teacher_id, code, edit, true).await
    }

    pub async fn set_active(
        &self,
        teacher_id: Uuid,
        code: &str,
        active: bool,
    ) -> Result<Assignment, ClassroomError> {
        let edit = |assignment: &mut Assignment| assignment.active = active;
        self.modify_owned(teacher_id, code, edit, false).await
    }

    /// Remove an assignment with all of its submissions. Returns how many
    /// submissions were removed.
    ///
    /// The assignment object goes first so no new attempt can be recorded
    /// while the submissions are cleared.
    pub async fn delete(&self, teacher_id: Uuid, code: &str) -> Result<usize, ClassroomError> {
        let assignment = self.owned(teacher_id, code).await?;
        let code = assignment.code;

        objects::delete_object(&self.bucket, &store_keys::assignment(&code)).await?;

        let prefix = store_keys::submissions_prefix(&code);
        let keys = objects::list_objects(&self.bucket, &prefix).await?;
        for key in &keys {
            objects::delete_object(&self.bucket, key).await?;
        }

        let index_key = store_keys::owner_index(teacher_id);
        update_state(&self.bucket, &index_key, |index: &mut OwnerIndex| {
            index.codes.retain(|c| *c != code);
        })
        .await?;

        info!(
            code = %code,
            teacher_id = %teacher_id,
            submissions = keys.len(),
            "deleted assignment"
        );
        Ok(keys.len())
    }

    /// Number of published assignments.
    pub async fn count(&self) -> Result<usize, ClassroomError> {
        let keys = objects::list_objects(&self.bucket, store_keys::ASSIGNMENTS_PREFIX).await?;
        Ok(keys.len())
    }

    async fn modify_owned<F>(
        &self,
        teacher_id: Uuid,
        code: &str,
        modify: F,
        require_no_submissions: bool,
    ) -> Result<Assignment, ClassroomError>
    where
        F: Fn(&mut Assignment),
    {
        for round in 0..MAX_MODIFY_ROUNDS {
            let (mut assignment, etag) = load_assignment(&self.bucket, code).await?;
            if assignment.owner_teacher_id != teacher_id {
                return Err(ClassroomError::NotOwner {
                    code: assignment.code,
                });
            }
            // The seal is part of the object the CAS below covers, so an
            // attempt that sealed in between makes this write fail.
            let blocked = require_no_submissions
                && (assignment.sealed || self.has_submissions(&assignment).await?);
            if blocked {
                return Err(ClassroomError::SubmissionsExist {
                    code: assignment.code,
                });
            }

            modify(&mut assignment);
            let key = store_keys::assignment(&assignment.code);
            match save_state_if_match(&self.bucket, &key, &assignment, &etag).await {
                Ok(_) => {
                    info!(code = %assignment.code, teacher_id = %teacher_id, "updated assignment");
                    return Ok(assignment);
                }
                Err(StorageError::PreconditionFailed { .. }) => {
                    debug!(
                        code = %assignment.code,
                        round,
                        "assignment changed underneath, retrying"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StorageError::PreconditionFailed {
            key: store_keys::assignment(&AssignmentCode::parse(code)?),
        }
        .into())
    }

    async fn has_submissions(&self, assignment: &Assignment) -> Result<bool, ClassroomError> {
        let prefix = store_keys::submissions_prefix(&assignment.code);
        let keys = objects::list_objects(&self.bucket, &prefix).await?;
        Ok(!keys.is_empty())
    }
}

/// Load by user-typed code. Malformed codes are reported as not found.
pub(crate) async fn load_assignment(
    bucket: &Bucket,
    code: &str,
) -> Result<(Assignment, String), ClassroomError> {
    let not_found = || ClassroomError::NotFound {
        code: code.trim().to_string(),
    };
    let code = AssignmentCode::parse(code).map_err(|_| not_found())?;
    match load_state(bucket, &store_keys::assignment(&code)).await {
        Ok(found) => Ok(found),
        Err(StorageError::NotFound { .. }) => Err(not_found()),
        Err(e) => Err(e.into()),
    }
}

/// Mark an assignment as having submissions before the first one is
/// written, and return the sealed assignment to grade against.
pub(crate) async fn seal(bucket: &Bucket, code: &str) -> Result<Assignment, ClassroomError> {
    for round in 0..MAX_MODIFY_ROUNDS {
        let (mut assignment, etag) = load_assignment(bucket, code).await?;
        if assignment.sealed {
            return Ok(assignment);
        }

        assignment.sealed = true;
        let key = store_keys::assignment(&assignment.code);
        match save_state_if_match(bucket, &key, &assignment, &etag).await {
            Ok(_) => {
                debug!(code = %assignment.code, "sealed assignment");
                return Ok(assignment);
            }
            Err(StorageError::PreconditionFailed { .. }) => {
                debug!(code = %assignment.code, round, "seal lost a race, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(StorageError::PreconditionFailed {
        key: store_keys::assignment(&AssignmentCode::parse(code)?),
    }
    .into())
}

fn validate(draft: &NewAssignment) -> Result<(), ClassroomError> {
    if draft.max_score == 0 {
        return Err(ClassroomError::InvalidMaxScore(draft.max_score));
    }
    if draft.question_text.trim().is_empty() {
        return Err(ClassroomError::InvalidInput(
            "question must not be empty".to_string(),
        ));
    }
    if draft.grading_mode == GradingMode::Keyword && keyword_set(&draft.expected).is_empty() {
        return Err(ClassroomError::MalformedAssignment(
            "keyword assignments need at least one keyword".to_string(),
        ));
    }
    Ok(())
}

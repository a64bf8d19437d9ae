use std::sync::Arc;

use markwise_core::models::assignment::ExpectedAnswer;
use markwise_core::models::grade::Grade;
use markwise_core::models::grading_mode::GradingMode;
use markwise_core::models::quick_grade::QuickGrade;
use markwise_core::store_keys;
use markwise_grading::{Similarity, grade};
use markwise_storage::state::save_state;
use markwise_storage::{Bucket, objects};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ClassroomError;

/// One-off grading outside any assignment.
pub struct QuickGradeLog {
    bucket: Arc<Bucket>,
    similarity: Arc<dyn Similarity>,
}

impl QuickGradeLog {
    pub fn new(bucket: Arc<Bucket>, similarity: Arc<dyn Similarity>) -> Self {
        Self { bucket, similarity }
    }

    /// Grade and log. The log is history only: a failed write is reported in
    /// the logs but the grade is still returned.
    pub async fn grade(
        &self,
        answer: &str,
        expected_text: &str,
        max_score: u32,
        mode: GradingMode,
    ) -> Result<Grade, ClassroomError> {
        if max_score == 0 {
            return Err(ClassroomError::InvalidMaxScore(max_score));
        }
        let expected = ExpectedAnswer::from_input(mode, expected_text)?;
        let result = grade(answer, &expected, max_score, mode, self.similarity.as_ref()).await;

        let entry = QuickGrade {
            id: Uuid::new_v4(),
            raw_answer_text: answer.to_string(),
            expected_answer: expected.as_text(),
            max_score,
            grading_mode: mode,
            score: result.score,
            explanation: result.explanation.clone(),
            graded_at: jiff::Timestamp::now(),
        };
        match save_state(&self.bucket, &store_keys::quick_grade(entry.id), &entry).await {
            Ok(_) => info!(
                id = %entry.id,
                mode = %mode,
                score = entry.score,
                max_score,
                "quick grade"
            ),
            Err(e) => warn!(id = %entry.id, error = %e, "failed to log quick grade"),
        }

        Ok(result)
    }

    pub async fn count(&self) -> Result<usize, ClassroomError> {
        Ok(objects::list_objects(&self.bucket, store_keys::QUICK_GRADES_PREFIX)
            .await?
            .len())
    }
}

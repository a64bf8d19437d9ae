use markwise_core::models::assignment::{Assignment, AssignmentCode};
use markwise_core::models::grade::GradeFlag;
use markwise_core::models::submission::Submission;
use uuid::Uuid;

use crate::error::ClassroomError;
use crate::ledger::SubmissionLedger;
use crate::registry::AssignmentRegistry;

#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentStats {
    pub code: AssignmentCode,
    pub title: String,
    pub submissions: usize,
    pub average_score: Option<f64>,
    pub average_percent: Option<f64>,
    /// Attempts still flagged for a teacher to look at.
    pub pending_review: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeacherSummary {
    pub assignments: Vec<AssignmentStats>,
    pub total_submissions: usize,
    pub overall_average_percent: Option<f64>,
}

pub fn stats_for(assignment: &Assignment, submissions: &[Submission]) -> AssignmentStats {
    let n = submissions.len();
    let (average_score, average_percent) = if n == 0 {
        (None, None)
    } else {
        let total: f64 = submissions.iter().map(|s| f64::from(s.score)).sum();
        let pct: f64 = submissions.iter().map(percent).sum();
        (Some(total / n as f64), Some(pct / n as f64))
    };

    AssignmentStats {
        code: assignment.code.clone(),
        title: assignment.title.clone(),
        submissions: n,
        average_score,
        average_percent,
        pending_review: submissions
            .iter()
            .filter(|s| {
                matches!(
                    s.flag,
                    Some(GradeFlag::ManualReview | GradeFlag::SimilarityUnavailable)
                )
            })
            .count(),
    }
}

/// Per-assignment results for one teacher, most recent assignment first.
pub async fn summarize(
    registry: &AssignmentRegistry,
    ledger: &SubmissionLedger,
    teacher_id: Uuid,
) -> Result<TeacherSummary, ClassroomError> {
    let mut assignments = Vec::new();
    let mut total_submissions = 0;
    let mut pct_sum = 0.0;

    for assignment in registry.list_for_owner(teacher_id).await? {
        let submissions = ledger.submissions_for(&assignment.code).await?;
        total_submissions += submissions.len();
        pct_sum += submissions.iter().map(percent).sum::<f64>();
        assignments.push(stats_for(&assignment, &submissions));
    }

    let overall_average_percent = if total_submissions == 0 {
        None
    } else {
        Some(pct_sum / total_submissions as f64)
    };

    Ok(TeacherSummary {
        assignments,
        total_submissions,
        overall_average_percent,
    })
}

fn percent(submission: &Submission) -> f64 {
    if submission.max_score == 0 {
        return 0.0;
    }
    f64::from(submission.score) * 100.0 / f64::from(submission.max_score)
}

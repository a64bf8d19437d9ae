use std::sync::Arc;

use markwise_classroom::analytics::{stats_for, summarize};
use markwise_classroom::{
    AssignmentRegistry, ClassroomError, NewAssignment, QuickGradeLog, ResubmissionPolicy,
    SubmissionLedger,
};
use markwise_core::models::assignment::ExpectedAnswer;
use markwise_core::models::grading_mode::GradingMode;
use markwise_grading::TokenCosineSimilarity;
use markwise_storage::{Bucket, RetryPolicy};
use uuid::Uuid;

async fn bucket() -> (tempfile::TempDir, Arc<Bucket>) {
    let dir = tempfile::tempdir().unwrap();
    let bucket = Bucket::open(dir.path(), RetryPolicy::default())
        .await
        .unwrap();
    (dir, Arc::new(bucket))
}

#[tokio::test]
async fn quick_grade_scores_and_logs() {
    let (_dir, bucket) = bucket().await;
    let log = QuickGradeLog::new(bucket, Arc::new(TokenCosineSimilarity));

    let expected = "plants sunlight glucose energy";
    let g = log
        .grade("plants use sunlight", expected, 8, GradingMode::Keyword)
        .await
        .unwrap();
    assert_eq!(g.score, 4);

    let g = log.grade("Paris", "paris", 3, GradingMode::Exact).await;
    assert_eq!(g.unwrap().score, 3);

    assert_eq!(log.count().await.unwrap(), 2);
}

#[tokio::test]
async fn quick_grade_rejects_bad_inputs() {
    let (_dir, bucket) = bucket().await;
    let log = QuickGradeLog::new(bucket, Arc::new(TokenCosineSimilarity));

    let err = log.grade("a", "b", 0, GradingMode::Exact).await;
    assert!(matches!(
        err.err().unwrap(),
        ClassroomError::InvalidMaxScore(0)
    ));
    let err = log.grade("a", "   ", 5, GradingMode::Keyword).await;
    assert!(matches!(err.err().unwrap(), ClassroomError::Core(_)));
    assert_eq!(log.count().await.unwrap(), 0);
}

#[tokio::test]
async fn summary_averages_per_assignment_and_overall() {
    let (_dir, bucket) = bucket().await;
    let registry = AssignmentRegistry::new(bucket.clone());
    let similarity = Arc::new(TokenCosineSimilarity);
    let ledger = SubmissionLedger::new(bucket, similarity, ResubmissionPolicy::Reject);
    let teacher = Uuid::new_v4();

    let draft = |q: &str, max_score| NewAssignment {
        title: q.to_string(),
        question_text: q.to_string(),
        expected: ExpectedAnswer::Canonical("4".into()),
        grading_mode: GradingMode::Exact,
        max_score,
        deadline: None,
        required_fields: Vec::new(),
    };
    let a = registry.create(teacher, draft("a", 10)).await.unwrap();
    let b = registry.create(teacher, draft("b", 4)).await.unwrap();
    let empty = registry.create(teacher, draft("c", 1)).await.unwrap();

    ledger.record(a.code.as_str(), "s1", "4").await.unwrap();
    ledger.record(a.code.as_str(), "s2", "5").await.unwrap();
    ledger.record(b.code.as_str(), "s1", "4").await.unwrap();

    let summary = summarize(&registry, &ledger, teacher).await.unwrap();
    assert_eq!(summary.total_submissions, 3);
    assert_eq!(summary.assignments.len(), 3);

    // most recent first
    assert_eq!(summary.assignments[0].code, empty.code);
    assert_eq!(summary.assignments[0].average_score, None);

    let b_stats = &summary.assignments[1];
    assert_eq!(b_stats.submissions, 1);
    assert_eq!(b_stats.average_percent, Some(100.0));

    let a_stats = &summary.assignments[2];
    assert_eq!(a_stats.average_score, Some(5.0));
    assert_eq!(a_stats.average_percent, Some(50.0));

    let overall = summary.overall_average_percent.unwrap();
    assert!((overall - 200.0 / 3.0).abs() < 1e-9);

    let direct = stats_for(&a, &ledger.submissions_for(&a.code).await.unwrap());
    assert_eq!(&direct, a_stats);
}

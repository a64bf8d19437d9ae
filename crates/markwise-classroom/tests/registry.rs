use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use markwise_classroom::codes::CodeSource;
use markwise_classroom::{AssignmentRegistry, ClassroomError, NewAssignment};
use markwise_core::models::assignment::{Assignment, ExpectedAnswer};
use markwise_core::models::grading_mode::GradingMode;
use markwise_core::models::student_details::StudentField;
use markwise_storage::{Bucket, RetryPolicy};
use uuid::Uuid;

async fn bucket() -> (tempfile::TempDir, Arc<Bucket>) {
    let dir = tempfile::tempdir().unwrap();
    let bucket = Bucket::open(dir.path(), RetryPolicy::default())
        .await
        .unwrap();
    (dir, Arc::new(bucket))
}

fn draft(question: &str, expected: &str, mode: GradingMode) -> NewAssignment {
    NewAssignment {
        title: format!("About {question}"),
        question_text: question.to_string(),
        expected: ExpectedAnswer::from_input(mode, expected).unwrap(),
        grading_mode: mode,
        max_score: 10,
        deadline: None,
        required_fields: Vec::new(),
    }
}

async fn exact(registry: &AssignmentRegistry, owner: Uuid, question: &str) -> Assignment {
    let draft = draft(question, "x", GradingMode::Exact);
    registry.create(owner, draft).await.unwrap()
}

/// Replays a fixed list of candidate codes.
struct Scripted(Mutex<Vec<&'static str>>);

impl CodeSource for Scripted {
    fn next_code(&self) -> String {
        self.0.lock().unwrap().remove(0).to_string()
    }
}

#[tokio::test]
async fn lookup_is_case_insensitive() {
    let (_dir, bucket) = bucket().await;
    let registry = AssignmentRegistry::new(bucket);
    let owner = Uuid::new_v4();

    let created = registry
        .create(owner, draft("2+2", "4", GradingMode::Exact))
        .await
        .unwrap();
    let code = created.code.as_str().to_string();
    assert_eq!(code.len(), 8);
    assert_eq!(code, code.to_uppercase());

    let typed = format!(" {} ", code.to_lowercase());
    let found = registry.lookup(&typed).await.unwrap();
    assert_eq!(found.code, created.code);
    assert_eq!(found.question_text, "2+2");
}

#[tokio::test]
async fn unknown_or_malformed_codes_are_not_found() {
    let (_dir, bucket) = bucket().await;
    let registry = AssignmentRegistry::new(bucket);

    for code in ["ABCD1234", "short", "../../etc", ""] {
        let err = registry.lookup(code).await.err().unwrap();
        assert!(matches!(err, ClassroomError::NotFound { .. }), "{code:?}");
    }
}

#[tokio::test]
async fn collisions_draw_again() {
    let (_dir, bucket) = bucket().await;
    let script = vec!["AAAA0000", "AAAA0000", "AAAA0000", "BBBB1111"];
    let codes = Scripted(Mutex::new(script));
    let registry = AssignmentRegistry::with_code_source(bucket, Box::new(codes));
    let owner = Uuid::new_v4();

    let first = exact(&registry, owner, "q1").await;
    let second = exact(&registry, owner, "q2").await;

    assert_eq!(first.code.as_str(), "AAAA0000");
    assert_eq!(second.code.as_str(), "BBBB1111");
    assert_eq!(
        registry.lookup("AAAA0000").await.unwrap().question_text,
        "q1"
    );
}

#[tokio::test]
async fn ten_thousand_assignments_get_distinct_codes() {
    let (_dir, bucket) = bucket().await;
    let registry = AssignmentRegistry::new(bucket);

    let mut seen = HashSet::new();
    for i in 0..10_000 {
        let a = exact(&registry, Uuid::new_v4(), &format!("q{i}")).await;
        assert!(seen.insert(a.code), "duplicate code at {i}");
    }
    assert_eq!(registry.count().await.unwrap(), 10_000);
}

#[tokio::test]
async fn list_for_owner_is_most_recent_first_and_scoped() {
    let (_dir, bucket) = bucket().await;
    let registry = AssignmentRegistry::new(bucket);
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    for q in ["first", "second", "third"] {
        exact(&registry, alice, q).await;
    }
    exact(&registry, bob, "bob's").await;

    let questions: Vec<String> = registry
        .list_for_owner(alice)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.question_text)
        .collect();
    assert_eq!(questions, vec!["third", "second", "first"]);

    let stranger = registry.list_for_owner(Uuid::new_v4()).await.unwrap();
    assert!(stranger.is_empty());
}

#[tokio::test]
async fn rejects_bad_drafts() {
    let (_dir, bucket) = bucket().await;
    let registry = AssignmentRegistry::new(bucket);
    let owner = Uuid::new_v4();

    let mut zero = draft("q", "x", GradingMode::Exact);
    zero.max_score = 0;
    assert!(matches!(
        registry.create(owner, zero).await.err().unwrap(),
        ClassroomError::InvalidMaxScore(0)
    ));

    let mut no_keywords = draft("q", "x", GradingMode::Keyword);
    no_keywords.expected = ExpectedAnswer::Keywords(vec![]);
    assert!(matches!(
        registry.create(owner, no_keywords).await.err().unwrap(),
        ClassroomError::MalformedAssignment(_)
    ));

    let mut past = draft("q", "x", GradingMode::Exact);
    past.deadline = Some(jiff::Timestamp::UNIX_EPOCH);
    assert!(matches!(
        registry.create(owner, past).await.err().unwrap(),
        ClassroomError::InvalidInput(_)
    ));
}

#[tokio::test]
async fn only_the_owner_can_toggle() {
    let (_dir, bucket) = bucket().await;
    let registry = AssignmentRegistry::new(bucket);
    let owner = Uuid::new_v4();
    let a = exact(&registry, owner, "q").await;

    let err = registry
        .set_active(Uuid::new_v4(), a.code.as_str(), false)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, ClassroomError::NotOwner { .. }));

    let toggled = registry.set_active(owner, a.code.as_str(), false).await;
    assert!(!toggled.unwrap().active);

    let err = registry
        .lookup_open(a.code.as_str(), jiff::Timestamp::now())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, ClassroomError::Closed { .. }));
}

#[tokio::test]
async fn required_fields_are_kept_in_order_without_repeats() {
    let (_dir, bucket) = bucket().await;
    let registry = AssignmentRegistry::new(bucket);

    let mut quiz = draft("q", "x", GradingMode::Exact);
    quiz.required_fields = vec![
        StudentField::Phone,
        StudentField::Name,
        StudentField::Phone,
    ];
    let a = registry.create(Uuid::new_v4(), quiz).await.unwrap();
    let expected = vec![StudentField::Phone, StudentField::Name];
    assert_eq!(a.required_fields, expected);

    let found = registry.lookup(a.code.as_str()).await.unwrap();
    assert_eq!(found.required_fields, expected);
    assert!(!found.sealed);
}

#[tokio::test]
async fn delete_is_owner_only_and_clears_the_listing() {
    let (_dir, bucket) = bucket().await;
    let registry = AssignmentRegistry::new(bucket);
    let owner = Uuid::new_v4();
    let gone = exact(&registry, owner, "gone").await;
    let kept = exact(&registry, owner, "kept").await;
    let code = gone.code.as_str();

    let err = registry.delete(Uuid::new_v4(), code).await.err().unwrap();
    assert!(matches!(err, ClassroomError::NotOwner { .. }));
    assert!(registry.lookup(code).await.is_ok());

    assert_eq!(registry.delete(owner, code).await.unwrap(), 0);

    let err = registry.lookup(code).await.err().unwrap();
    assert!(matches!(err, ClassroomError::NotFound { .. }));
    let err = registry.delete(owner, code).await.err().unwrap();
    assert!(matches!(err, ClassroomError::NotFound { .. }));

    let listed = registry.list_for_owner(owner).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].code, kept.code);
    assert_eq!(registry.count().await.unwrap(), 1);
}

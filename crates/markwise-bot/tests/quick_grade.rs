mod common;

use common::Harness;
use markwise_bot::session::{Draft, QuickGradeStep, Stage};

#[tokio::test]
async fn quick_grade_walks_expected_answer_then_score() {
    let h = Harness::new().await;
    h.text("q", "/start").await;
    let modes = h.press("q", "quick_grade").await;
    assert!(modes.has_button("qg:keyword"));
    assert!(!modes.has_button("qg:manual"));

    h.press("q", "qg:keyword").await;
    assert_eq!(
        h.session("q").await.stage,
        Stage::QuickGradeAwaitingInputs(QuickGradeStep::Expected)
    );
    h.text("q", "plants sunlight glucose energy").await;
    h.text("q", "plants use sunlight to make glucose").await;
    let reply = h.text("q", "100").await;

    assert!(reply.text.contains("75/100"), "{}", reply.text);
    let session = h.session("q").await;
    assert_eq!(session.stage, Stage::Idle);
    assert_eq!(session.draft, Draft::Empty);
}

#[tokio::test]
async fn quick_grade_rejects_label_strings_as_button_ids() {
    let h = Harness::new().await;
    h.text("q", "/start").await;
    h.press("q", "quick_grade").await;

    let reply = h.press("q", "qg:Exact Match").await;
    assert!(reply.text.starts_with("Sorry"));
    assert_eq!(h.session("q").await.stage, Stage::QuickGradeModeChoice);

    // Typed labels go through the label table.
    h.text("q", "Exact Match").await;
    assert_eq!(
        h.session("q").await.stage,
        Stage::QuickGradeAwaitingInputs(QuickGradeStep::Expected)
    );
}

#[tokio::test]
async fn bad_max_score_is_reprompted() {
    let h = Harness::new().await;
    h.text("q", "/start").await;
    h.press("q", "quick_grade").await;
    h.press("q", "qg:exact").await;
    h.text("q", "4").await;
    h.text("q", "4").await;

    let before = h.session("q").await;
    let reply = h.text("q", "zero").await;
    assert!(reply.text.contains("whole number"));
    assert_eq!(h.session("q").await.draft, before.draft);

    let reply = h.text("q", "3").await;
    assert!(reply.text.contains("3/3"));
}

#[tokio::test]
async fn teachers_keep_their_sign_in_through_quick_grade() {
    let h = Harness::new().await;
    h.register_teacher("t", "t@school.edu").await;
    h.press("t", "quick_grade").await;
    h.press("t", "qg:exact").await;
    h.text("t", "x").await;
    h.text("t", "x").await;
    h.text("t", "1").await;

    let reply = h.press("t", "menu").await;
    assert!(reply.has_button("create_assignment"));
}

#[tokio::test]
async fn sessions_serialize_with_named_stages() {
    let h = Harness::new().await;
    h.text("q", "/start").await;
    h.press("q", "quick_grade").await;
    h.press("q", "qg:semantic").await;

    let json = serde_json::to_value(h.session("q").await).unwrap();
    assert_eq!(json["stage"]["name"], "quick_grade_awaiting_inputs");
    assert_eq!(json["stage"]["step"], "expected");
    assert_eq!(json["draft"]["kind"], "quick_grade");
    assert_eq!(json["draft"]["mode"], "semantic");
}

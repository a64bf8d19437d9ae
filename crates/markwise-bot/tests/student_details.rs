mod common;

use common::{Harness, code_in};
use markwise_bot::session::{AuthoringStep, Draft, Stage};
use markwise_core::models::student_details::StudentField;

/// Author an exact "2+2" assignment that asks for a name and an email.
async fn publish_with_details(h: &Harness) -> String {
    h.press("t", "create_assignment").await;
    h.text("t", "Arithmetic").await;
    h.text("t", "2+2").await;
    h.press("t", "mode:Exact Match").await;
    h.text("t", "4").await;
    h.text("t", "10").await;
    h.press("t", "field:name").await;
    h.text("t", "Email").await;
    h.press("t", "fields_done").await;
    let reply = h.press("t", "no_deadline").await;
    code_in(&reply.text)
}

async fn open_assignment(h: &Harness, who: &str, code: &str) -> markwise_bot::Reply {
    h.text(who, "/start").await;
    h.press(who, "student").await;
    h.text(who, code).await
}

#[tokio::test]
async fn authoring_offers_each_field_once() {
    let h = Harness::new().await;
    h.register_teacher("t", "t@school.edu").await;
    h.press("t", "create_assignment").await;
    for input in ["Title", "Q"] {
        h.text("t", input).await;
    }
    h.press("t", "mode:Exact Match").await;
    h.text("t", "4").await;

    let reply = h.text("t", "10").await;
    let stage = h.session("t").await.stage;
    assert_eq!(stage, Stage::AssignmentAuthoring(AuthoringStep::Fields));
    for field in StudentField::ALL {
        let id = format!("field:{}", field.as_str());
        assert!(reply.has_button(&id), "missing {id}");
    }
    assert!(reply.has_button("fields_done"));

    let reply = h.press("t", "field:class_grade").await;
    assert!(
        reply.text.contains("Selected: Class/Grade"),
        "{}",
        reply.text
    );
    assert!(!reply.has_button("field:class_grade"));

    let reply = h.text("t", "registration number").await;
    let text = &reply.text;
    assert!(
        text.contains("Selected: Class/Grade, Registration Number"),
        "{text}"
    );

    let reply = h.text("t", "favourite colour").await;
    assert!(reply.text.starts_with("Sorry"), "{}", reply.text);
    let Draft::Assignment(draft) = h.session("t").await.draft else {
        panic!("authoring draft lost");
    };
    let expected = [StudentField::ClassGrade, StudentField::RegistrationNumber];
    assert_eq!(draft.required_fields, expected);

    h.text("t", "done").await;
    let stage = h.session("t").await.stage;
    assert_eq!(stage, Stage::AssignmentAuthoring(AuthoringStep::Deadline));
}

#[tokio::test]
async fn published_assignment_lists_its_required_details() {
    let h = Harness::new().await;
    h.register_teacher("t", "t@school.edu").await;
    let code = publish_with_details(&h).await;

    let stored = h.registry().lookup(&code).await.unwrap();
    let expected = [StudentField::Name, StudentField::Email];
    assert_eq!(stored.required_fields, expected);

    let details = h.press("t", &format!("view:{code}")).await;
    let text = &details.text;
    assert!(text.contains("Student details: Name, Email"), "{text}");
}

#[tokio::test]
async fn students_give_details_before_answering() {
    let h = Harness::new().await;
    h.register_teacher("t", "t@school.edu").await;
    let code = publish_with_details(&h).await;

    let reply = open_assignment(&h, "s", &code).await;
    assert!(reply.text.contains("Before you answer"), "{}", reply.text);
    assert!(reply.text.contains("Detail 1/2: enter your Name."));
    assert_eq!(h.session("s").await.stage, Stage::StudentDetails);

    let reply = h.text("s", "   ").await;
    assert!(
        reply.text.contains("Name must not be empty."),
        "{}",
        reply.text
    );
    assert!(reply.text.contains("Detail 1/2"));

    let reply = h.text("s", "  Ada Lovelace ").await;
    assert!(reply.text.starts_with("Saved."), "{}", reply.text);
    assert!(reply.text.contains("Detail 2/2: enter your Email."));

    let reply = h.text("s", "not-an-email").await;
    assert!(
        reply.text.contains("not a valid email address"),
        "{}",
        reply.text
    );
    let session = h.session("s").await;
    assert_eq!(session.stage, Stage::StudentDetails);
    let Draft::Answering(draft) = &session.draft else {
        panic!("answering draft lost");
    };
    assert_eq!(draft.details.len(), 1);
    assert_eq!(draft.details[0].value, "Ada Lovelace");

    let reply = h.text("s", "ada@school.edu").await;
    assert!(reply.text.contains("Type your answer."), "{}", reply.text);
    assert_eq!(h.session("s").await.stage, Stage::StudentAnswering);

    let reply = h.text("s", "4").await;
    assert!(reply.text.contains("10/10"), "{}", reply.text);

    let subs = h.press("t", &format!("subs:{code}")).await;
    let text = &subs.text;
    let details = "Details: Name: Ada Lovelace, Email: ada@school.edu";
    assert!(text.contains(details), "{text}");
}

#[tokio::test]
async fn back_from_details_starts_over() {
    let h = Harness::new().await;
    h.register_teacher("t", "t@school.edu").await;
    let code = publish_with_details(&h).await;

    open_assignment(&h, "s", &code).await;
    h.text("s", "Ada").await;
    let reply = h.press("s", "back").await;
    assert!(reply.text.contains("assignment code"), "{}", reply.text);
    let session = h.session("s").await;
    assert_eq!(session.stage, Stage::StudentFindAssignment);
    assert_eq!(session.draft, Draft::Empty);

    let reply = h.text("s", &code).await;
    assert!(reply.text.contains("Detail 1/2"), "{}", reply.text);
}

#[tokio::test]
async fn assignments_without_required_details_go_straight_to_the_answer() {
    let h = Harness::new().await;
    h.register_teacher("t", "t@school.edu").await;
    let code = h.two_plus_two("t").await;

    let reply = open_assignment(&h, "s", &code).await;
    assert!(!reply.text.contains("Before you answer"), "{}", reply.text);
    assert_eq!(h.session("s").await.stage, Stage::StudentAnswering);
}

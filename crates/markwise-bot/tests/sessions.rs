mod common;

use std::time::Duration;

use common::Harness;
use markwise_bot::Event;
use markwise_bot::session::{AuthoringStep, Draft, Stage};
use markwise_core::models::student_details::StudentField;
use tokio::time::timeout;

const SESSION_TROUBLE: [&str; 2] = ["can't reach your session", "could not be saved"];

#[tokio::test]
async fn a_held_session_blocks_only_its_own_participant() {
    let h = Harness::new().await;
    let guard = h.bot.sessions().lock("p").await;

    let blocked = timeout(Duration::from_millis(200), h.text("p", "/start")).await;
    assert!(blocked.is_err(), "p was handled while its session was held");

    let other = timeout(Duration::from_secs(5), h.text("q", "/start")).await;
    let reply = other.expect("q waited on p's lock");
    assert!(reply.has_button("student"));
    assert_eq!(h.session("q").await.stage, Stage::AwaitingModeChoice);

    let bot = h.bot.clone();
    let event = Event::text("/start");
    let pending = tokio::spawn(async move { bot.handle("p", event).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!pending.is_finished());
    assert_eq!(h.session("p").await.stage, Stage::Idle);

    drop(guard);
    let reply = timeout(Duration::from_secs(5), pending)
        .await
        .expect("p stayed blocked after release")
        .unwrap();
    assert!(reply.has_button("student"));
    assert_eq!(h.session("p").await.stage, Stage::AwaitingModeChoice);
}

#[tokio::test]
async fn concurrent_events_for_one_participant_are_all_applied() {
    let h = Harness::new().await;
    h.register_teacher("t", "t@school.edu").await;
    h.press("t", "create_assignment").await;
    for input in ["Title", "Q"] {
        h.text("t", input).await;
    }
    h.press("t", "mode:Exact Match").await;
    h.text("t", "4").await;
    h.text("t", "10").await;

    // Every press adds one field to the same draft. A lost update would
    // drop a field.
    let mut handles = Vec::new();
    for field in StudentField::ALL {
        let bot = h.bot.clone();
        let event = Event::button(format!("field:{}", field.as_str()));
        handles.push(tokio::spawn(async move { bot.handle("t", event).await }));
    }
    for handle in handles {
        let reply = handle.await.unwrap();
        for trouble in SESSION_TROUBLE {
            assert!(!reply.text.contains(trouble), "{}", reply.text);
        }
    }

    let session = h.session("t").await;
    assert_eq!(
        session.stage,
        Stage::AssignmentAuthoring(AuthoringStep::Fields)
    );
    let Draft::Assignment(draft) = session.draft else {
        panic!("authoring draft lost");
    };
    assert_eq!(draft.required_fields.len(), StudentField::ALL.len());
    for field in StudentField::ALL {
        assert!(draft.required_fields.contains(&field), "{field} missing");
    }
}

#[tokio::test]
async fn long_participant_ids_keep_their_sessions() {
    let h = Harness::new().await;
    let ids = [
        "é".repeat(128),
        "+".repeat(90),
        "a".repeat(256),
        format!("{}a", "é".repeat(127)),
        format!("{}b", "é".repeat(127)),
    ];

    for id in &ids {
        assert!(id.len() <= 256);
        let reply = h.text(id, "/start").await;
        for trouble in SESSION_TROUBLE {
            assert!(!reply.text.contains(trouble), "{}", reply.text);
        }
        assert!(reply.has_button("student"));
        assert_eq!(h.session(id).await.stage, Stage::AwaitingModeChoice);
    }

    // Ids sharing a long prefix must not share a session.
    h.press(&ids[3], "student").await;
    assert_eq!(h.session(&ids[3]).await.stage, Stage::StudentFindAssignment);
    assert_eq!(h.session(&ids[4]).await.stage, Stage::AwaitingModeChoice);
}

#[tokio::test]
async fn long_participant_ids_can_submit() {
    let h = Harness::new().await;
    h.register_teacher("t", "t@school.edu").await;
    let code = h.two_plus_two("t").await;

    let student = "ü".repeat(128);
    let reply = h.submit(&student, &code, "4").await;
    assert!(reply.text.contains("10/10"), "{}", reply.text);

    let subs = h.press("t", &format!("subs:{code}")).await;
    assert!(subs.text.contains(&student));
    assert!(subs.text.contains(&format!("Submissions for {code} (1)")));
}

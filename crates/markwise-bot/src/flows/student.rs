use markwise_auth::identity::is_plausible_email;
use markwise_classroom::{ClassroomError, ResubmissionPolicy};
use markwise_core::deadline::format_deadline;
use markwise_core::models::assignment::Assignment;
use markwise_core::models::grade::score_badge;
use markwise_core::models::student_details::{StudentDetail, StudentField};

use super::{Outcome, draft_missing, menu_button, mismatch, non_empty, prompt, text_of};
use crate::bot::Bot;
use crate::error::FlowError;
use crate::event::{Button, Event, Reply};
use crate::session::{AnsweringDraft, Draft, SessionState, Stage};

pub(super) async fn on_find(
    bot: &Bot,
    state: &SessionState,
    event: &Event,
) -> Result<Outcome, FlowError> {
    let code = non_empty(text_of(state, event)?, "Code")?;
    let now = jiff::Timestamp::now();
    let assignment = bot.registry.lookup_open(code, now).await?;

    let participant = state.participant_id.as_str();
    if bot.ledger.policy() == ResubmissionPolicy::Reject
        && let Some(previous) = bot.ledger.find(&assignment.code, participant).await?
    {
        let reply = prompt(bot, state).prefixed(&format!(
            "You already submitted to {}: {}\n{}",
            assignment.code,
            score_badge(previous.score, previous.max_score),
            previous.explanation
        ));
        return Ok(Outcome::to(state.clone(), reply));
    }

    let mut text = question_text(bot, &assignment);
    let draft = AnsweringDraft::new(assignment.code, assignment.required_fields);
    let stage = if draft.next_field().is_some() {
        text.push_str("\n\nBefore you answer, your teacher needs a few details.");
        Stage::StudentDetails
    } else {
        Stage::StudentAnswering
    };

    let next = state.moved_to(stage, Draft::Answering(draft));
    let reply = prompt(bot, &next).prefixed(&text);
    Ok(Outcome::to(next, reply))
}

/// One required detail per message, in the order the teacher chose.
pub(super) fn on_details(
    bot: &Bot,
    state: &SessionState,
    event: &Event,
) -> Result<Outcome, FlowError> {
    let Draft::Answering(draft) = &state.draft else {
        return Err(draft_missing(state));
    };
    let Some(field) = draft.next_field() else {
        return Err(draft_missing(state));
    };

    let value = match event {
        Event::Button { id } if id == "back" => return Ok(back_to_find(bot, state)),
        Event::Button { .. } => return Err(mismatch(state)),
        Event::Text { body } => non_empty(body.trim(), field.label())?,
    };
    if field == StudentField::Email && !is_plausible_email(value) {
        return Err(FlowError::InvalidInput(format!(
            "'{value}' is not a valid email address."
        )));
    }

    let mut draft = draft.clone();
    draft.details.push(StudentDetail::new(field, value));
    let stage = match draft.next_field() {
        Some(_) => Stage::StudentDetails,
        None => Stage::StudentAnswering,
    };

    let next = state.moved_to(stage, Draft::Answering(draft));
    let reply = prompt(bot, &next).prefixed("Saved.");
    Ok(Outcome::to(next, reply))
}

pub(super) async fn on_answer(
    bot: &Bot,
    state: &SessionState,
    event: &Event,
) -> Result<Outcome, FlowError> {
    let Draft::Answering(draft) = &state.draft else {
        return Err(draft_missing(state));
    };

    let answer = match event {
        Event::Button { id } if id == "back" => return Ok(back_to_find(bot, state)),
        Event::Button { .. } => return Err(mismatch(state)),
        Event::Text { body } => non_empty(body.trim(), "Your answer")?,
    };

    let done = state.moved_to(Stage::Idle, Draft::Empty);
    let back_to_menu = vec![menu_button()];

    let code = draft.code.as_str();
    let participant = state.participant_id.as_str();
    let recorded = bot
        .ledger
        .record_with_details(code, participant, answer, &draft.details)
        .await;
    match recorded {
        Ok(submission) => {
            let text = format!(
                "Submitted to {}.\n\nScore: {}\n{}",
                submission.assignment_code,
                score_badge(submission.score, submission.max_score),
                submission.explanation
            );
            let reply = Reply::text(text).with_buttons(back_to_menu);
            Ok(Outcome::to(done, reply))
        }
        // The attempt can't go through no matter what is typed next, so
        // finish the flow instead of re-prompting.
        Err(e) if ends_attempt(&e) => {
            let reply = Reply::text(e.to_string()).with_buttons(back_to_menu);
            Ok(Outcome::to(done, reply))
        }
        Err(e) => Err(e.into()),
    }
}

pub(super) fn details_prompt(state: &SessionState) -> Reply {
    let buttons = vec![Button::new("back", "Different code"), menu_button()];
    let Draft::Answering(draft) = &state.draft else {
        return Reply::text("Enter the requested detail.").with_buttons(buttons);
    };
    let Some(field) = draft.next_field() else {
        return Reply::text("Type your answer.").with_buttons(buttons);
    };

    let position = draft.details.len() + 1;
    let total = draft.required.len();
    let label = field.label();
    let text = format!("Detail {position}/{total}: enter your {label}.");
    Reply::text(text).with_buttons(buttons)
}

fn question_text(bot: &Bot, assignment: &Assignment) -> String {
    let mut text = format!(
        "{}\n\n{}\n\nMax score: {}",
        assignment.title, assignment.question_text, assignment.max_score
    );
    if let Some(deadline) = assignment.deadline {
        let deadline = format_deadline(deadline, &bot.config.locale);
        text.push_str(&format!("\nDeadline: {deadline}"));
    }
    text
}

fn back_to_find(bot: &Bot, state: &SessionState) -> Outcome {
    let next = state.moved_to(Stage::StudentFindAssignment, Draft::Empty);
    let reply = prompt(bot, &next);
    Outcome::to(next, reply)
}

fn ends_attempt(err: &ClassroomError) -> bool {
    matches!(
        err,
        ClassroomError::AlreadySubmitted { .. }
            | ClassroomError::Closed { .. }
            | ClassroomError::NotFound { .. }
    )
}

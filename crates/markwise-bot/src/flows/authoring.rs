use markwise_classroom::NewAssignment;
use markwise_core::deadline::{format_deadline, parse_deadline};
use markwise_core::models::assignment::ExpectedAnswer;
use markwise_core::models::grading_mode::GradingMode;
use markwise_core::models::student_details::{StudentField, describe_fields};
use markwise_grading::engine::keyword_set;
use tracing::warn;
use uuid::Uuid;

use super::{
    Outcome, authoring_mode_buttons, draft_missing, go_home, mismatch, non_empty,
    parse_max_score, prompt,
};
use crate::bot::Bot;
use crate::error::FlowError;
use crate::event::{Button, Event, Reply};
use crate::session::{AssignmentDraft, AuthoringStep, Draft, SessionState, Stage};

pub(super) async fn on_event(
    bot: &Bot,
    state: &SessionState,
    step: AuthoringStep,
    event: &Event,
) -> Result<Outcome, FlowError> {
    let teacher = state.teacher.as_ref().ok_or(FlowError::NotSignedIn)?;
    let teacher_id = teacher.id;

    if matches!(event, Event::Button { id } if id == "dashboard") {
        return Ok(go_home(bot, state, "Assignment discarded."));
    }

    let Draft::Assignment(draft) = &state.draft else {
        return Err(draft_missing(state));
    };
    let mut draft = draft.clone();

    let next_step = match (step, event) {
        (AuthoringStep::Title, Event::Text { body }) => {
            draft.title = Some(non_empty(body.trim(), "Title")?.to_string());
            AuthoringStep::Question
        }
        (AuthoringStep::Question, Event::Text { body }) => {
            draft.question = Some(non_empty(body.trim(), "Question")?.to_string());
            AuthoringStep::Mode
        }
        (AuthoringStep::Mode, Event::Button { id }) => {
            let Some(label) = id.strip_prefix("mode:") else {
                return Err(mismatch(state));
            };
            draft.mode = Some(mode_for_button_label(label));
            AuthoringStep::Expected
        }
        (AuthoringStep::Mode, Event::Text { body }) => {
            // Typed labels go through the same table but are not defaulted.
            let Some(mode) = GradingMode::lookup_label(body.trim()) else {
                return Err(mismatch(state));
            };
            draft.mode = Some(mode);
            AuthoringStep::Expected
        }
        (AuthoringStep::Expected, Event::Text { body }) => {
            let mode = draft.mode.ok_or_else(|| draft_missing(state))?;
            let expected = ExpectedAnswer::from_input(mode, body)?;
            if mode == GradingMode::Keyword && keyword_set(&expected).is_empty() {
                return Err(FlowError::InvalidInput(
                    "Enter at least one keyword.".to_string(),
                ));
            }
            draft.expected = Some(body.trim().to_string());
            AuthoringStep::MaxScore
        }
        (AuthoringStep::MaxScore, Event::Text { body }) => {
            draft.max_score = Some(parse_max_score(body.trim())?);
            AuthoringStep::Fields
        }
        (AuthoringStep::Fields, Event::Button { id }) if id == "fields_done" => {
            AuthoringStep::Deadline
        }
        (AuthoringStep::Fields, Event::Button { id }) => {
            let field = id.strip_prefix("field:").and_then(StudentField::parse);
            let Some(field) = field else {
                return Err(mismatch(state));
            };
            add_field(&mut draft, field);
            AuthoringStep::Fields
        }
        (AuthoringStep::Fields, Event::Text { body }) => {
            let text = body.trim();
            if is_skip(text) || text.eq_ignore_ascii_case("done") {
                AuthoringStep::Deadline
            } else {
                let Some(field) = StudentField::parse(text) else {
                    return Err(mismatch(state));
                };
                add_field(&mut draft, field);
                AuthoringStep::Fields
            }
        }
        (AuthoringStep::Deadline, Event::Button { id }) if id == "no_deadline" => {
            return publish(bot, state, teacher_id, &draft, None).await;
        }
        (AuthoringStep::Deadline, Event::Text { body }) => {
            let text = body.trim();
            if is_skip(text) {
                return publish(bot, state, teacher_id, &draft, None).await;
            }
            let deadline = parse_deadline(text)?;
            if deadline <= jiff::Timestamp::now() {
                return Err(FlowError::InvalidInput(
                    "The deadline must be in the future.".to_string(),
                ));
            }
            return publish(bot, state, teacher_id, &draft, Some(deadline)).await;
        }
        _ => return Err(mismatch(state)),
    };

    let stage = Stage::AssignmentAuthoring(next_step);
    let next = state.moved_to(stage, Draft::Assignment(draft));
    let reply = prompt(bot, &next);
    Ok(Outcome::to(next, reply))
}

/// Button ids carry the label shown on the button. Unknown labels fall back
/// to manual grading rather than silently scoring everything zero.
fn mode_for_button_label(label: &str) -> GradingMode {
    match GradingMode::lookup_label(label) {
        Some(mode) => mode,
        None => {
            warn!(
                label,
                "unrecognized grading mode label, defaulting to manual"
            );
            GradingMode::from_label(label)
        }
    }
}

fn add_field(draft: &mut AssignmentDraft, field: StudentField) {
    if !draft.required_fields.contains(&field) {
        draft.required_fields.push(field);
    }
}

fn is_skip(text: &str) -> bool {
    text.eq_ignore_ascii_case("none") || text.eq_ignore_ascii_case("skip")
}

async fn publish(
    bot: &Bot,
    state: &SessionState,
    teacher_id: Uuid,
    draft: &AssignmentDraft,
    deadline: Option<jiff::Timestamp>,
) -> Result<Outcome, FlowError> {
    let (Some(title), Some(question), Some(mode), Some(expected), Some(max_score)) = (
        draft.title.as_ref(),
        draft.question.as_ref(),
        draft.mode,
        draft.expected.as_ref(),
        draft.max_score,
    ) else {
        return Err(draft_missing(state));
    };

    let new_assignment = NewAssignment {
        title: title.clone(),
        question_text: question.clone(),
        expected: ExpectedAnswer::from_input(mode, expected)?,
        grading_mode: mode,
        max_score,
        deadline,
        required_fields: draft.required_fields.clone(),
    };
    let assignment = bot.registry.create(teacher_id, new_assignment).await?;

    let mut note = format!(
        "Assignment published!\n\nCode: {}\nTitle: {}\nMode: {}\nMax score: {}",
        assignment.code,
        assignment.title,
        assignment.grading_mode.label(),
        assignment.max_score,
    );
    if let Some(deadline) = assignment.deadline {
        let deadline = format_deadline(deadline, &bot.config.locale);
        note.push_str(&format!("\nDeadline: {deadline}"));
    }
    if !assignment.required_fields.is_empty() {
        let fields = describe_fields(&assignment.required_fields);
        note.push_str(&format!("\nStudent details: {fields}"));
    }
    note.push_str("\n\nShare the code with your students.");
    Ok(go_home(bot, state, &note))
}

pub(super) fn step_prompt(state: &SessionState, step: AuthoringStep) -> Reply {
    let discard = Button::new("dashboard", "Back to dashboard");
    let draft = match &state.draft {
        Draft::Assignment(d) => Some(d),
        _ => None,
    };
    let text = match step {
        AuthoringStep::Title => "Enter a title for the assignment.",
        AuthoringStep::Question => "Enter the question.",
        AuthoringStep::Mode => {
            let mut buttons = authoring_mode_buttons();
            buttons.push(discard);
            return Reply::text("How should answers be graded?").with_buttons(buttons);
        }
        AuthoringStep::Expected => match draft.and_then(|d| d.mode) {
            Some(GradingMode::Keyword) => "Enter the keywords, separated by spaces.",
            Some(GradingMode::Manual) => "Enter a model answer (for your reference when grading).",
            _ => "Enter the expected answer.",
        },
        AuthoringStep::MaxScore => "Enter the max score.",
        AuthoringStep::Fields => return fields_prompt(draft, discard),
        AuthoringStep::Deadline => {
            let buttons = vec![Button::new("no_deadline", "No deadline"), discard];
            let text =
                "Enter a deadline as YYYY-MM-DD or YYYY-MM-DD HH:MM (UTC), or tap No deadline.";
            return Reply::text(text).with_buttons(buttons);
        }
    };
    Reply::text(text).with_buttons(vec![discard])
}

/// Offers the fields not chosen yet.
fn fields_prompt(draft: Option<&AssignmentDraft>, discard: Button) -> Reply {
    let chosen = draft.map(|d| d.required_fields.as_slice()).unwrap_or(&[]);
    let mut buttons: Vec<Button> = StudentField::ALL
        .into_iter()
        .filter(|field| !chosen.contains(field))
        .map(|field| Button::new(format!("field:{}", field.as_str()), field.label()))
        .collect();
    buttons.push(Button::new("fields_done", "Done"));
    buttons.push(discard);

    let mut text = String::from(
        "Which details must students give before answering? Tap each one, then Done.",
    );
    if !chosen.is_empty() {
        text.push_str(&format!("\nSelected: {}", describe_fields(chosen)));
    }
    Reply::text(text).with_buttons(buttons)
}

use markwise_core::models::grade::score_badge;
use markwise_core::models::grading_mode::GradingMode;
use markwise_grading::engine::parse_mode;
use tracing::info;

use super::{
    Outcome, draft_missing, menu_button, mismatch, non_empty, parse_max_score, prompt, text_of,
};
use crate::bot::Bot;
use crate::error::FlowError;
use crate::event::{Event, Reply};
use crate::session::{Draft, QuickGradeDraft, QuickGradeStep, SessionState, Stage};

pub(super) fn on_mode_choice(
    bot: &Bot,
    state: &SessionState,
    event: &Event,
) -> Result<Outcome, FlowError> {
    let mode = match event {
        Event::Button { id } => {
            let Some(token) = id.strip_prefix("qg:") else {
                return Err(mismatch(state));
            };
            parse_mode(token).map_err(|e| {
                info!(
                    participant = %state.participant_id,
                    error = %e,
                    "bad quick grade mode button"
                );
                mismatch(state)
            })?
        }
        Event::Text { body } => {
            let mode = GradingMode::lookup_label(body.trim());
            mode.ok_or_else(|| mismatch(state))?
        }
    };
    if mode == GradingMode::Manual {
        return Err(FlowError::InvalidInput(
            "Quick grade needs an automatic mode.".to_string(),
        ));
    }

    let next = state.moved_to(
        Stage::QuickGradeAwaitingInputs(QuickGradeStep::Expected),
        Draft::QuickGrade(QuickGradeDraft {
            mode,
            expected: None,
            answer: None,
        }),
    );
    let reply = prompt(bot, &next).prefixed(&format!("Mode: {}", mode.label()));
    Ok(Outcome::to(next, reply))
}

pub(super) async fn on_input(
    bot: &Bot,
    state: &SessionState,
    step: QuickGradeStep,
    event: &Event,
) -> Result<Outcome, FlowError> {
    let Draft::QuickGrade(draft) = &state.draft else {
        return Err(draft_missing(state));
    };
    let text = text_of(state, event)?;
    let mut draft = draft.clone();

    let next_step = match step {
        QuickGradeStep::Expected => {
            draft.expected = Some(non_empty(text, "Expected answer")?.to_string());
            QuickGradeStep::Answer
        }
        QuickGradeStep::Answer => {
            draft.answer = Some(text.to_string());
            QuickGradeStep::MaxScore
        }
        QuickGradeStep::MaxScore => {
            let max_score = parse_max_score(text)?;
            let (Some(expected), Some(answer)) = (&draft.expected, &draft.answer) else {
                return Err(draft_missing(state));
            };
            let grade = bot
                .quick_grades
                .grade(answer, expected, max_score, draft.mode)
                .await?;
            let reply = Reply::text(format!(
                "Quick grade ({})\n\nScore: {}\n{}",
                draft.mode.label(),
                score_badge(grade.score, grade.max_score),
                grade.explanation
            ))
            .with_buttons(vec![menu_button()]);
            let done = state.moved_to(Stage::Idle, Draft::Empty);
            return Ok(Outcome::to(done, reply));
        }
    };

    let next = state.moved_to(
        Stage::QuickGradeAwaitingInputs(next_step),
        Draft::QuickGrade(draft),
    );
    let reply = prompt(bot, &next);
    Ok(Outcome::to(next, reply))
}

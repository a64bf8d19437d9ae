use tracing::info;

use super::{HELP_TEXT, Outcome, menu_button, mismatch, prompt};
use crate::bot::Bot;
use crate::error::FlowError;
use crate::event::{Event, Reply};
use crate::session::{AuthStep, Draft, SessionState, Stage};

/// Any text wakes an idle session up. Stale buttons are re-prompted.
pub(super) fn on_idle(
    bot: &Bot,
    state: &SessionState,
    event: &Event,
) -> Result<Outcome, FlowError> {
    match event {
        Event::Text { .. } => Ok(super::go_home(bot, state, "")),
        Event::Button { .. } => Err(mismatch(state)),
    }
}

pub(super) async fn on_mode_choice(
    bot: &Bot,
    state: &SessionState,
    event: &Event,
) -> Result<Outcome, FlowError> {
    let Event::Button { id } = event else {
        return Err(mismatch(state));
    };

    let next = match id.as_str() {
        "teacher_login" if state.teacher.is_some() => state.home(),
        "teacher_login" => state.moved_to(Stage::TeacherAuthPending(AuthStep::Email), Draft::Empty),
        "teacher_register" => state.moved_to(
            Stage::TeacherAuthPending(AuthStep::RegisterName),
            Draft::Empty,
        ),
        "student" => state.moved_to(Stage::StudentFindAssignment, Draft::Empty),
        "quick_grade" => state.moved_to(Stage::QuickGradeModeChoice, Draft::Empty),
        "help" => {
            return Ok(Outcome::to(
                state.clone(),
                Reply::text(HELP_TEXT).with_buttons(vec![menu_button()]),
            ));
        }
        "admin_stats" if bot.config.is_admin(&state.participant_id) => {
            return Ok(Outcome::to(state.clone(), admin_stats(bot).await?));
        }
        _ => return Err(mismatch(state)),
    };

    let reply = prompt(bot, &next);
    Ok(Outcome::to(next, reply))
}

async fn admin_stats(bot: &Bot) -> Result<Reply, FlowError> {
    let teachers = bot.identity.count().await?;
    let assignments = bot.registry.count().await?;
    let submissions = bot.ledger.count().await?;
    let quick_grades = bot.quick_grades.count().await?;
    info!(
        teachers,
        assignments,
        submissions,
        quick_grades,
        "admin stats requested"
    );

    let text = format!(
        "System stats\n\n\
         Teachers: {teachers}\n\
         Assignments: {assignments}\n\
         Submissions: {submissions}\n\
         Quick grades: {quick_grades}"
    );
    Ok(Reply::text(text).with_buttons(vec![menu_button()]))
}

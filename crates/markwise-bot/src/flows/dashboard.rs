use markwise_classroom::analytics::summarize;
use markwise_core::deadline::format_deadline;
use markwise_core::models::assignment::Assignment;
use markwise_core::models::grade::score_badge;
use markwise_core::models::student_details::{describe, describe_fields};
use uuid::Uuid;

use super::{Outcome, dashboard_buttons, mismatch, prompt};
use crate::bot::Bot;
use crate::error::FlowError;
use crate::event::{Button, Event, Reply};
use crate::session::{AssignmentDraft, AuthoringStep, Draft, SessionState, Stage};

pub(super) async fn on_event(
    bot: &Bot,
    state: &SessionState,
    event: &Event,
) -> Result<Outcome, FlowError> {
    let teacher = state.teacher.as_ref().ok_or(FlowError::NotSignedIn)?;
    let teacher_id = teacher.id;

    match event {
        Event::Button { id } => on_button(bot, state, teacher_id, id).await,
        Event::Text { body } => on_command(bot, state, teacher_id, body.trim()).await,
    }
}

async fn on_button(
    bot: &Bot,
    state: &SessionState,
    teacher_id: Uuid,
    id: &str,
) -> Result<Outcome, FlowError> {
    let stay = |reply: Reply| Ok(Outcome::to(state.clone(), reply));

    match id {
        "dashboard" => stay(prompt(bot, state)),
        "create_assignment" => {
            let next = state.moved_to(
                Stage::AssignmentAuthoring(AuthoringStep::Title),
                Draft::Assignment(AssignmentDraft::default()),
            );
            let reply = prompt(bot, &next);
            Ok(Outcome::to(next, reply))
        }
        "quick_grade" => {
            let next = state.moved_to(Stage::QuickGradeModeChoice, Draft::Empty);
            let reply = prompt(bot, &next);
            Ok(Outcome::to(next, reply))
        }
        "my_assignments" => stay(my_assignments(bot, teacher_id).await?),
        "results" => stay(results(bot, teacher_id).await?),
        _ => {
            let Some((action, code)) = id.split_once(':') else {
                return Err(mismatch(state));
            };
            let reply = match action {
                "view" => {
                    let assignment = bot.registry.owned(teacher_id, code).await?;
                    details(bot, &assignment).await?
                }
                "subs" => {
                    let assignment = bot.registry.owned(teacher_id, code).await?;
                    submissions(bot, &assignment).await?
                }
                "toggle" => toggle(bot, teacher_id, code).await?,
                "delete" => {
                    let assignment = bot.registry.owned(teacher_id, code).await?;
                    confirm_delete(bot, &assignment).await?
                }
                "confirm_delete" => {
                    let removed = bot.registry.delete(teacher_id, code).await?;
                    let note = format!(
                        "Deleted {} and {removed} submission(s).",
                        code.trim().to_uppercase()
                    );
                    my_assignments(bot, teacher_id).await?.prefixed(&note)
                }
                _ => return Err(mismatch(state)),
            };
            stay(reply)
        }
    }
}

/// `/maxscore CODE N` and `/override CODE STUDENT SCORE`.
async fn on_command(
    bot: &Bot,
    state: &SessionState,
    teacher_id: Uuid,
    text: &str,
) -> Result<Outcome, FlowError> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let reply = match words.as_slice() {
        ["/maxscore", code, n] => {
            let max_score = parse_number(n)?;
            let registry = &bot.registry;
            let updated = registry.set_max_score(teacher_id, code, max_score).await?;
            Reply::text(format!(
                "Max score for {} is now {}.",
                updated.code, updated.max_score
            ))
        }
        ["/maxscore", ..] => return Err(usage("/maxscore CODE N")),
        ["/override", code, student @ .., score] if !student.is_empty() => {
            let score = parse_number(score)?;
            let student = student.join(" ");
            let updated = bot
                .ledger
                .override_score(teacher_id, code, &student, score)
                .await?;
            Reply::text(format!(
                "Score for {} on {} set to {}.",
                updated.student_identity,
                updated.assignment_code,
                score_badge(updated.score, updated.max_score)
            ))
        }
        ["/override", ..] => return Err(usage("/override CODE STUDENT SCORE")),
        _ => return Err(mismatch(state)),
    };
    let reply = reply.with_buttons(dashboard_buttons());
    Ok(Outcome::to(state.clone(), reply))
}

async fn toggle(bot: &Bot, teacher_id: Uuid, code: &str) -> Result<Reply, FlowError> {
    let current = bot.registry.owned(teacher_id, code).await?;
    let open = !current.active;
    let updated = bot.registry.set_active(teacher_id, code, open).await?;
    let note = if updated.active {
        format!("{} is open for submissions again.", updated.code)
    } else {
        format!("{} is closed. Students can no longer submit.", updated.code)
    };
    Ok(details(bot, &updated).await?.prefixed(&note))
}

async fn my_assignments(bot: &Bot, teacher_id: Uuid) -> Result<Reply, FlowError> {
    let assignments = bot.registry.list_for_owner(teacher_id).await?;
    if assignments.is_empty() {
        let text = "You haven't created any assignments yet.";
        return Ok(Reply::text(text).with_buttons(dashboard_buttons()));
    }

    let mut text = String::from("Your assignments (newest first):\n");
    let mut buttons = Vec::with_capacity(assignments.len() + 1);
    for a in &assignments {
        let status = if a.active { "" } else { " [closed]" };
        let mode = a.grading_mode.label();
        text.push_str(&format!("\n{} - {} ({mode}){status}", a.code, a.title));
        let label = format!("{} {}", a.code, a.title);
        buttons.push(Button::new(format!("view:{}", a.code), label));
    }
    buttons.push(Button::new("dashboard", "Dashboard"));
    Ok(Reply::text(text).with_buttons(buttons))
}

async fn details(bot: &Bot, a: &Assignment) -> Result<Reply, FlowError> {
    let count = bot.ledger.submissions_for(&a.code).await?.len();
    let deadline = a
        .deadline
        .map(|d| format_deadline(d, &bot.config.locale))
        .unwrap_or_else(|| "none".to_string());
    let status = match a.closed_reason(jiff::Timestamp::now()) {
        Some(reason) => format!("closed ({reason})"),
        None => "open".to_string(),
    };
    let student_details = if a.required_fields.is_empty() {
        "none".to_string()
    } else {
        describe_fields(&a.required_fields)
    };

    let text = format!(
        "{code}: {title}\n\n\
         Question: {question}\n\
         Expected: {expected}\n\
         Mode: {mode}\n\
         Max score: {max}\n\
         Deadline: {deadline}\n\
         Student details: {student_details}\n\
         Status: {status}\n\
         Submissions: {count}",
        code = a.code,
        title = a.title,
        question = a.question_text,
        expected = a.expected.as_text(),
        mode = a.grading_mode.label(),
        max = a.max_score,
    );
    let toggle_label = if a.active { "Close" } else { "Reopen" };
    Ok(Reply::text(text).with_buttons(vec![
        Button::new(format!("subs:{}", a.code), "Submissions"),
        Button::new(format!("toggle:{}", a.code), toggle_label),
        Button::new(format!("delete:{}", a.code), "Delete"),
        Button::new("my_assignments", "My assignments"),
        Button::new("dashboard", "Dashboard"),
    ]))
}

async fn confirm_delete(bot: &Bot, a: &Assignment) -> Result<Reply, FlowError> {
    let count = bot.ledger.submissions_for(&a.code).await?.len();
    let text = format!(
        "Delete {}: {} and its {count} submission(s)? This cannot be undone.",
        a.code, a.title
    );
    Ok(Reply::text(text).with_buttons(vec![
        Button::new(format!("confirm_delete:{}", a.code), "Yes, delete"),
        Button::new(format!("view:{}", a.code), "Cancel"),
    ]))
}

async fn submissions(bot: &Bot, a: &Assignment) -> Result<Reply, FlowError> {
    let subs = bot.ledger.submissions_for(&a.code).await?;
    let back = vec![
        Button::new(format!("view:{}", a.code), "Back to assignment"),
        Button::new("dashboard", "Dashboard"),
    ];
    if subs.is_empty() {
        let text = format!("No submissions for {} yet.", a.code);
        return Ok(Reply::text(text).with_buttons(back));
    }

    let mut text = format!("Submissions for {} ({}):\n", a.code, subs.len());
    for s in &subs {
        text.push_str(&format!(
            "\n{} at {}: {}",
            s.student_identity,
            s.submitted_at.strftime("%Y-%m-%d %H:%M UTC"),
            score_badge(s.score, s.max_score),
        ));
        if !s.student_details.is_empty() {
            text.push_str(&format!("\n  Details: {}", describe(&s.student_details)));
        }
        text.push_str(&format!(
            "\n  Answer: {}\n  {}",
            s.raw_answer_text, s.explanation
        ));
    }
    Ok(Reply::text(text).with_buttons(back))
}

async fn results(bot: &Bot, teacher_id: Uuid) -> Result<Reply, FlowError> {
    let summary = summarize(&bot.registry, &bot.ledger, teacher_id).await?;
    if summary.assignments.is_empty() {
        let text = "No assignments yet, so no results.";
        return Ok(Reply::text(text).with_buttons(dashboard_buttons()));
    }

    let mut text = String::from("Results & analytics\n");
    for stats in &summary.assignments {
        let average = match (stats.average_score, stats.average_percent) {
            (Some(score), Some(pct)) => format!("average {score:.1} ({pct:.1}%)"),
            _ => "no submissions".to_string(),
        };
        let count = stats.submissions;
        text.push_str(&format!(
            "\n{} - {}: {count} submissions, {average}",
            stats.code, stats.title
        ));
        if stats.pending_review > 0 {
            let pending = stats.pending_review;
            text.push_str(&format!(", {pending} awaiting review"));
        }
    }
    let total = summary.total_submissions;
    text.push_str(&format!("\n\nTotal submissions: {total}"));
    if let Some(pct) = summary.overall_average_percent {
        text.push_str(&format!("\nOverall average: {pct:.1}%"));
    }
    Ok(Reply::text(text).with_buttons(dashboard_buttons()))
}

fn parse_number(text: &str) -> Result<u32, FlowError> {
    let invalid = || FlowError::InvalidInput(format!("'{text}' is not a whole number."));
    text.parse().map_err(|_| invalid())
}

fn usage(form: &str) -> FlowError {
    FlowError::InvalidInput(format!("Usage: {form}"))
}

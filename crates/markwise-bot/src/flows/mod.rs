//! Stage handlers. Each takes the current state and an event and computes
//! the next state and reply without touching the stored session; the bot
//! persists the result.

mod authoring;
mod dashboard;
mod menu;
mod quick_grade;
mod student;
mod teacher_auth;

use markwise_core::models::grading_mode::GradingMode;

use crate::bot::Bot;
use crate::error::FlowError;
use crate::event::{Button, Event, Reply};
use crate::session::{AuthStep, QuickGradeStep, SessionState, Stage};

pub(crate) struct Outcome {
    pub state: SessionState,
    pub reply: Reply,
}

impl Outcome {
    pub fn to(state: SessionState, reply: Reply) -> Self {
        Self { state, reply }
    }
}

pub(crate) async fn dispatch(
    bot: &Bot,
    state: &SessionState,
    event: &Event,
) -> Result<Outcome, FlowError> {
    if let Some(outcome) = global(bot, state, event) {
        return Ok(outcome);
    }

    match state.stage {
        Stage::Idle => menu::on_idle(bot, state, event),
        Stage::AwaitingModeChoice => menu::on_mode_choice(bot, state, event).await,
        Stage::TeacherAuthPending(step) => teacher_auth::on_event(bot, state, step, event).await,
        Stage::TeacherDashboard => dashboard::on_event(bot, state, event).await,
        Stage::AssignmentAuthoring(step) => authoring::on_event(bot, state, step, event).await,
        Stage::StudentFindAssignment => student::on_find(bot, state, event).await,
        Stage::StudentDetails => student::on_details(bot, state, event),
        Stage::StudentAnswering => student::on_answer(bot, state, event).await,
        Stage::QuickGradeModeChoice => quick_grade::on_mode_choice(bot, state, event),
        Stage::QuickGradeAwaitingInputs(step) => {
            quick_grade::on_input(bot, state, step, event).await
        }
    }
}

/// Events accepted in every stage.
fn global(bot: &Bot, state: &SessionState, event: &Event) -> Option<Outcome> {
    match event {
        Event::Text { body } if body.trim() == "/start" => Some(go_home(bot, state, "")),
        Event::Button { id } if id == "menu" => Some(go_home(bot, state, "")),
        Event::Text { body } if body.trim() == "/logout" => Some(log_out(bot, state)),
        Event::Button { id } if id == "logout" => Some(log_out(bot, state)),
        Event::Text { body } if body.trim() == "/help" => Some(Outcome::to(
            state.clone(),
            Reply::text(HELP_TEXT).with_buttons(vec![Button::new("menu", "Main menu")]),
        )),
        _ => None,
    }
}

pub(crate) fn go_home(bot: &Bot, state: &SessionState, note: &str) -> Outcome {
    let home = state.home();
    let reply = prompt(bot, &home).prefixed(note);
    Outcome::to(home, reply)
}

fn log_out(bot: &Bot, state: &SessionState) -> Outcome {
    let next = state.logged_out();
    let note = if state.teacher.is_some() {
        "You have been logged out."
    } else {
        "Session reset."
    };
    let reply = prompt(bot, &next).prefixed(note);
    Outcome::to(next, reply)
}

pub(crate) fn mismatch(state: &SessionState) -> FlowError {
    FlowError::StageMismatch {
        stage: state.stage.to_string(),
    }
}

pub(crate) fn draft_missing(state: &SessionState) -> FlowError {
    FlowError::DraftMissing {
        stage: state.stage.to_string(),
    }
}

/// The text of a text event, trimmed. Buttons are a mismatch.
pub(crate) fn text_of<'a>(state: &SessionState, event: &'a Event) -> Result<&'a str, FlowError> {
    match event {
        Event::Text { body } => Ok(body.trim()),
        Event::Button { .. } => Err(mismatch(state)),
    }
}

pub(crate) fn non_empty<'a>(text: &'a str, what: &str) -> Result<&'a str, FlowError> {
    if text.is_empty() {
        Err(FlowError::InvalidInput(format!(
            "{what} must not be empty."
        )))
    } else {
        Ok(text)
    }
}

pub(crate) fn parse_max_score(text: &str) -> Result<u32, FlowError> {
    match text.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(FlowError::InvalidInput(
            "Max score must be a whole number greater than 0.".to_string(),
        )),
    }
}

pub(crate) fn menu_button() -> Button {
    Button::new("menu", "Main menu")
}

pub(crate) fn dashboard_buttons() -> Vec<Button> {
    vec![
        Button::new("create_assignment", "Create assignment"),
        Button::new("my_assignments", "My assignments"),
        Button::new("results", "Results & analytics"),
        Button::new("quick_grade", "Quick grade"),
        Button::new("logout", "Log out"),
    ]
}

pub(crate) fn authoring_mode_buttons() -> Vec<Button> {
    GradingMode::ALL
        .iter()
        .map(|mode| Button::new(format!("mode:{}", mode.label()), mode.label()))
        .collect()
}

pub(crate) fn quick_grade_mode_buttons() -> Vec<Button> {
    GradingMode::ALL
        .iter()
        .filter(|mode| **mode != GradingMode::Manual)
        .map(|mode| Button::new(format!("qg:{}", mode.as_str()), mode.label()))
        .collect()
}

pub(crate) const HELP_TEXT: &str = "Markwise grades short answers.\n\n\
Teachers: register or log in, then create assignments. Each assignment gets an \
8-character code to share with students. Grading modes:\n\
- Exact Match: full marks only for the exact answer (case and spacing ignored)\n\
- Keyword Based: marks for each expected keyword found in the answer\n\
- AI Semantic: marks by how close the meaning is\n\
- Short Answer: graded by you\n\
An assignment can ask students for details such as their name or class before \
they answer.\n\
Dashboard commands: /maxscore CODE N changes the max score before anyone submits; \
/override CODE STUDENT SCORE sets a score by hand.\n\n\
Students: choose \"I'm a student\" and enter the code from your teacher.\n\n\
Anyone: /start shows the menu, /logout resets your session.";

/// What to ask the participant in their current stage.
pub(crate) fn prompt(bot: &Bot, state: &SessionState) -> Reply {
    match state.stage {
        Stage::Idle => Reply::text("Send /start to begin.").with_buttons(vec![menu_button()]),
        Stage::AwaitingModeChoice => {
            let mut buttons = vec![
                Button::new("teacher_login", "Teacher login"),
                Button::new("teacher_register", "Register as teacher"),
                Button::new("student", "I'm a student"),
                Button::new("quick_grade", "Quick grade"),
                Button::new("help", "Help"),
            ];
            if bot.config.is_admin(&state.participant_id) {
                buttons.push(Button::new("admin_stats", "Admin stats"));
            }
            let text = "Welcome to Markwise! How would you like to continue?";
            Reply::text(text).with_buttons(buttons)
        }
        Stage::TeacherAuthPending(step) => {
            let text = match step {
                AuthStep::Email => "Enter your email address.",
                AuthStep::Password => "Enter your password.",
                AuthStep::RegisterName => "What name should students see?",
                AuthStep::RegisterEmail => "Enter your email address.",
                AuthStep::RegisterPassword => "Choose a password (at least 6 characters).",
            };
            Reply::text(text).with_buttons(vec![menu_button()])
        }
        Stage::TeacherDashboard => {
            let name = state
                .teacher
                .as_ref()
                .map(|t| t.display_name.as_str())
                .unwrap_or("teacher");
            Reply::text(format!("Dashboard for {name}. What would you like to do?"))
                .with_buttons(dashboard_buttons())
        }
        Stage::AssignmentAuthoring(step) => authoring::step_prompt(state, step),
        Stage::StudentFindAssignment => {
            let text = "Enter the 8-character assignment code.";
            Reply::text(text).with_buttons(vec![menu_button()])
        }
        Stage::StudentDetails => student::details_prompt(state),
        Stage::StudentAnswering => {
            let buttons = vec![Button::new("back", "Different code"), menu_button()];
            Reply::text("Type your answer.").with_buttons(buttons)
        }
        Stage::QuickGradeModeChoice => {
            let mut buttons = quick_grade_mode_buttons();
            buttons.push(menu_button());
            Reply::text("Quick grade: choose a grading mode.").with_buttons(buttons)
        }
        Stage::QuickGradeAwaitingInputs(step) => {
            let text = match step {
                QuickGradeStep::Expected => {
                    "Enter the expected answer (keywords separated by spaces for keyword mode)."
                }
                QuickGradeStep::Answer => "Enter the student's answer.",
                QuickGradeStep::MaxScore => "Enter the max score.",
            };
            Reply::text(text).with_buttons(vec![menu_button()])
        }
    }
}

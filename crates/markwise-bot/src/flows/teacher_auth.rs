use markwise_auth::AuthError;
use markwise_auth::identity::is_plausible_email;
use markwise_core::models::teacher::TeacherAccount;

use super::{Outcome, draft_missing, non_empty, prompt, text_of};
use crate::bot::Bot;
use crate::error::FlowError;
use crate::event::Event;
use crate::session::{AuthStep, Draft, SessionState, Stage, TeacherSession};

pub(super) async fn on_event(
    bot: &Bot,
    state: &SessionState,
    step: AuthStep,
    event: &Event,
) -> Result<Outcome, FlowError> {
    let text = text_of(state, event)?;

    match step {
        AuthStep::Email => {
            let email = non_empty(text, "Email")?;
            let next = state.moved_to(
                Stage::TeacherAuthPending(AuthStep::Password),
                Draft::Login {
                    email: email.to_string(),
                },
            );
            Ok(advance(bot, next))
        }
        AuthStep::Password => {
            let Draft::Login { email } = &state.draft else {
                return Err(draft_missing(state));
            };
            match bot.identity.authenticate(email, text).await {
                Ok(account) => Ok(signed_in(bot, state, &account, "Logged in.")),
                Err(AuthError::InvalidCredentials) => {
                    let stage = Stage::TeacherAuthPending(AuthStep::Email);
                    let next = state.moved_to(stage, Draft::Empty);
                    let message = AuthError::InvalidCredentials.to_string();
                    let reply = prompt(bot, &next).prefixed(&message);
                    Ok(Outcome::to(next, reply))
                }
                Err(e) => Err(e.into()),
            }
        }
        AuthStep::RegisterName => {
            let name = non_empty(text, "Name")?;
            let next = state.moved_to(
                Stage::TeacherAuthPending(AuthStep::RegisterEmail),
                Draft::Registration {
                    name: name.to_string(),
                    email: None,
                },
            );
            Ok(advance(bot, next))
        }
        AuthStep::RegisterEmail => {
            let Draft::Registration { name, .. } = &state.draft else {
                return Err(draft_missing(state));
            };
            if !is_plausible_email(text) {
                return Err(FlowError::InvalidInput(format!(
                    "'{text}' doesn't look like an email address."
                )));
            }
            let next = state.moved_to(
                Stage::TeacherAuthPending(AuthStep::RegisterPassword),
                Draft::Registration {
                    name: name.clone(),
                    email: Some(text.to_string()),
                },
            );
            Ok(advance(bot, next))
        }
        AuthStep::RegisterPassword => {
            let Draft::Registration {
                name,
                email: Some(email),
            } = &state.draft
            else {
                return Err(draft_missing(state));
            };
            match bot.identity.register(name, email, text).await {
                Ok(account) => Ok(signed_in(bot, state, &account, "Account created.")),
                Err(AuthError::DuplicateEmail) => {
                    let next = state.moved_to(
                        Stage::TeacherAuthPending(AuthStep::RegisterEmail),
                        Draft::Registration {
                            name: name.clone(),
                            email: None,
                        },
                    );
                    let reply = prompt(bot, &next).prefixed(&AuthError::DuplicateEmail.to_string());
                    Ok(Outcome::to(next, reply))
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}

fn advance(bot: &Bot, next: SessionState) -> Outcome {
    let reply = prompt(bot, &next);
    Outcome::to(next, reply)
}

fn signed_in(bot: &Bot, state: &SessionState, account: &TeacherAccount, note: &str) -> Outcome {
    let mut next = state.moved_to(Stage::TeacherDashboard, Draft::Empty);
    next.teacher = Some(TeacherSession {
        id: account.id,
        display_name: account.display_name.clone(),
    });
    let reply = prompt(bot, &next).prefixed(note);
    Outcome::to(next, reply)
}

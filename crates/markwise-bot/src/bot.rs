use std::sync::Arc;

use markwise_auth::IdentityStore;
use markwise_classroom::{AssignmentRegistry, QuickGradeLog, SubmissionLedger};
use markwise_grading::Similarity;
use markwise_storage::Bucket;
use tracing::{error, info, warn};

use crate::config::BotConfig;
use crate::error::FlowError;
use crate::event::{Button, Event, Reply};
use crate::flows::{self, Outcome};
use crate::session::{SessionState, SessionStore};

const SESSION_UNAVAILABLE: &str =
    "Sorry, I can't reach your session right now. Please try again in a moment.";
const SESSION_NOT_SAVED: &str =
    "(Your progress could not be saved; you may need to repeat the last step.)";

/// Channel-agnostic entry point: one event in, one reply out.
pub struct Bot {
    pub(crate) identity: Arc<IdentityStore>,
    pub(crate) registry: Arc<AssignmentRegistry>,
    pub(crate) ledger: Arc<SubmissionLedger>,
    pub(crate) quick_grades: Arc<QuickGradeLog>,
    pub(crate) config: BotConfig,
    sessions: SessionStore,
}

impl Bot {
    pub fn new(
        bucket: Arc<Bucket>,
        identity: IdentityStore,
        similarity: Arc<dyn Similarity>,
        config: BotConfig,
    ) -> Self {
        let registry = AssignmentRegistry::new(bucket.clone());
        Self::with_registry(bucket, identity, registry, similarity, config)
    }

    /// Use a preconfigured registry (e.g. with a custom code source).
    pub fn with_registry(
        bucket: Arc<Bucket>,
        identity: IdentityStore,
        registry: AssignmentRegistry,
        similarity: Arc<dyn Similarity>,
        config: BotConfig,
    ) -> Self {
        Self {
            identity: Arc::new(identity),
            registry: Arc::new(registry),
            ledger: Arc::new(SubmissionLedger::new(
                bucket.clone(),
                similarity.clone(),
                config.resubmission,
            )),
            quick_grades: Arc::new(QuickGradeLog::new(bucket.clone(), similarity)),
            sessions: SessionStore::new(bucket),
            config,
        }
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// The per-participant session store and its locks.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Apply one event to a participant's session.
    ///
    /// Never fails: every error becomes a reply, and the session is left in a
    /// stage the participant can continue from.
    pub async fn handle(&self, participant_id: &str, event: Event) -> Reply {
        let _guard = self.sessions.lock(participant_id).await;

        let state = match self.sessions.load(participant_id).await {
            Ok(state) => state,
            Err(e) => {
                error!(
                    participant = participant_id,
                    error = %e,
                    "failed to load session"
                );
                let menu = vec![Button::new("menu", "Main menu")];
                return Reply::text(SESSION_UNAVAILABLE).with_buttons(menu);
            }
        };

        let (next, reply) = match flows::dispatch(self, &state, &event).await {
            Ok(Outcome { state: next, reply }) => {
                if next.stage != state.stage {
                    info!(
                        participant = participant_id,
                        from = %state.stage,
                        to = %next.stage,
                        "stage transition"
                    );
                }
                (Some(next), reply)
            }
            Err(err) => self.recover(&state, &event, err),
        };

        let Some(mut next) = next else {
            return reply;
        };
        next.updated_at = jiff::Timestamp::now();
        if let Err(e) = self.sessions.save(&next).await {
            error!(
                participant = participant_id,
                error = %e,
                "failed to save session"
            );
            let note = format!("{}\n\n{SESSION_NOT_SAVED}", reply.text);
            return Reply {
                text: note,
                ..reply
            };
        }
        reply
    }

    /// Turn a failed event into a reply. Returns the state to persist, if it
    /// changes at all.
    fn recover(
        &self,
        state: &SessionState,
        event: &Event,
        err: FlowError,
    ) -> (Option<SessionState>, Reply) {
        let participant = state.participant_id.as_str();
        let stage = &state.stage;
        match &err {
            FlowError::StageMismatch { .. } => {
                info!(participant, stage = %stage, event = ?event, "stage mismatch");
                (None, flows::prompt(self, state).prefixed(&err.user_message()))
            }
            FlowError::DraftMissing { .. } | FlowError::NotSignedIn => {
                warn!(participant, stage = %stage, error = %err, "resetting session");
                let home = state.home();
                let reply = flows::prompt(self, &home).prefixed(&err.user_message());
                (Some(home), reply)
            }
            FlowError::Storage(_) => {
                error!(participant, stage = %stage, error = %err, "storage failure");
                (None, flows::prompt(self, state).prefixed(&err.user_message()))
            }
            _ => {
                info!(participant, stage = %stage, error = %err, "event rejected");
                (None, flows::prompt(self, state).prefixed(&err.user_message()))
            }
        }
    }
}

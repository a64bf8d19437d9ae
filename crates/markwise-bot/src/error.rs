use markwise_auth::AuthError;
use markwise_classroom::ClassroomError;
use markwise_core::error::CoreError;
use markwise_storage::StorageError;
use thiserror::Error;

/// Why an event could not be applied. Every variant is recoverable: the bot
/// turns it into a reply and the participant stays in a continuable stage.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("event does not fit stage {stage}")]
    StageMismatch { stage: String },

    #[error("{0}")]
    InvalidInput(String),

    #[error("no draft for stage {stage}")]
    DraftMissing { stage: String },

    #[error("not signed in")]
    NotSignedIn,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Classroom(#[from] ClassroomError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl FlowError {
    /// Text shown to the participant.
    pub fn user_message(&self) -> String {
        match self {
            FlowError::StageMismatch { .. } => "Sorry, I didn't expect that here.".to_string(),
            FlowError::InvalidInput(msg) => msg.clone(),
            FlowError::DraftMissing { .. } => {
                "I lost track of that step, let's start over.".to_string()
            }
            FlowError::NotSignedIn => "Please log in as a teacher first.".to_string(),
            FlowError::Auth(AuthError::Storage(e))
            | FlowError::Classroom(ClassroomError::Storage(e)) => storage_message(e),
            FlowError::Auth(AuthError::PasswordHash(_)) => {
                "Something went wrong on our side. Please try again.".to_string()
            }
            FlowError::Auth(e) => e.to_string(),
            FlowError::Classroom(ClassroomError::Core(e)) | FlowError::Core(e) => e.to_string(),
            FlowError::Classroom(e) => e.to_string(),
            FlowError::Storage(e) => storage_message(e),
        }
    }
}

fn storage_message(err: &StorageError) -> String {
    match err {
        StorageError::Transient { .. } => {
            "Storage is temporarily unavailable. Please try again in a moment.".to_string()
        }
        _ => "Something went wrong on our side. Please try again.".to_string(),
    }
}

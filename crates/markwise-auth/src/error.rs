use markwise_storage::StorageError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("an account with this email already exists")]
    DuplicateEmail,

    /// Same message for unknown email and wrong password.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    InvalidInput(String),

    #[error("unknown teacher: {0}")]
    UnknownTeacher(Uuid),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

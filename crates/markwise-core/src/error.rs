use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid assignment code: {0}")]
    InvalidCode(String),

    #[error("unrecognized grading mode: {0}")]
    UnrecognizedMode(String),

    #[error("malformed expected answer: {0}")]
    MalformedExpectedAnswer(String),

    #[error("invalid deadline '{input}': {reason}")]
    InvalidDeadline { input: String, reason: String },
}

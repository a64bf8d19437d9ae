use thiserror::Error;

#[derive(Debug, Error)]
pub enum GradingError {
    #[error("unrecognized grading mode: {0:?}")]
    UnrecognizedMode(String),

    #[error("similarity backend failed: {0}")]
    Similarity(String),
}

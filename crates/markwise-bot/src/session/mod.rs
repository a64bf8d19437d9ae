//! Per-participant conversational state.

pub mod stage;
pub mod store;

pub use stage::{
    AnsweringDraft, AssignmentDraft, AuthStep, AuthoringStep, Draft, QuickGradeDraft,
    QuickGradeStep, SessionState, Stage, TeacherSession,
};
pub use store::SessionStore;

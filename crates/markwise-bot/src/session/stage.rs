use std::fmt;

use jiff::Timestamp;
use markwise_core::models::assignment::AssignmentCode;
use markwise_core::models::grading_mode::GradingMode;
use markwise_core::models::student_details::{StudentDetail, StudentField, first_missing};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The closed set of conversational stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "name", content = "step", rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Idle,
    AwaitingModeChoice,
    TeacherAuthPending(AuthStep),
    TeacherDashboard,
    AssignmentAuthoring(AuthoringStep),
    StudentFindAssignment,
    StudentDetails,
    StudentAnswering,
    QuickGradeModeChoice,
    QuickGradeAwaitingInputs(QuickGradeStep),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStep {
    Email,
    Password,
    RegisterName,
    RegisterEmail,
    RegisterPassword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthoringStep {
    Title,
    Question,
    Mode,
    Expected,
    MaxScore,
    Fields,
    Deadline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickGradeStep {
    Expected,
    Answer,
    MaxScore,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Idle => f.write_str("idle"),
            Stage::AwaitingModeChoice => f.write_str("awaiting_mode_choice"),
            Stage::TeacherAuthPending(step) => write!(f, "teacher_auth_pending({step:?})"),
            Stage::TeacherDashboard => f.write_str("teacher_dashboard"),
            Stage::AssignmentAuthoring(step) => write!(f, "assignment_authoring({step:?})"),
            Stage::StudentFindAssignment => f.write_str("student_find_assignment"),
            Stage::StudentDetails => f.write_str("student_details"),
            Stage::StudentAnswering => f.write_str("student_answering"),
            Stage::QuickGradeModeChoice => f.write_str("quick_grade_mode_choice"),
            Stage::QuickGradeAwaitingInputs(step) => {
                write!(f, "quick_grade_awaiting_inputs({step:?})")
            }
        }
    }
}

/// Data accumulated by the in-progress flow. Replaced on every transition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Draft {
    #[default]
    Empty,
    Login {
        email: String,
    },
    Registration {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        email: Option<String>,
    },
    Assignment(AssignmentDraft),
    Answering(AnsweringDraft),
    QuickGrade(QuickGradeDraft),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssignmentDraft {
    pub title: Option<String>,
    pub question: Option<String>,
    pub mode: Option<GradingMode>,
    pub expected: Option<String>,
    pub max_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_fields: Vec<StudentField>,
}

/// The assignment a student is answering and the details collected so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnsweringDraft {
    pub code: AssignmentCode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<StudentField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<StudentDetail>,
}

impl AnsweringDraft {
    pub fn new(code: AssignmentCode, required: Vec<StudentField>) -> Self {
        Self {
            code,
            required,
            details: Vec::new(),
        }
    }

    /// The next field to ask for, if any are still missing.
    pub fn next_field(&self) -> Option<StudentField> {
        first_missing(&self.required, &self.details)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickGradeDraft {
    pub mode: GradingMode,
    pub expected: Option<String>,
    pub answer: Option<String>,
}

/// The signed-in teacher, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherSession {
    pub id: Uuid,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub participant_id: String,
    pub stage: Stage,
    #[serde(default)]
    pub draft: Draft,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher: Option<TeacherSession>,
    pub updated_at: Timestamp,
}

impl SessionState {
    pub fn new(participant_id: &str) -> Self {
        Self {
            participant_id: participant_id.to_string(),
            stage: Stage::Idle,
            draft: Draft::Empty,
            teacher: None,
            updated_at: Timestamp::now(),
        }
    }

    /// Same participant and sign-in, new stage and draft.
    pub fn moved_to(&self, stage: Stage, draft: Draft) -> Self {
        Self {
            stage,
            draft,
            ..self.clone()
        }
    }

    /// The dashboard for a signed-in teacher, the mode menu for anyone else.
    pub fn home(&self) -> Self {
        let stage = if self.teacher.is_some() {
            Stage::TeacherDashboard
        } else {
            Stage::AwaitingModeChoice
        };
        self.moved_to(stage, Draft::Empty)
    }

    pub fn logged_out(&self) -> Self {
        Self {
            teacher: None,
            ..self.moved_to(Stage::Idle, Draft::Empty)
        }
    }
}

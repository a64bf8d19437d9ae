use serde::{Deserialize, Serialize};

/// The outcome of grading one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    pub score: u32,
    pub max_score: u32,
    pub explanation: String,
    /// Set when the score is not a final engine verdict.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<GradeFlag>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeFlag {
    /// Manual mode: waiting for a teacher override.
    ManualReview,
    /// The expected answer has nothing to grade against.
    MalformedAssignment,
    /// The similarity capability failed or returned garbage.
    SimilarityUnavailable,
}

impl Grade {
    pub fn percentage(&self) -> f64 {
        if self.max_score == 0 {
            return 0.0;
        }
        f64::from(self.score) * 100.0 / f64::from(self.max_score)
    }

    /// 🟢 at 80 % and above, 🟡 at 60 %, 🔴 below.
    pub fn badge(&self) -> String {
        score_badge(self.score, self.max_score)
    }
}

/// Colour-coded `score/max (pct%)` string.
pub fn score_badge(score: u32, max_score: u32) -> String {
    let pct = if max_score == 0 {
        0.0
    } else {
        f64::from(score) * 100.0 / f64::from(max_score)
    };
    let marker = if pct >= 80.0 {
        "🟢"
    } else if pct >= 60.0 {
        "🟡"
    } else {
        "🔴"
    };
    format!("{marker} {score}/{max_score} ({pct:.1}%)")
}

use markwise_core::models::assignment::ExpectedAnswer;
use markwise_core::models::grade::{Grade, GradeFlag};
use markwise_core::models::grading_mode::GradingMode;
use tracing::{debug, warn};

use crate::error::GradingError;
use crate::normalize::normalize;
use crate::similarity::Similarity;

pub const MANUAL_REVIEW_EXPLANATION: &str = "Manual grading needed";

/// Similarity bands, highest first: a score strictly above the threshold
/// earns the percentage. Boundaries belong to the lower band.
pub const SEMANTIC_TIERS: &[(f64, u32)] = &[(0.8, 100), (0.6, 70), (0.4, 40)];

/// Grade one answer.
///
/// Never fails: problems that prevent a real verdict (no keywords, similarity
/// backend down) produce a zero score with a flag and an explanation saying
/// why.
pub async fn grade(
    answer: &str,
    expected: &ExpectedAnswer,
    max_score: u32,
    mode: GradingMode,
    similarity: &dyn Similarity,
) -> Grade {
    let grade = match mode {
        GradingMode::Exact => grade_exact(answer, &expected.as_text(), max_score),
        GradingMode::Keyword => grade_keyword(answer, &keyword_set(expected), max_score),
        GradingMode::Semantic => {
            let a = normalize(answer);
            let b = normalize(&expected.as_text());
            grade_semantic(similarity.similarity(&a, &b).await, max_score)
        }
        GradingMode::Manual => grade_manual(max_score),
    };

    debug!(
        mode = %mode,
        score = grade.score,
        max_score,
        flag = ?grade.flag,
        "graded answer"
    );
    grade
}

/// Parse a mode token from the engine vocabulary. Labels are rejected.
pub fn parse_mode(token: &str) -> Result<GradingMode, GradingError> {
    token
        .parse::<GradingMode>()
        .map_err(|_| GradingError::UnrecognizedMode(token.to_string()))
}

pub fn grade_exact(answer: &str, expected: &str, max_score: u32) -> Grade {
    if normalize(answer) == normalize(expected) {
        Grade {
            score: max_score,
            max_score,
            explanation: "Exact match".to_string(),
            flag: None,
        }
    } else {
        Grade {
            score: 0,
            max_score,
            explanation: "Answer does not match the expected answer".to_string(),
            flag: None,
        }
    }
}

/// Normalized, de-duplicated keywords in first-seen order.
pub fn keyword_set(expected: &ExpectedAnswer) -> Vec<String> {
    let words: Vec<String> = match expected {
        ExpectedAnswer::Canonical(text) => vec![normalize(text)],
        ExpectedAnswer::Keywords(words) => words.iter().map(|w| normalize(w)).collect(),
    };

    let mut set: Vec<String> = Vec::new();
    for token in words.iter().flat_map(|w| w.split_whitespace()) {
        if !set.iter().any(|k| k == token) {
            set.push(token.to_string());
        }
    }
    set
}

/// Keywords match as substrings of the normalized answer.
pub fn grade_keyword(answer: &str, keywords: &[String], max_score: u32) -> Grade {
    if keywords.is_empty() {
        return Grade {
            score: 0,
            max_score,
            explanation: "Assignment has no keywords to match; flagged as malformed".to_string(),
            flag: Some(GradeFlag::MalformedAssignment),
        };
    }

    let answer = normalize(answer);
    let (matched, missing): (Vec<&String>, Vec<&String>) =
        keywords.iter().partition(|k| answer.contains(k.as_str()));

    let score = round_ratio(max_score, matched.len() as u64, keywords.len() as u64);
    let mut explanation = format!("Matched {}/{} keywords", matched.len(), keywords.len());
    if !missing.is_empty() {
        let missing: Vec<&str> = missing.iter().map(|k| k.as_str()).collect();
        explanation.push_str(&format!(" (missing: {})", missing.join(", ")));
    }

    Grade {
        score,
        max_score,
        explanation,
        flag: None,
    }
}

/// Percentage of max score earned at similarity `s`.
pub fn semantic_percent(s: f64) -> u32 {
    SEMANTIC_TIERS
        .iter()
        .find(|(threshold, _)| s > *threshold)
        .map(|(_, pct)| *pct)
        .unwrap_or(0)
}

pub fn grade_semantic(similarity: Result<f64, GradingError>, max_score: u32) -> Grade {
    let s = match similarity {
        Ok(s) if s.is_nan() => {
            warn!("similarity backend returned NaN");
            return similarity_unavailable(max_score, "backend returned no usable value");
        }
        Ok(s) if !(0.0..=1.0).contains(&s) => {
            warn!(similarity = s, "similarity outside [0, 1], clamping");
            s.clamp(0.0, 1.0)
        }
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "similarity backend failed");
            return similarity_unavailable(max_score, &e.to_string());
        }
    };

    let pct = semantic_percent(s);
    let score = round_ratio(max_score, u64::from(pct), 100);
    let verdict = match pct {
        100 => "full credit",
        0 => "no credit",
        _ => "partial credit",
    };

    Grade {
        score,
        max_score,
        explanation: format!("Similarity {s:.2}: {verdict} ({pct}%)"),
        flag: None,
    }
}

pub fn grade_manual(max_score: u32) -> Grade {
    Grade {
        score: 0,
        max_score,
        explanation: MANUAL_REVIEW_EXPLANATION.to_string(),
        flag: Some(GradeFlag::ManualReview),
    }
}

fn similarity_unavailable(max_score: u32, reason: &str) -> Grade {
    Grade {
        score: 0,
        max_score,
        explanation: format!("Similarity check unavailable ({reason}); needs manual review"),
        flag: Some(GradeFlag::SimilarityUnavailable),
    }
}

/// `round(max * num / den)` with halves rounded up, in integers.
fn round_ratio(max_score: u32, num: u64, den: u64) -> u32 {
    let scaled = (2 * u64::from(max_score) * num + den) / (2 * den);
    u32::try_from(scaled).unwrap_or(max_score).min(max_score)
}

//! Storage key conventions.
//!
//! Pure string functions, no I/O. These define the canonical layout of
//! objects in the markwise storage directory.

use uuid::Uuid;

use crate::models::assignment::AssignmentCode;

pub const TEACHERS_PREFIX: &str = "teachers/";

pub fn teacher(id: Uuid) -> String {
    format!("teachers/{id}.json")
}

/// Takes an already-normalized email.
pub fn teacher_email(email: &str) -> String {
    format!("teacher-emails/{}.json", escape_segment(email))
}

pub const ASSIGNMENTS_PREFIX: &str = "assignments/";

pub fn assignment(code: &AssignmentCode) -> String {
    format!("assignments/{code}.json")
}

pub fn owner_index(teacher_id: Uuid) -> String {
    format!("owners/{teacher_id}/assignments.json")
}

pub const SUBMISSIONS_PREFIX: &str = "submissions/";

pub fn submissions_prefix(code: &AssignmentCode) -> String {
    format!("submissions/{code}/")
}

pub fn submission(code: &AssignmentCode, student: &str) -> String {
    format!("submissions/{code}/{}.json", escape_segment(student))
}

pub const QUICK_GRADES_PREFIX: &str = "quick-grades/";

pub fn quick_grade(id: Uuid) -> String {
    format!("quick-grades/{id}.json")
}

pub fn session(participant_id: &str) -> String {
    format!("sessions/{}.json", escape_segment(participant_id))
}

/// Longest single path component an escaped identity may produce.
pub const MAX_SEGMENT_LEN: usize = 128;

/// Make an arbitrary identity safe to use inside a key.
///
/// ASCII alphanumerics, `-` and `_` pass through; every other byte becomes
/// `~xx`. Escapes longer than [`MAX_SEGMENT_LEN`] are split into several
/// `/`-separated components so no file name outgrows filesystem limits.
/// Escaped text never contains `/`, so the mapping stays injective.
pub fn escape_segment(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for b in raw.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
            escaped.push(b as char);
        } else {
            escaped.push_str(&format!("~{b:02x}"));
        }
    }
    if escaped.len() <= MAX_SEGMENT_LEN {
        return escaped;
    }

    // Escaped text is ASCII, so byte chunks are valid strings.
    escaped
        .as_bytes()
        .chunks(MAX_SEGMENT_LEN)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

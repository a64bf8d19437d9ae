use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherAccount {
    pub id: Uuid,
    pub display_name: String,
    /// Normalized with [`normalize_email`].
    pub email: String,
    /// PHC-format argon2 hash. The plaintext is never stored.
    pub password_hash: String,
    pub created_at: jiff::Timestamp,
}

/// Uniqueness claim for an email address. One object per normalized email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailClaim {
    pub teacher_id: Uuid,
    pub email: String,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

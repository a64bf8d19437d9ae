use markwise_classroom::ResubmissionPolicy;

#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Participant id allowed to see system-wide stats.
    pub admin_id: Option<String>,
    /// Locale for deadline display, e.g. `en-US`.
    pub locale: String,
    pub resubmission: ResubmissionPolicy,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            admin_id: None,
            locale: "en-US".to_string(),
            resubmission: ResubmissionPolicy::Reject,
        }
    }
}

impl BotConfig {
    pub fn is_admin(&self, participant_id: &str) -> bool {
        self.admin_id.as_deref() == Some(participant_id)
    }
}

use std::sync::Arc;

use markwise_bot::Bot;

/// Shared application state, injected into all route handlers via Axum state.
#[derive(Clone)]
pub struct AppState {
    pub bot: Arc<Bot>,
    pub channel_token: Arc<str>,
}

impl AppState {
    pub fn new(bot: Bot, channel_token: &str) -> Self {
        Self {
            bot: Arc::new(bot),
            channel_token: Arc::from(channel_token),
        }
    }
}

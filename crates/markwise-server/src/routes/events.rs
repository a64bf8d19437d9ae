use axum::Json;
use axum::extract::State;
use markwise_bot::{Event, Reply};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

const MAX_PARTICIPANT_ID_LEN: usize = 256;

#[derive(Debug, Deserialize)]
pub struct InboundEvent {
    pub participant_id: String,
    pub event: Event,
}

#[derive(Debug, Serialize)]
pub struct OutboundReply {
    pub participant_id: String,
    pub reply: Reply,
}

/// Run one conversational event through the bot.
pub async fn post_event(
    State(state): State<AppState>,
    Json(inbound): Json<InboundEvent>,
) -> Result<Json<OutboundReply>, ApiError> {
    let participant_id = inbound.participant_id.trim();
    if participant_id.is_empty() {
        return Err(ApiError::BadRequest(
            "participant_id must not be empty".to_string(),
        ));
    }
    if participant_id.len() > MAX_PARTICIPANT_ID_LEN {
        return Err(ApiError::BadRequest(format!(
            "participant_id longer than {MAX_PARTICIPANT_ID_LEN} bytes"
        )));
    }

    let reply = state.bot.handle(participant_id, inbound.event).await;

    Ok(Json(OutboundReply {
        participant_id: participant_id.to_string(),
        reply,
    }))
}

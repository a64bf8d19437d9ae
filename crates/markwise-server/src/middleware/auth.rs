use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::state::AppState;

pub const CHANNEL_TOKEN_HEADER: &str = "x-channel-token";

/// Channel token middleware.
///
/// Only the configured channel adapter may post events. The shared token is
/// compared in constant time.
pub async fn require_channel_token(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let presented = req
        .headers()
        .get(CHANNEL_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let expected = state.channel_token.as_bytes();
    if presented.is_empty() || !constant_time_eq(presented.as_bytes(), expected) {
        tracing::warn!(
            path = %req.uri().path(),
            "rejected request without a valid channel token"
        );
        return ApiError::Unauthorized("invalid channel token".to_string()).into_response();
    }

    next.run(req).await
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

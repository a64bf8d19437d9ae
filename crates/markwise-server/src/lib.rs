//! markwise-server
//!
//! HTTP front for the conversation bot. A channel adapter posts
//! `(participant, event)` pairs to `/events` and relays the reply.

use axum::Router;
use axum::middleware as axum_mw;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use state::AppState;

/// Inbound events are short chat messages.
const MAX_BODY_BYTES: usize = 64 * 1024;

pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/events", post(routes::events::post_event))
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth::require_channel_token,
        ));

    Router::new()
        // Health (no auth)
        .route("/health", get(routes::health::health_check))
        .merge(protected)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(axum_mw::from_fn(middleware::audit::audit_log))
        .with_state(state)
}

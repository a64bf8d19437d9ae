use std::sync::Arc;

use eyre::WrapErr;
use markwise_auth::IdentityStore;
use markwise_bot::{Bot, BotConfig};
use markwise_grading::TokenCosineSimilarity;
use markwise_server::config::ServerConfig;
use markwise_server::state::AppState;
use markwise_storage::{Bucket, RetryPolicy};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Structured JSON logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = ServerConfig::from_env()?;

    let retry = RetryPolicy {
        max_attempts: config.storage_retries,
        ..RetryPolicy::default()
    };
    let storage_dir = &config.storage_dir;
    let bucket = Bucket::open(storage_dir, retry)
        .await
        .wrap_err_with(|| format!("opening storage at {}", storage_dir.display()))?;
    let bucket = Arc::new(bucket);
    let identity = IdentityStore::new(bucket.clone()).await?;

    let bot = Bot::new(
        bucket,
        identity,
        Arc::new(TokenCosineSimilarity),
        BotConfig {
            admin_id: config.admin_id.clone(),
            locale: config.locale.clone(),
            resubmission: config.resubmission,
        },
    );

    let state = AppState::new(bot, &config.channel_token);
    let app = markwise_server::app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .wrap_err_with(|| format!("binding {}", config.bind_addr))?;
    tracing::info!(
        addr = %config.bind_addr,
        storage = %config.storage_dir.display(),
        resubmission = %config.resubmission,
        "markwise listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

use anyhow::{Context, Result};
use axum::{response::Json, routing::get, Router};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use guardian_server::config::Config;
use guardian_server::github::GitHubClient;
use guardian_server::openai::OpenAIClient;
use guardian_server::webhook::webhook_router;
use guardian_server::AppState;

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "app": "pr-guardian"
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    let filter =
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting PR Guardian webhook server");

    if config.allow_unsigned_webhooks {
        tracing::warn!(
            "ALLOW_UNSIGNED_WEBHOOKS is enabled - unsigned deliveries will be accepted"
        );
    }

    let github_client = GitHubClient::new(config.github_app_id, config.github_private_key);
    let openai_client = OpenAIClient::new(config.openai_api_key);

    let app_state = Arc::new(AppState {
        github_client,
        openai_client,
        webhook_secret: config.github_webhook_secret,
        allow_unsigned_webhooks: config.allow_unsigned_webhooks,
    });

    let app = Router::new()
        .route("/", get(root))
        .merge(webhook_router(app_state.clone()))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app_state);

    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .context("Failed to bind listener")?;
    info!("Server listening on port {}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}

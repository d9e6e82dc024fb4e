//! Webhook endpoint: signature gate, event parsing and routing.
//!
//! The signature middleware runs over the raw body before anything parses it
//! as JSON. Events that are not actionable pull-request events are
//! acknowledged without any outbound call.

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use guardian_core::signature::{verify_signature, SignatureError};

use crate::pipeline::{run_review_pipeline, PullRequestContext};
use crate::{AppState, CorrelationId};

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub action: Option<String>,
    pub pull_request: Option<PullRequest>,
    pub installation: Option<Installation>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Installation {
    pub id: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PullRequest {
    pub number: u64,
    pub title: Option<String>,
    pub body: Option<String>,
    pub diff_url: Option<String>,
    pub comments_url: Option<String>,
}

fn ack(msg: &str) -> Response {
    (StatusCode::OK, Json(json!({ "msg": msg }))).into_response()
}

fn reject(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

/// Pull-request actions that trigger a review.
fn is_actionable_action(action: &str) -> bool {
    matches!(action, "opened" | "synchronize" | "reopened")
}

/// Middleware: buffers the raw body, verifies the `X-Hub-Signature-256`
/// header against it, then replays the body to the handler with a delivery
/// correlation id attached.
async fn verify_webhook_signature(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|_| reject(StatusCode::BAD_REQUEST, "Failed to read request body"))?;

    let signature = parts
        .headers
        .get("x-hub-signature-256")
        .and_then(|h| h.to_str().ok());

    match verify_signature(&bytes, signature, state.webhook_secret.as_bytes()) {
        Ok(()) => {}
        Err(SignatureError::Missing) if state.allow_unsigned_webhooks => {
            warn!("Missing X-Hub-Signature-256 header - accepting unsigned delivery (dev mode)");
        }
        Err(err @ (SignatureError::Missing | SignatureError::Invalid)) => {
            warn!("Rejecting webhook: {}", err);
            return Err(reject(StatusCode::UNAUTHORIZED, "Invalid signature"));
        }
        Err(err @ SignatureError::Malformed) => {
            warn!("Rejecting webhook: {}", err);
            return Err(reject(StatusCode::BAD_REQUEST, "Invalid signature format"));
        }
        Err(err @ SignatureError::UnsupportedAlgorithm(_)) => {
            warn!("Rejecting webhook: {}", err);
            return Err(reject(StatusCode::BAD_REQUEST, "Unsupported hash algorithm"));
        }
    }

    // GitHub stamps each delivery with a unique id; fall back to a fresh one
    // so log lines always correlate.
    let delivery_id = parts
        .headers
        .get("x-github-delivery")
        .and_then(|h| h.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut request = Request::from_parts(parts, Body::from(bytes));
    request.extensions_mut().insert(CorrelationId(delivery_id));

    Ok(next.run(request).await)
}

pub async fn github_webhook_handler(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Response {
    let correlation_id = request
        .extensions()
        .get::<CorrelationId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();

    let event = request
        .headers()
        .get("x-github-event")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("")
        .to_string();

    let (_parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => return reject(StatusCode::BAD_REQUEST, "Failed to read request body"),
    };

    let payload: WebhookPayload = match serde_json::from_slice(&bytes) {
        Ok(payload) => payload,
        Err(err) => {
            warn!("Invalid JSON payload: {}", err);
            return reject(StatusCode::BAD_REQUEST, "Invalid JSON");
        }
    };

    info!("Received webhook event: {} (delivery {})", event, correlation_id);

    match event.as_str() {
        "ping" => ack("pong"),
        "installation" => {
            info!("Installation event: {:?}", payload.action);
            ack("installation event ok")
        }
        "pull_request" => handle_pull_request(&state, payload).await,
        other => {
            info!("Unhandled event: {}", other);
            ack(&format!("unhandled event {}", other))
        }
    }
}

async fn handle_pull_request(state: &AppState, payload: WebhookPayload) -> Response {
    let action = payload.action.as_deref().unwrap_or("");

    if !is_actionable_action(action) {
        info!("Ignoring PR action: {}", action);
        return ack(&format!("ignored action {}", action));
    }

    let ctx = match project_pull_request(payload) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };

    match run_review_pipeline(state, ctx).await {
        Ok(()) => ack("AI review posted"),
        Err(err) => {
            error!("Pipeline stage {} failed: {}", err.stage(), err);
            reject(StatusCode::INTERNAL_SERVER_ERROR, err.detail())
        }
    }
}

/// Projects the payload into a [`PullRequestContext`], failing fast (before
/// any outbound call) when a required field is absent.
fn project_pull_request(payload: WebhookPayload) -> Result<PullRequestContext, Response> {
    let installation_id = payload
        .installation
        .as_ref()
        .map(|installation| installation.id)
        .ok_or_else(|| {
            error!("No installation id in payload");
            reject(StatusCode::BAD_REQUEST, "Missing installation id")
        })?;

    let pr = payload.pull_request.ok_or_else(|| {
        warn!("No pull request information in payload");
        reject(StatusCode::BAD_REQUEST, "Missing pull request data")
    })?;

    let (Some(diff_url), Some(comments_url)) = (pr.diff_url, pr.comments_url) else {
        warn!("Pull request payload missing diff or comments URL");
        return Err(reject(StatusCode::BAD_REQUEST, "Missing pull request data"));
    };

    Ok(PullRequestContext {
        number: pr.number,
        title: pr.title.unwrap_or_default(),
        body: pr.body,
        diff_url,
        comments_url,
        installation_id,
    })
}

pub fn webhook_router(middleware_state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/webhook", post(github_webhook_handler))
        .route_layer(middleware::from_fn_with_state(
            middleware_state,
            verify_webhook_signature,
        ))
}

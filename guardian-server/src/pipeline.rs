//! The review pipeline: one inbound pull-request event in, one posted
//! comment out.
//!
//! Stages run in a fixed order — authenticate, fetch diff, generate review,
//! publish — each attempted at most once. A failure aborts the run; later
//! stages never execute and nothing is rolled back.

use guardian_core::review::assemble_comment;
use tracing::info;

use crate::error::{GenerationError, PipelineError};
use crate::AppState;

/// Everything the pipeline needs about one pull request, projected from the
/// webhook payload before any outbound call is made.
#[derive(Debug, Clone)]
pub struct PullRequestContext {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub diff_url: String,
    pub comments_url: String,
    pub installation_id: u64,
}

/// Runs the four-stage review pipeline for one pull-request event.
///
/// The installation token minted in the first stage lives only for this run.
pub async fn run_review_pipeline(
    state: &AppState,
    ctx: PullRequestContext,
) -> Result<(), PipelineError> {
    info!(
        "Starting review pipeline for PR #{} (installation {})",
        ctx.number, ctx.installation_id
    );

    let token = state
        .github_client
        .create_installation_token(ctx.installation_id)
        .await?;

    let diff = state.github_client.fetch_diff(&ctx.diff_url, &token).await?;

    // Generation is the long pole; run it on its own task so this handler
    // only suspends its own continuation while the call is pending.
    let openai_client = state.openai_client.clone();
    let title = ctx.title.clone();
    let body = ctx.body.clone();
    let review = tokio::spawn(async move {
        openai_client
            .generate_review(&diff, &title, body.as_deref())
            .await
    })
    .await
    .map_err(GenerationError::Join)??;

    let comment_body = assemble_comment(&review);
    state
        .github_client
        .post_comment(&ctx.comments_url, &token, &comment_body)
        .await?;

    info!("Review pipeline completed for PR #{}", ctx.number);
    Ok(())
}

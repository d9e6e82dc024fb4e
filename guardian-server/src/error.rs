//! Failure taxonomy for the review pipeline.
//!
//! Each pipeline stage has its own error kind so the orchestrator can log
//! the failing stage and map it to a stage-specific server error without
//! echoing upstream response bodies back to the webhook sender.

use reqwest::StatusCode;
use thiserror::Error;

/// App JWT minting or installation-token exchange failed.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to parse app private key")]
    KeyLoad(#[source] jsonwebtoken::errors::Error),
    #[error("failed to sign app JWT")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("installation token exchange returned {status}")]
    TokenExchange { status: StatusCode, body: String },
    #[error("installation token request failed")]
    Transport(#[source] reqwest::Error),
}

/// Fetching the pull-request diff failed.
#[derive(Debug, Error)]
pub enum DiffFetchError {
    #[error("diff fetch returned {status}")]
    Status { status: StatusCode },
    #[error("diff redirect response carried no Location header")]
    RedirectMissingLocation,
    #[error("diff request failed")]
    Transport(#[source] reqwest::Error),
}

/// The AI review call failed.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("review generation returned {status}")]
    Status { status: StatusCode, body: String },
    #[error("review generation request failed")]
    Transport(#[source] reqwest::Error),
    #[error("review generation returned no choices")]
    EmptyResponse,
    #[error("review generation task did not complete")]
    Join(#[source] tokio::task::JoinError),
}

/// Posting the review comment failed.
#[derive(Debug, Error)]
pub enum CommentPostError {
    #[error("comment post returned {status}")]
    Status { status: StatusCode },
    #[error("comment post request failed")]
    Transport(#[source] reqwest::Error),
}

/// A pipeline run aborted at one of its four stages.
///
/// Later stages are never attempted after a failure, and nothing is rolled
/// back: an already-issued token is simply discarded.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    DiffFetch(#[from] DiffFetchError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    CommentPost(#[from] CommentPostError),
}

impl PipelineError {
    /// Stage identity, used in log lines.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Credential(_) => "authenticating",
            PipelineError::DiffFetch(_) => "diff_fetching",
            PipelineError::Generation(_) => "reviewing",
            PipelineError::CommentPost(_) => "publishing",
        }
    }

    /// Stage-specific detail message for the 500 response. Deliberately
    /// coarse: upstream status codes and bodies stay in the server logs.
    pub fn detail(&self) -> &'static str {
        match self {
            PipelineError::Credential(_) => "Failed to create installation token",
            PipelineError::DiffFetch(_) => "Failed to fetch PR diff",
            PipelineError::Generation(_) => "Failed to generate AI review",
            PipelineError::CommentPost(_) => "Failed to post PR comment",
        }
    }
}

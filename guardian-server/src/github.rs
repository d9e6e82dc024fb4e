//! GitHub App client: app JWT minting, installation-token exchange, diff
//! retrieval and comment posting.
//!
//! Credentials are request-scoped. Every orchestration run mints a fresh app
//! JWT and exchanges it for a fresh installation token; nothing is cached
//! across runs or installations.

use jsonwebtoken::{encode, get_current_timestamp, Algorithm, EncodingKey, Header};
use reqwest::header;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{error, info};

use crate::error::{CommentPostError, CredentialError, DiffFetchError};

const GITHUB_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "PR-Guardian-AI";

/// Upper bound on any single outbound call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Scoped, time-limited credential for one app installation.
///
/// Treated as a capability: held for the duration of one orchestration run,
/// never persisted, and never printed in full.
#[derive(Clone)]
pub struct InstallationToken(String);

impl InstallationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    fn authorization_value(&self) -> String {
        format!("token {}", self.0)
    }
}

impl fmt::Debug for InstallationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InstallationToken(***)")
    }
}

#[derive(Debug, Serialize)]
struct AppClaims {
    iss: u64,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct InstallationTokenResponse {
    token: String,
}

#[derive(Debug, Serialize)]
struct CreateCommentRequest {
    body: String,
}

#[derive(Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    app_id: u64,
    private_key: String,
    api_base: String,
}

impl GitHubClient {
    pub fn new(app_id: u64, private_key: String) -> Self {
        Self::with_api_base(app_id, private_key, GITHUB_API_BASE.to_string())
    }

    /// Point the client at a different API origin (GitHub Enterprise, or a
    /// mock server in tests). Diff and comment URLs come from event payloads
    /// and are unaffected.
    pub fn with_api_base(app_id: u64, private_key: String, api_base: String) -> Self {
        // Redirects stay manual: the diff retriever follows exactly one hop
        // itself, with the same auth headers.
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            app_id,
            private_key,
            api_base,
        }
    }

    /// Mints a short-lived RS256 JWT identifying the app.
    ///
    /// `iat` is backdated 60 seconds to tolerate clock skew; the assertion
    /// expires after 10 minutes, GitHub's maximum.
    fn generate_app_jwt(&self) -> Result<String, CredentialError> {
        let now = get_current_timestamp();

        let claims = AppClaims {
            iss: self.app_id,
            iat: now - 60,
            exp: now + 600,
        };

        let encoding_key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(CredentialError::KeyLoad)?;

        encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
            .map_err(CredentialError::Signing)
    }

    /// Exchanges a fresh app JWT for an installation access token.
    pub async fn create_installation_token(
        &self,
        installation_id: u64,
    ) -> Result<InstallationToken, CredentialError> {
        let jwt = self.generate_app_jwt()?;
        let url = format!(
            "{}/app/installations/{}/access_tokens",
            self.api_base, installation_id
        );

        info!("Requesting installation access token");

        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", jwt))
            .header(header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(CredentialError::Transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Installation token exchange failed: {} - {}", status, body);
            return Err(CredentialError::TokenExchange { status, body });
        }

        let token_response: InstallationTokenResponse = response
            .json()
            .await
            .map_err(CredentialError::Transport)?;

        info!("Installation access token created");
        Ok(InstallationToken(token_response.token))
    }

    fn diff_request(&self, url: &str, token: &InstallationToken) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header(header::AUTHORIZATION, token.authorization_value())
            .header(header::ACCEPT, "application/vnd.github.v3.diff")
    }

    /// Fetches the pull request's unified diff.
    ///
    /// GitHub serves diffs from a storage backend that may answer with a
    /// redirect; one hop is followed with identical headers. A redirect
    /// without a Location header is an error, as is any terminal non-2xx.
    pub async fn fetch_diff(
        &self,
        diff_url: &str,
        token: &InstallationToken,
    ) -> Result<String, DiffFetchError> {
        info!("Fetching diff from: {}", diff_url);

        let mut response = self
            .diff_request(diff_url, token)
            .send()
            .await
            .map_err(DiffFetchError::Transport)?;

        if response.status().is_redirection() {
            let location = response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
                .ok_or(DiffFetchError::RedirectMissingLocation)?;

            info!("Following diff redirect");
            response = self
                .diff_request(&location, token)
                .send()
                .await
                .map_err(DiffFetchError::Transport)?;
        }

        if !response.status().is_success() {
            let status = response.status();
            error!("Diff fetch failed: {}", status);
            return Err(DiffFetchError::Status { status });
        }

        let diff = response.text().await.map_err(DiffFetchError::Transport)?;
        info!("Fetched diff ({} bytes)", diff.len());
        Ok(diff)
    }

    /// Posts a comment on the pull request via its issue comments URL.
    ///
    /// Not idempotent: a redelivered webhook produces a duplicate comment.
    pub async fn post_comment(
        &self,
        comments_url: &str,
        token: &InstallationToken,
        body: &str,
    ) -> Result<(), CommentPostError> {
        info!("Posting review comment");

        let response = self
            .client
            .post(comments_url)
            .header(header::AUTHORIZATION, token.authorization_value())
            .header(header::ACCEPT, "application/vnd.github+json")
            .json(&CreateCommentRequest {
                body: body.to_string(),
            })
            .send()
            .await
            .map_err(CommentPostError::Transport)?;

        if !response.status().is_success() {
            let status = response.status();
            error!("Comment post failed: {}", status);
            return Err(CommentPostError::Status { status });
        }

        info!("Review comment posted");
        Ok(())
    }
}

//! auth::oauth
//!
//! OAuth web flow client for GitHub.
//!
//! # Web Flow Overview
//!
//! 1. `/login` redirects the browser to GitHub's authorize URL with
//!    `scope=repo` and the configured `state`
//! 2. GitHub redirects back to `/github_callback?code=...&state=...`
//! 3. The server checks `state`, exchanges `code` for an access token
//!    (this step needs the client secret)
//! 4. The server calls `GET /user` with the token to learn who logged in
//!
//! # Example
//!
//! ```ignore
//! use foundry_editor::auth::OAuthClient;
//!
//! let oauth = OAuthClient::new(reqwest::Client::new(), credentials, "https://github.com", "https://api.github.com");
//! let redirect_to = oauth.authorize_url()?;
//! // ... later, in the callback:
//! let token = oauth.exchange_code(&code).await?;
//! let user = oauth.fetch_user(&token).await?;
//! ```

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use super::errors::AuthError;
use crate::core::config::OAuthCredentials;

/// Scopes requested from GitHub. Opening pull requests needs `repo`.
pub const DEFAULT_SCOPES: &str = "repo";

/// User-Agent header for OAuth requests.
const USER_AGENT: &str = "foundry-editor";

/// Successful token response from GitHub.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    /// The access token (starts with "gho_").
    pub access_token: String,

    /// Token type (always "bearer").
    #[serde(default)]
    pub token_type: String,

    /// Granted scopes, comma separated.
    #[serde(default)]
    pub scope: String,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Error response from GitHub OAuth endpoints.
#[derive(Debug, Clone, Deserialize)]
struct OAuthError {
    /// Error code.
    error: String,

    /// Human-readable description.
    error_description: Option<String>,
}

/// Request body for the code exchange.
#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

/// The authenticated GitHub user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitHubUser {
    /// GitHub user ID (stable across renames).
    pub id: u64,

    /// GitHub username.
    pub login: String,
}

/// Client for the GitHub OAuth web flow.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    client: Client,
    credentials: OAuthCredentials,
    /// Web base, e.g. `https://github.com`.
    oauth_base: String,
    /// API base, e.g. `https://api.github.com`.
    api_base: String,
}

impl OAuthClient {
    pub fn new(
        client: Client,
        credentials: OAuthCredentials,
        oauth_base: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            client,
            credentials,
            oauth_base: oauth_base.into().trim_end_matches('/').to_string(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Get the authorize endpoint URL.
    fn authorize_endpoint(&self) -> String {
        format!("{}/login/oauth/authorize", self.oauth_base)
    }

    /// Get the token endpoint URL.
    fn token_url(&self) -> String {
        format!("{}/login/oauth/access_token", self.oauth_base)
    }

    /// Build headers for OAuth requests.
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(USER_AGENT),
        );
        headers
    }

    /// URL the browser is sent to in order to authorize the application.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::OAuth`] if the configured OAuth base is not a URL.
    pub fn authorize_url(&self) -> Result<String, AuthError> {
        let url = Url::parse_with_params(
            &self.authorize_endpoint(),
            &[
                ("client_id", self.credentials.client_id.as_str()),
                ("scope", DEFAULT_SCOPES),
                ("state", self.credentials.state.as_str()),
            ],
        )
        .map_err(|e| AuthError::OAuth(format!("invalid authorize URL: {}", e)))?;
        Ok(url.to_string())
    }

    /// Check the `state` returned to the callback.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::StateMismatch`] when absent or different.
    pub fn verify_state(&self, state: Option<&str>) -> Result<(), AuthError> {
        match state {
            Some(s) if s == self.credentials.state => Ok(()),
            _ => Err(AuthError::StateMismatch),
        }
    }

    /// Exchange an authorization code for an access token.
    ///
    /// GitHub reports a bad code with a 200 response carrying an `error`
    /// field, so the body is inspected rather than the status.
    ///
    /// # Errors
    ///
    /// - [`AuthError::OAuth`] if GitHub rejects the code
    /// - [`AuthError::Network`] if there's a network error
    /// - [`AuthError::GitHubApi`] for any other unexpected response
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AuthError> {
        let request = TokenRequest {
            client_id: &self.credentials.client_id,
            client_secret: &self.credentials.client_secret,
            code,
        };

        let response = self
            .client
            .post(self.token_url())
            .headers(self.headers())
            .form(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if let Ok(tokens) = serde_json::from_str::<TokenResponse>(&body) {
            return Ok(tokens);
        }

        if let Ok(err) = serde_json::from_str::<OAuthError>(&body) {
            Err(AuthError::OAuth(format!(
                "{}: {}",
                err.error,
                err.error_description.unwrap_or_default()
            )))
        } else {
            Err(AuthError::GitHubApi {
                status: status.as_u16(),
                message: format!("unexpected token response ({} bytes)", body.len()),
            })
        }
    }

    /// Fetch user info using an access token.
    ///
    /// Calls `GET /user` to get the authenticated user's ID and login.
    pub async fn fetch_user(&self, access_token: &str) -> Result<GitHubUser, AuthError> {
        let url = format!("{}/user", self.api_base);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", access_token),
            )
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&body)
                .map_err(|e| AuthError::OAuth(format!("failed to parse user info: {}", e)))
        } else {
            Err(AuthError::GitHubApi {
                status: status.as_u16(),
                message: body,
            })
        }
    }
}

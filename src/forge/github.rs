//! forge::github
//!
//! GitHub forge implementation using the REST API.
//!
//! # Design
//!
//! This module implements the `Forge` trait for GitHub. Each instance is
//! bound to one repository and one user's OAuth access token. It uses:
//! - `GET /repos/{o}/{r}` for the default branch
//! - the git refs API to read branch heads and create branches
//! - the contents API to read, list and commit files
//! - the pulls API to open pull requests
//!
//! File content travels base64-encoded; this module encodes and decodes it
//! so callers only ever see plain text.
//!
//! # Rate Limiting
//!
//! Returns `ForgeError::RateLimited` when limits are hit. Nothing is
//! retried.
//!
//! # Example
//!
//! ```ignore
//! use foundry_editor::forge::github::GitHubForge;
//! use foundry_editor::forge::Forge;
//!
//! let forge = GitHubForge::new(reqwest::Client::new(), token, "OBOFoundry", "purl.obolibrary.org");
//! let master = forge.default_branch().await?;
//! let sha = forge.branch_sha(&master).await?;
//! ```

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::traits::{
    CommitInfo, CreatePrRequest, DirectoryEntry, EntryKind, FileContent, Forge, ForgeError,
    PullRequest, PutFileRequest,
};
use crate::core::types::BranchName;

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// User-Agent header value for API requests.
pub const USER_AGENT_VALUE: &str = "foundry-editor";

/// GitHub forge implementation.
///
/// Implements the `Forge` trait for GitHub using the REST API.
pub struct GitHubForge {
    /// HTTP client for making requests
    client: Client,
    /// The user's OAuth access token
    token: String,
    /// Repository owner (user or organization)
    owner: String,
    /// Repository name
    repo: String,
    /// API base URL (configurable for GitHub Enterprise and tests)
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubForge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubForge")
            .field("has_token", &!self.token.is_empty())
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubForge {
    /// Create a forge for `owner/repo` on github.com.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client
    /// * `token` - OAuth access token of the acting user
    /// * `owner` - Repository owner
    /// * `repo` - Repository name
    pub fn new(
        client: Client,
        token: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        Self {
            client,
            token: token.into(),
            owner: owner.into(),
            repo: repo.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Use a different API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Get the repository owner.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Get the repository name.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Build common headers for API requests.
    fn headers(&self) -> Result<HeaderMap, ForgeError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| ForgeError::AuthFailed("access token is not a valid header".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, path: &str) -> String {
        if path.is_empty() {
            format!("{}/repos/{}/{}", self.api_base, self.owner, self.repo)
        } else {
            format!(
                "{}/repos/{}/{}/{}",
                self.api_base, self.owner, self.repo, path
            )
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, ForgeError> {
        request
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T, ForgeError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            self.handle_error_response(response, status).await
        }
    }

    /// Handle an error response from the API.
    async fn handle_error_response<T>(
        &self,
        response: Response,
        status: StatusCode,
    ) -> Result<T, ForgeError> {
        let required_scopes = response
            .headers()
            .get("X-Accepted-OAuth-Scopes")
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        let message = match response.json::<GitHubErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => "Unknown error".to_string(),
        };

        Err(match status {
            StatusCode::UNAUTHORIZED => ForgeError::AuthFailed("Invalid or expired token".into()),
            StatusCode::FORBIDDEN => {
                let mut err_msg = format!("Permission denied: {}", message);
                if let Some(scopes) = required_scopes {
                    err_msg.push_str(&format!(" [required scopes: {}]", scopes));
                }
                ForgeError::AuthFailed(err_msg)
            }
            StatusCode::NOT_FOUND => ForgeError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => ForgeError::RateLimited,
            _ if status.is_server_error() => ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("GitHub server error: {}", message),
            },
            _ => ForgeError::ApiError {
                status: status.as_u16(),
                message,
            },
        })
    }
}

#[async_trait]
impl Forge for GitHubForge {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn default_branch(&self) -> Result<BranchName, ForgeError> {
        let response = self.send(self.client.get(self.repo_url(""))).await?;
        let repo: GitHubRepository = self.handle_response(response).await?;
        BranchName::new(repo.default_branch).map_err(|e| ForgeError::ApiError {
            status: 200,
            message: e.to_string(),
        })
    }

    async fn branch_sha(&self, branch: &BranchName) -> Result<String, ForgeError> {
        let url = self.repo_url(&format!("git/ref/heads/{}", branch));
        let response = self.send(self.client.get(&url)).await?;
        let git_ref: GitHubGitRef = self.handle_response(response).await?;
        Ok(git_ref.object.sha)
    }

    async fn create_branch(&self, branch: &BranchName, sha: &str) -> Result<(), ForgeError> {
        let body = CreateRefBody {
            git_ref: &branch.as_ref_path(),
            sha,
        };
        let response = self
            .send(self.client.post(self.repo_url("git/refs")).json(&body))
            .await?;
        let _created: GitHubGitRef = self.handle_response(response).await?;
        Ok(())
    }

    async fn get_file(
        &self,
        path: &str,
        branch: Option<&BranchName>,
    ) -> Result<FileContent, ForgeError> {
        let mut request = self.client.get(self.repo_url(&format!("contents/{}", path)));
        if let Some(branch) = branch {
            request = request.query(&[("ref", branch.as_str())]);
        }
        let response = self.send(request).await?;
        let file: GitHubContentFile = self.handle_response(response).await?;

        let encoded = file.content.ok_or_else(|| ForgeError::ApiError {
            status: 200,
            message: format!("no inline content returned for {}", file.path),
        })?;
        let content = decode_content(&encoded)?;

        Ok(FileContent {
            name: file.name,
            path: file.path,
            sha: file.sha,
            content,
        })
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<DirectoryEntry>, ForgeError> {
        let url = self.repo_url(&format!("contents/{}", path));
        let response = self.send(self.client.get(&url)).await?;
        let entries: Vec<GitHubContentEntry> = self.handle_response(response).await?;

        Ok(entries
            .into_iter()
            .map(|e| DirectoryEntry {
                kind: match e.entry_type.as_str() {
                    "file" => EntryKind::File,
                    "dir" => EntryKind::Dir,
                    _ => EntryKind::Other,
                },
                name: e.name,
                path: e.path,
                sha: e.sha,
            })
            .collect())
    }

    async fn put_file(&self, request: PutFileRequest) -> Result<CommitInfo, ForgeError> {
        let url = self.repo_url(&format!("contents/{}", request.path));
        let encoded = STANDARD.encode(request.content.as_bytes());
        let body = PutContentBody {
            message: &request.message,
            content: &encoded,
            branch: request.branch.as_str(),
            sha: request.sha.as_deref(),
        };

        let response = self.send(self.client.put(&url).json(&body)).await?;
        let result: GitHubPutContentResponse = self.handle_response(response).await?;

        Ok(CommitInfo {
            commit_sha: result.commit.sha,
            content_sha: result.content.sha,
        })
    }

    async fn create_pr(&self, request: CreatePrRequest) -> Result<PullRequest, ForgeError> {
        let body = CreatePrBody {
            head: &request.head,
            base: &request.base,
            title: &request.title,
            body: request.body.as_deref(),
            draft: request.draft,
        };

        let response = self
            .send(self.client.post(self.repo_url("pulls")).json(&body))
            .await?;
        let raw: Value = self.handle_response(response).await?;
        pull_request_from_value(raw)
    }
}

/// Decode base64 file content as returned by the contents API.
///
/// GitHub wraps the encoded text at 60 columns, so whitespace is removed
/// before decoding.
pub fn decode_content(encoded: &str) -> Result<String, ForgeError> {
    let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(cleaned).map_err(|e| ForgeError::ApiError {
        status: 200,
        message: format!("invalid base64 content: {}", e),
    })?;
    String::from_utf8(bytes).map_err(|_| ForgeError::ApiError {
        status: 200,
        message: "file content is not valid UTF-8".into(),
    })
}

fn pull_request_from_value(raw: Value) -> Result<PullRequest, ForgeError> {
    let pr: GitHubPullRequest =
        serde_json::from_value(raw.clone()).map_err(|e| ForgeError::ApiError {
            status: 201,
            message: format!("Failed to parse response: {}", e),
        })?;

    Ok(PullRequest {
        number: pr.number,
        url: pr.html_url,
        is_draft: pr.draft.unwrap_or(false),
        head: pr.head.ref_name,
        base: pr.base.ref_name,
        title: pr.title,
        raw,
    })
}

// --------------------------------------------------------------------------
// API Request/Response Types
// --------------------------------------------------------------------------

/// Request body for creating a ref.
#[derive(Serialize)]
struct CreateRefBody<'a> {
    #[serde(rename = "ref")]
    git_ref: &'a str,
    sha: &'a str,
}

/// Request body for committing file content.
#[derive(Serialize)]
struct PutContentBody<'a> {
    message: &'a str,
    content: &'a str,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

/// Request body for creating a PR.
#[derive(Serialize)]
struct CreatePrBody<'a> {
    head: &'a str,
    base: &'a str,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
    draft: bool,
}

/// GitHub error response format.
#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

#[derive(Deserialize)]
struct GitHubRepository {
    default_branch: String,
}

#[derive(Deserialize)]
struct GitHubGitRef {
    object: GitHubObject,
}

#[derive(Deserialize)]
struct GitHubObject {
    sha: String,
}

#[derive(Deserialize)]
struct GitHubContentFile {
    name: String,
    path: String,
    sha: String,
    content: Option<String>,
}

#[derive(Deserialize)]
struct GitHubContentEntry {
    name: String,
    path: String,
    sha: String,
    #[serde(rename = "type")]
    entry_type: String,
}

#[derive(Deserialize)]
struct GitHubPutContentResponse {
    content: GitHubObject,
    commit: GitHubObject,
}

#[derive(Deserialize)]
struct GitHubPullRequest {
    number: u64,
    html_url: String,
    title: String,
    draft: Option<bool>,
    head: GitHubBranchRef,
    base: GitHubBranchRef,
}

#[derive(Deserialize)]
struct GitHubBranchRef {
    #[serde(rename = "ref")]
    ref_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forge() -> GitHubForge {
        GitHubForge::new(Client::new(), "token", "octocat", "hello-world")
    }

    mod github_forge {
        use super::*;

        #[test]
        fn new_creates_forge() {
            let forge = forge();
            assert_eq!(forge.name(), "github");
            assert_eq!(forge.owner(), "octocat");
            assert_eq!(forge.repo(), "hello-world");
            assert_eq!(forge.api_base, DEFAULT_API_BASE);
        }

        #[test]
        fn with_api_base_trims_slash() {
            let forge = forge().with_api_base("http://127.0.0.1:8080/");
            assert_eq!(forge.api_base, "http://127.0.0.1:8080");
        }

        #[test]
        fn repo_url_format() {
            let forge = forge();
            assert_eq!(
                forge.repo_url(""),
                "https://api.github.com/repos/octocat/hello-world"
            );
            assert_eq!(
                forge.repo_url("git/refs"),
                "https://api.github.com/repos/octocat/hello-world/git/refs"
            );
        }

        #[test]
        fn debug_redacts_token() {
            let forge = GitHubForge::new(Client::new(), "gho_secret_abc123", "o", "r");
            let debug_output = format!("{:?}", forge);
            assert!(!debug_output.contains("gho_secret_abc123"));
            assert!(debug_output.contains("has_token"));
        }

        #[test]
        fn invalid_token_header_is_auth_error() {
            let forge = GitHubForge::new(Client::new(), "bad\ntoken", "o", "r");
            assert!(matches!(forge.headers(), Err(ForgeError::AuthFailed(_))));
        }
    }

    mod content {
        use super::*;

        #[test]
        fn decode_wrapped_base64() {
            let encoded = "aWRzcGFjZTog\nQUdSTwo=\n";
            assert_eq!(decode_content(encoded).unwrap(), "idspace: AGRO\n");
        }

        #[test]
        fn decode_rejects_garbage() {
            assert!(decode_content("!!!").is_err());
        }

        #[test]
        fn decode_rejects_non_utf8() {
            let encoded = STANDARD.encode([0xff, 0xfe]);
            assert!(decode_content(&encoded).is_err());
        }
    }

    mod request_bodies {
        use super::*;

        #[test]
        fn put_body_omits_sha_when_adding() {
            let body = PutContentBody {
                message: "m",
                content: "Yw==",
                branch: "b",
                sha: None,
            };
            let json = serde_json::to_value(&body).unwrap();
            assert!(json.get("sha").is_none());
            assert_eq!(json["branch"], "b");
        }

        #[test]
        fn put_body_includes_sha_when_updating() {
            let body = PutContentBody {
                message: "m",
                content: "Yw==",
                branch: "b",
                sha: Some("abc"),
            };
            let json = serde_json::to_value(&body).unwrap();
            assert_eq!(json["sha"], "abc");
        }

        #[test]
        fn create_ref_body_uses_ref_key() {
            let body = CreateRefBody {
                git_ref: "refs/heads/x",
                sha: "abc",
            };
            let json = serde_json::to_value(&body).unwrap();
            assert_eq!(json["ref"], "refs/heads/x");
        }
    }

    mod pull_requests {
        use super::*;
        use serde_json::json;

        #[test]
        fn keeps_raw_object() {
            let raw = json!({
                "number": 7,
                "html_url": "https://github.com/o/r/pull/7",
                "title": "t",
                "draft": true,
                "head": {"ref": "feature"},
                "base": {"ref": "master"},
                "extra": {"nested": 1}
            });
            let pr = pull_request_from_value(raw.clone()).unwrap();
            assert_eq!(pr.number, 7);
            assert!(pr.is_draft);
            assert_eq!(pr.head, "feature");
            assert_eq!(pr.raw, raw);
        }

        #[test]
        fn missing_fields_rejected() {
            let raw = json!({"number": 7});
            assert!(matches!(
                pull_request_from_value(raw),
                Err(ForgeError::ApiError { .. })
            ));
        }
    }
}

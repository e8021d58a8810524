//! forge::traits
//!
//! Forge trait definition for interacting with the repository host.
//!
//! # Design
//!
//! The `Forge` trait is async because forge operations involve network I/O.
//! A forge instance is bound to one repository and one user's credentials;
//! every method acts on that repository. All methods return `Result` so a
//! failed call can be reported to the user without retrying.
//!
//! # Example
//!
//! ```ignore
//! use foundry_editor::forge::{Forge, CreatePrRequest};
//!
//! async fn open_pr(forge: &dyn Forge) -> Result<(), ForgeError> {
//!     let base = forge.default_branch().await?;
//!     let pr = forge.create_pr(CreatePrRequest {
//!         head: "alice_AGRO_2024-01-02_030405".to_string(),
//!         base: base.to_string(),
//!         title: "Update AGRO".to_string(),
//!         body: None,
//!         draft: false,
//!     }).await?;
//!     println!("Created PR #{}: {}", pr.number, pr.url);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::core::types::BranchName;

/// Errors from forge operations.
///
/// These error types map to common failure modes when interacting
/// with GitHub. Messages never include access tokens.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ForgeError {
    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error, or a success response without the fields
    /// the operation needs.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ForgeError {
    /// Check if this error means the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ForgeError::NotFound(_))
    }
}

/// A file read from the repository, with its content already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    /// File name (last path segment).
    pub name: String,
    /// Repository-relative path.
    pub path: String,
    /// Blob sha, required to overwrite the file.
    pub sha: String,
    /// Decoded UTF-8 content.
    pub content: String,
}

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Other,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    pub sha: String,
    pub kind: EntryKind,
}

/// Request to create or overwrite a file on a branch.
#[derive(Debug, Clone)]
pub struct PutFileRequest {
    /// Repository-relative path.
    pub path: String,
    /// Branch receiving the commit.
    pub branch: BranchName,
    /// Commit message.
    pub message: String,
    /// New plain-text content; the forge handles transport encoding.
    pub content: String,
    /// Current blob sha. Required when overwriting, absent when adding.
    pub sha: Option<String>,
}

/// Result of committing a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// New commit sha.
    pub commit_sha: String,
    /// Blob sha of the committed file.
    pub content_sha: String,
}

/// Request to create a pull request.
#[derive(Debug, Clone)]
pub struct CreatePrRequest {
    /// Head branch name (the branch with changes)
    pub head: String,
    /// Base branch name (the branch to merge into)
    pub base: String,
    /// PR title
    pub title: String,
    /// PR body/description
    pub body: Option<String>,
    /// Create as draft
    pub draft: bool,
}

/// Pull request information returned from the forge.
#[derive(Debug, Clone, PartialEq)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// PR URL (web URL for viewing)
    pub url: String,
    /// Whether the PR is a draft
    pub is_draft: bool,
    /// Head branch name
    pub head: String,
    /// Base branch name
    pub base: String,
    /// PR title
    pub title: String,
    /// The complete object as returned by the forge, passed back to the
    /// browser untouched.
    pub raw: Value,
}

/// The Forge trait for interacting with the repository host.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// All methods return `Result<T, ForgeError>`. Nothing is retried; callers
/// surface the error to the user.
#[async_trait]
pub trait Forge: Send + Sync {
    /// Get the forge name (e.g., "github").
    fn name(&self) -> &'static str;

    /// Name of the repository's default branch.
    async fn default_branch(&self) -> Result<BranchName, ForgeError>;

    /// Commit sha at the head of `branch`.
    async fn branch_sha(&self, branch: &BranchName) -> Result<String, ForgeError>;

    /// Create `branch` pointing at commit `sha`.
    ///
    /// # Errors
    ///
    /// Fails with `ApiError` (422 on GitHub) if the branch already exists.
    async fn create_branch(&self, branch: &BranchName, sha: &str) -> Result<(), ForgeError>;

    /// Read a file, from `branch` or the default branch when `None`.
    async fn get_file(
        &self,
        path: &str,
        branch: Option<&BranchName>,
    ) -> Result<FileContent, ForgeError>;

    /// List a directory on the default branch.
    async fn list_directory(&self, path: &str) -> Result<Vec<DirectoryEntry>, ForgeError>;

    /// Commit a file to a branch.
    async fn put_file(&self, request: PutFileRequest) -> Result<CommitInfo, ForgeError>;

    /// Create a new pull request.
    async fn create_pr(&self, request: CreatePrRequest) -> Result<PullRequest, ForgeError>;
}

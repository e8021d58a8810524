//! forge::mock
//!
//! Mock forge implementation for deterministic testing.
//!
//! # Design
//!
//! The mock forge keeps a tiny in-memory repository: named branches that
//! point at commit ids, a file tree per branch, and a list of pull
//! requests. Creating a branch copies the tree of whichever branch the
//! starting commit belongs to. Failure scenarios are configured with
//! [`FailOn`], and every call is recorded as a [`MockOperation`].
//!
//! # Example
//!
//! ```
//! use foundry_editor::forge::mock::MockForge;
//! use foundry_editor::forge::{CreatePrRequest, Forge};
//!
//! # tokio_test::block_on(async {
//! let forge = MockForge::new().with_file("config/agro.yml", "idspace: AGRO\n");
//!
//! let master = forge.default_branch().await.unwrap();
//! let file = forge.get_file("config/agro.yml", Some(&master)).await.unwrap();
//! assert_eq!(file.content, "idspace: AGRO\n");
//!
//! let pr = forge.create_pr(CreatePrRequest {
//!     head: "master".to_string(),
//!     base: "master".to_string(),
//!     title: "Update AGRO".to_string(),
//!     body: None,
//!     draft: false,
//! }).await.unwrap();
//! assert_eq!(pr.number, 1);
//! # });
//! ```

use async_trait::async_trait;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::traits::{
    CommitInfo, CreatePrRequest, DirectoryEntry, EntryKind, FileContent, Forge, ForgeError,
    PullRequest, PutFileRequest,
};
use crate::core::types::BranchName;

/// Default branch of a fresh mock repository.
pub const MOCK_DEFAULT_BRANCH: &str = "master";

/// Mock forge for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping. Clones share state.
#[derive(Debug, Clone)]
pub struct MockForge {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockForgeInner>>,
}

#[derive(Debug, Clone)]
struct MockFile {
    sha: String,
    content: String,
}

/// Internal mutable state.
#[derive(Debug)]
struct MockForgeInner {
    default_branch: String,
    /// Branch name to head commit id.
    branches: HashMap<String, String>,
    /// Branch name to file tree, keyed by path.
    trees: HashMap<String, BTreeMap<String, MockFile>>,
    prs: Vec<PullRequest>,
    next_pr_number: u64,
    /// Counter used to mint commit and blob ids.
    next_object: u64,
    /// Method to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

impl MockForgeInner {
    fn mint(&mut self) -> String {
        self.next_object += 1;
        format!("{:040x}", self.next_object)
    }
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    DefaultBranch(ForgeError),
    BranchSha(ForgeError),
    CreateBranch(ForgeError),
    GetFile(ForgeError),
    ListDirectory(ForgeError),
    PutFile(ForgeError),
    CreatePr(ForgeError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq)]
pub enum MockOperation {
    DefaultBranch,
    BranchSha {
        branch: String,
    },
    CreateBranch {
        branch: String,
        sha: String,
    },
    GetFile {
        path: String,
        branch: Option<String>,
    },
    ListDirectory {
        path: String,
    },
    PutFile {
        path: String,
        branch: String,
        message: String,
        content: String,
        sha: Option<String>,
    },
    CreatePr {
        head: String,
        base: String,
        title: String,
        body: Option<String>,
        draft: bool,
    },
}

impl MockForge {
    /// Create a mock repository with an empty `master` branch.
    pub fn new() -> Self {
        let mut inner = MockForgeInner {
            default_branch: MOCK_DEFAULT_BRANCH.to_string(),
            branches: HashMap::new(),
            trees: HashMap::new(),
            prs: Vec::new(),
            next_pr_number: 1,
            next_object: 0,
            fail_on: None,
            operations: Vec::new(),
        };
        let head = inner.mint();
        inner.branches.insert(MOCK_DEFAULT_BRANCH.to_string(), head);
        inner
            .trees
            .insert(MOCK_DEFAULT_BRANCH.to_string(), BTreeMap::new());

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Seed a file on the default branch.
    pub fn with_file(self, path: impl Into<String>, content: impl Into<String>) -> Self {
        {
            let mut inner = self.lock();
            let sha = inner.mint();
            let branch = inner.default_branch.clone();
            inner.trees.entry(branch).or_default().insert(
                path.into(),
                MockFile {
                    sha,
                    content: content.into(),
                },
            );
        }
        self
    }

    /// Configure the mock to fail on a specific operation.
    ///
    /// # Example
    ///
    /// ```
    /// use foundry_editor::forge::mock::{MockForge, FailOn};
    /// use foundry_editor::forge::ForgeError;
    ///
    /// let forge = MockForge::new()
    ///     .fail_on(FailOn::CreatePr(ForgeError::RateLimited));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.lock().fail_on = Some(fail_on);
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        self.lock().fail_on = None;
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        self.lock().operations.clear();
    }

    /// Content of `path` on `branch`, if present.
    pub fn file_on(&self, branch: &str, path: &str) -> Option<String> {
        self.lock()
            .trees
            .get(branch)
            .and_then(|tree| tree.get(path))
            .map(|f| f.content.clone())
    }

    /// Names of all branches, sorted.
    pub fn branches(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().branches.keys().cloned().collect();
        names.sort();
        names
    }

    /// All PRs in creation order.
    pub fn all_prs(&self) -> Vec<PullRequest> {
        self.lock().prs.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockForgeInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, op: MockOperation) {
        self.lock().operations.push(op);
    }

    /// Check if we should fail and return the error if so.
    fn check_fail<T>(&self, expected: &str) -> Option<Result<T, ForgeError>> {
        let inner = self.lock();
        match &inner.fail_on {
            Some(FailOn::DefaultBranch(e)) if expected == "default_branch" => Some(Err(e.clone())),
            Some(FailOn::BranchSha(e)) if expected == "branch_sha" => Some(Err(e.clone())),
            Some(FailOn::CreateBranch(e)) if expected == "create_branch" => Some(Err(e.clone())),
            Some(FailOn::GetFile(e)) if expected == "get_file" => Some(Err(e.clone())),
            Some(FailOn::ListDirectory(e)) if expected == "list_directory" => Some(Err(e.clone())),
            Some(FailOn::PutFile(e)) if expected == "put_file" => Some(Err(e.clone())),
            Some(FailOn::CreatePr(e)) if expected == "create_pr" => Some(Err(e.clone())),
            _ => None,
        }
    }
}

impl Default for MockForge {
    fn default() -> Self {
        Self::new()
    }
}

fn unprocessable(message: impl Into<String>) -> ForgeError {
    ForgeError::ApiError {
        status: 422,
        message: message.into(),
    }
}

#[async_trait]
impl Forge for MockForge {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn default_branch(&self) -> Result<BranchName, ForgeError> {
        self.record(MockOperation::DefaultBranch);
        if let Some(result) = self.check_fail("default_branch") {
            return result;
        }

        let name = self.lock().default_branch.clone();
        BranchName::new(name).map_err(|e| unprocessable(e.to_string()))
    }

    async fn branch_sha(&self, branch: &BranchName) -> Result<String, ForgeError> {
        self.record(MockOperation::BranchSha {
            branch: branch.to_string(),
        });
        if let Some(result) = self.check_fail("branch_sha") {
            return result;
        }

        self.lock()
            .branches
            .get(branch.as_str())
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("branch {}", branch)))
    }

    async fn create_branch(&self, branch: &BranchName, sha: &str) -> Result<(), ForgeError> {
        self.record(MockOperation::CreateBranch {
            branch: branch.to_string(),
            sha: sha.to_string(),
        });
        if let Some(result) = self.check_fail("create_branch") {
            return result;
        }

        let mut inner = self.lock();
        if inner.branches.contains_key(branch.as_str()) {
            return Err(unprocessable("Reference already exists"));
        }
        let source = inner
            .branches
            .iter()
            .find(|(_, head)| head.as_str() == sha)
            .map(|(name, _)| name.clone())
            .ok_or_else(|| unprocessable("Object does not exist"))?;
        let tree = inner.trees.get(&source).cloned().unwrap_or_default();

        inner.branches.insert(branch.to_string(), sha.to_string());
        inner.trees.insert(branch.to_string(), tree);
        Ok(())
    }

    async fn get_file(
        &self,
        path: &str,
        branch: Option<&BranchName>,
    ) -> Result<FileContent, ForgeError> {
        self.record(MockOperation::GetFile {
            path: path.to_string(),
            branch: branch.map(|b| b.to_string()),
        });
        if let Some(result) = self.check_fail("get_file") {
            return result;
        }

        let inner = self.lock();
        let branch_name = branch
            .map(|b| b.to_string())
            .unwrap_or_else(|| inner.default_branch.clone());
        let file = inner
            .trees
            .get(&branch_name)
            .and_then(|tree| tree.get(path))
            .ok_or_else(|| ForgeError::NotFound(path.to_string()))?;

        Ok(FileContent {
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            path: path.to_string(),
            sha: file.sha.clone(),
            content: file.content.clone(),
        })
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<DirectoryEntry>, ForgeError> {
        self.record(MockOperation::ListDirectory {
            path: path.to_string(),
        });
        if let Some(result) = self.check_fail("list_directory") {
            return result;
        }

        let inner = self.lock();
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let entries: Vec<DirectoryEntry> = inner
            .trees
            .get(&inner.default_branch)
            .into_iter()
            .flat_map(|tree| tree.iter())
            .filter_map(|(file_path, file)| {
                let name = file_path.strip_prefix(&prefix)?;
                if name.contains('/') {
                    return None;
                }
                Some(DirectoryEntry {
                    name: name.to_string(),
                    path: file_path.clone(),
                    sha: file.sha.clone(),
                    kind: EntryKind::File,
                })
            })
            .collect();

        if entries.is_empty() {
            return Err(ForgeError::NotFound(path.to_string()));
        }
        Ok(entries)
    }

    async fn put_file(&self, request: PutFileRequest) -> Result<CommitInfo, ForgeError> {
        self.record(MockOperation::PutFile {
            path: request.path.clone(),
            branch: request.branch.to_string(),
            message: request.message.clone(),
            content: request.content.clone(),
            sha: request.sha.clone(),
        });
        if let Some(result) = self.check_fail("put_file") {
            return result;
        }

        let mut inner = self.lock();
        let branch = request.branch.to_string();
        if !inner.branches.contains_key(&branch) {
            return Err(ForgeError::NotFound(format!("branch {}", branch)));
        }

        let existing = inner
            .trees
            .get(&branch)
            .and_then(|tree| tree.get(&request.path))
            .map(|f| f.sha.clone());
        match (&existing, &request.sha) {
            (Some(_), None) => return Err(unprocessable("\"sha\" wasn't supplied.")),
            (Some(current), Some(given)) if current != given => {
                return Err(ForgeError::ApiError {
                    status: 409,
                    message: format!("{} does not match {}", request.path, given),
                })
            }
            _ => {}
        }

        let content_sha = inner.mint();
        let commit_sha = inner.mint();
        inner.trees.entry(branch.clone()).or_default().insert(
            request.path,
            MockFile {
                sha: content_sha.clone(),
                content: request.content,
            },
        );
        inner.branches.insert(branch, commit_sha.clone());

        Ok(CommitInfo {
            commit_sha,
            content_sha,
        })
    }

    async fn create_pr(&self, request: CreatePrRequest) -> Result<PullRequest, ForgeError> {
        self.record(MockOperation::CreatePr {
            head: request.head.clone(),
            base: request.base.clone(),
            title: request.title.clone(),
            body: request.body.clone(),
            draft: request.draft,
        });
        if let Some(result) = self.check_fail("create_pr") {
            return result;
        }

        let mut inner = self.lock();
        for branch in [&request.head, &request.base] {
            if !inner.branches.contains_key(branch.as_str()) {
                return Err(unprocessable(format!("Validation Failed: {}", branch)));
            }
        }

        let number = inner.next_pr_number;
        inner.next_pr_number += 1;
        let url = format!("https://github.com/mock/repo/pull/{}", number);

        let raw = json!({
            "number": number,
            "html_url": url,
            "title": request.title,
            "body": request.body,
            "draft": request.draft,
            "state": "open",
            "head": {"ref": request.head},
            "base": {"ref": request.base},
        });
        let pr = PullRequest {
            number,
            url,
            is_draft: request.draft,
            head: request.head,
            base: request.base,
            title: request.title,
            raw,
        };

        inner.prs.push(pr.clone());
        Ok(pr)
    }
}

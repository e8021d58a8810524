//! engine::submit
//!
//! Turns one edited document into a pull request.
//!
//! # Steps
//!
//! ```text
//! GetMasterSha -> CreateBranch -> [GetFileSha] -> CommitToBranch -> CreatePullRequest
//! ```
//!
//! The sequence is strictly linear. The first failing step aborts the
//! submission with a [`SubmitError`] naming that step and the resource it
//! touched. Nothing is retried and nothing already created is undone: a
//! branch created before a failing commit stays behind on the forge.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::core::naming::change_branch_name;
use crate::core::types::{BranchName, Filename, RepoRef};
use crate::forge::{CommitInfo, CreatePrRequest, Forge, ForgeError, PullRequest, PutFileRequest};

/// A step of the submission sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStep {
    GetMasterSha,
    CreateBranch,
    GetFileSha,
    CommitToBranch,
    CreatePullRequest,
}

impl SubmitStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmitStep::GetMasterSha => "get-master-sha",
            SubmitStep::CreateBranch => "create-branch",
            SubmitStep::GetFileSha => "get-file-sha",
            SubmitStep::CommitToBranch => "commit-to-branch",
            SubmitStep::CreatePullRequest => "create-pull-request",
        }
    }
}

impl std::fmt::Display for SubmitStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the file is new or replaces an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeMode {
    Add,
    Update,
}

impl ChangeMode {
    fn noun(&self) -> &'static str {
        match self {
            ChangeMode::Add => "addition",
            ChangeMode::Update => "update",
        }
    }
}

/// A change a user asked to propose.
#[derive(Debug, Clone)]
pub struct ChangeRequest {
    pub filename: Filename,
    pub new_content: String,
    /// Used as the commit message and the pull request title.
    pub commit_message: String,
    /// Extended description placed in the pull request body.
    pub body: Option<String>,
    pub draft: bool,
    /// Blob sha of the file being replaced, when the caller already has it.
    pub existing_file_sha: Option<String>,
    pub mode: ChangeMode,
}

/// Repository-level settings for a submission.
#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    /// Branch to start from and target; the repository default when `None`.
    pub base_branch: Option<BranchName>,
    /// Login mentioned in the pull request body.
    pub moderator: Option<String>,
}

/// Everything created by a successful submission.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub branch: BranchName,
    pub commit: CommitInfo,
    pub pull_request: PullRequest,
}

/// A failed submission step.
#[derive(Debug, Error)]
#[error("{context}: {source}")]
pub struct SubmitError {
    /// The step that failed.
    pub step: SubmitStep,
    /// Human-readable description of what was attempted.
    pub context: String,
    #[source]
    pub source: ForgeError,
}

impl SubmitError {
    fn new(step: SubmitStep, context: String, source: ForgeError) -> Self {
        Self {
            step,
            context,
            source,
        }
    }

    /// The `GetFileSha` failure for `filename` in `repo`.
    pub fn file_sha_unavailable(filename: &Filename, repo: &RepoRef, source: ForgeError) -> Self {
        Self::new(
            SubmitStep::GetFileSha,
            format!(
                "Unable to get the current SHA value for {} in {}",
                filename, repo
            ),
            source,
        )
    }
}

/// Propose `request` as a pull request against `repo`.
///
/// `login` and `now` determine the new branch name (see
/// [`change_branch_name`]).
///
/// # Errors
///
/// Returns a [`SubmitError`] for the first step that fails. Earlier steps
/// are not rolled back.
pub async fn submit(
    forge: &dyn Forge,
    repo: &RepoRef,
    login: &str,
    request: ChangeRequest,
    options: &SubmitOptions,
    now: DateTime<Utc>,
) -> Result<SubmitOutcome, SubmitError> {
    let path = repo.file_path(&request.filename);

    // GetMasterSha
    let base = match &options.base_branch {
        Some(branch) => branch.clone(),
        None => forge.default_branch().await.map_err(|e| {
            SubmitError::new(
                SubmitStep::GetMasterSha,
                format!("Unable to get the default branch of {}", repo),
                e,
            )
        })?,
    };
    let base_sha = forge.branch_sha(&base).await.map_err(|e| {
        SubmitError::new(
            SubmitStep::GetMasterSha,
            format!("Unable to get SHA for HEAD of {} in {}", base, repo),
            e,
        )
    })?;
    tracing::debug!(%repo, base = %base, sha = %base_sha, "resolved base branch");

    // CreateBranch
    let branch = change_branch_name(login, &request.filename, now).map_err(|e| {
        SubmitError::new(
            SubmitStep::CreateBranch,
            format!("Unable to name a new branch in {}", repo),
            ForgeError::ApiError {
                status: 422,
                message: e.to_string(),
            },
        )
    })?;
    forge.create_branch(&branch, &base_sha).await.map_err(|e| {
        SubmitError::new(
            SubmitStep::CreateBranch,
            format!("Unable to create new branch {} in {}", branch, repo),
            e,
        )
    })?;
    tracing::info!(%repo, branch = %branch, "created a new branch");

    // GetFileSha
    let file_sha = match (request.mode, request.existing_file_sha) {
        (ChangeMode::Add, _) => None,
        (ChangeMode::Update, Some(sha)) => Some(sha),
        (ChangeMode::Update, None) => {
            let file = forge
                .get_file(&path, Some(&base))
                .await
                .map_err(|e| SubmitError::file_sha_unavailable(&request.filename, repo, e))?;
            Some(file.sha)
        }
    };

    // CommitToBranch
    let commit = forge
        .put_file(PutFileRequest {
            path: path.clone(),
            branch: branch.clone(),
            message: request.commit_message.clone(),
            content: request.new_content,
            sha: file_sha,
        })
        .await
        .map_err(|e| {
            SubmitError::new(
                SubmitStep::CommitToBranch,
                format!(
                    "Unable to commit {} of {} to branch {} in {}",
                    request.mode.noun(),
                    request.filename,
                    branch,
                    repo
                ),
                e,
            )
        })?;
    tracing::info!(
        %repo,
        branch = %branch,
        file = %request.filename,
        commit = %commit.commit_sha,
        "committed {}",
        request.mode.noun()
    );

    // CreatePullRequest
    let pull_request = forge
        .create_pr(CreatePrRequest {
            head: branch.to_string(),
            base: base.to_string(),
            title: request.commit_message,
            body: pr_body(request.body.as_deref(), options.moderator.as_deref()),
            draft: request.draft,
        })
        .await
        .map_err(|e| {
            SubmitError::new(
                SubmitStep::CreatePullRequest,
                format!("Unable to create PR for branch {} in {}", branch, repo),
                e,
            )
        })?;
    tracing::info!(
        %repo,
        branch = %branch,
        number = pull_request.number,
        url = %pull_request.url,
        "created a pull request"
    );

    Ok(SubmitOutcome {
        branch,
        commit,
        pull_request,
    })
}

/// The user's message followed by a mention of the moderator.
fn pr_body(message: Option<&str>, moderator: Option<&str>) -> Option<String> {
    let message = message.map(str::trim).filter(|m| !m.is_empty());
    let mention = moderator
        .map(|m| m.trim().trim_start_matches('@'))
        .filter(|m| !m.is_empty())
        .map(|m| format!("@{}", m));

    match (message, mention) {
        (Some(message), Some(mention)) => Some(format!("{}\n\n{}", message, mention)),
        (Some(message), None) => Some(message.to_string()),
        (None, Some(mention)) => Some(mention),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::EditorType;
    use crate::forge::mock::{FailOn, MockForge, MockOperation};
    use chrono::TimeZone;

    fn repo() -> RepoRef {
        RepoRef::new("OBOFoundry", "purl.obolibrary.org", "config")
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    fn request(mode: ChangeMode) -> ChangeRequest {
        ChangeRequest {
            filename: Filename::for_new("agro", EditorType::Purl).unwrap(),
            new_content: "idspace: AGRO\nbase_url: /obo/agro\n".into(),
            commit_message: "Update AGRO".into(),
            body: None,
            draft: false,
            existing_file_sha: None,
            mode,
        }
    }

    fn options() -> SubmitOptions {
        SubmitOptions {
            base_branch: None,
            moderator: Some("purl-moderator".into()),
        }
    }

    mod body {
        use super::*;

        #[test]
        fn message_and_mention() {
            assert_eq!(
                pr_body(Some("Adds a term browser"), Some("mod")).as_deref(),
                Some("Adds a term browser\n\n@mod")
            );
        }

        #[test]
        fn mention_only() {
            assert_eq!(pr_body(None, Some("@mod")).as_deref(), Some("@mod"));
            assert_eq!(pr_body(Some("  "), Some("mod")).as_deref(), Some("@mod"));
        }

        #[test]
        fn nothing() {
            assert_eq!(pr_body(None, None), None);
            assert_eq!(pr_body(None, Some("")), None);
        }
    }

    mod flow {
        use super::*;

        #[tokio::test]
        async fn add_creates_branch_commit_and_pr() {
            let forge = MockForge::new();
            let outcome = submit(&forge, &repo(), "alice", request(ChangeMode::Add), &options(), now())
                .await
                .unwrap();

            assert_eq!(outcome.branch.as_str(), "alice_AGRO_2024-01-02_030405");
            assert_eq!(
                forge.file_on("alice_AGRO_2024-01-02_030405", "config/agro.yml").as_deref(),
                Some("idspace: AGRO\nbase_url: /obo/agro\n")
            );
            assert_eq!(outcome.pull_request.base, "master");
            assert_eq!(outcome.pull_request.title, "Update AGRO");
            assert_eq!(outcome.pull_request.raw["body"], "@purl-moderator");

            // Adding never looks up an existing file.
            assert!(!forge
                .operations()
                .iter()
                .any(|op| matches!(op, MockOperation::GetFile { .. })));
        }

        #[tokio::test]
        async fn update_fetches_current_sha() {
            let forge = MockForge::new().with_file("config/agro.yml", "idspace: AGRO\n");
            submit(&forge, &repo(), "alice", request(ChangeMode::Update), &options(), now())
                .await
                .unwrap();

            let put = forge
                .operations()
                .into_iter()
                .find_map(|op| match op {
                    MockOperation::PutFile { sha, .. } => Some(sha),
                    _ => None,
                })
                .unwrap();
            assert!(put.is_some());
        }

        #[tokio::test]
        async fn update_with_known_sha_skips_lookup() {
            let forge = MockForge::new().with_file("config/agro.yml", "idspace: AGRO\n");
            let sha = forge.get_file("config/agro.yml", None).await.unwrap().sha;
            forge.clear_operations();

            let mut req = request(ChangeMode::Update);
            req.existing_file_sha = Some(sha);
            submit(&forge, &repo(), "alice", req, &options(), now())
                .await
                .unwrap();

            assert!(!forge
                .operations()
                .iter()
                .any(|op| matches!(op, MockOperation::GetFile { .. })));
        }

        #[tokio::test]
        async fn configured_base_branch_skips_default_lookup() {
            let forge = MockForge::new();
            let opts = SubmitOptions {
                base_branch: Some(BranchName::new("master").unwrap()),
                moderator: None,
            };
            submit(&forge, &repo(), "alice", request(ChangeMode::Add), &opts, now())
                .await
                .unwrap();
            assert!(!forge.operations().contains(&MockOperation::DefaultBranch));
        }
    }

    mod failures {
        use super::*;

        async fn fail_at(fail: FailOn, mode: ChangeMode) -> SubmitError {
            let forge = MockForge::new()
                .with_file("config/agro.yml", "idspace: AGRO\n")
                .fail_on(fail);
            submit(&forge, &repo(), "alice", request(mode), &options(), now())
                .await
                .unwrap_err()
        }

        #[tokio::test]
        async fn master_sha() {
            let err = fail_at(FailOn::BranchSha(ForgeError::RateLimited), ChangeMode::Add).await;
            assert_eq!(err.step, SubmitStep::GetMasterSha);
            assert_eq!(
                err.to_string(),
                "Unable to get SHA for HEAD of master in OBOFoundry/purl.obolibrary.org: rate limited"
            );
        }

        #[tokio::test]
        async fn create_branch() {
            let err = fail_at(
                FailOn::CreateBranch(ForgeError::AuthFailed("Invalid or expired token".into())),
                ChangeMode::Add,
            )
            .await;
            assert_eq!(err.step, SubmitStep::CreateBranch);
            assert!(err
                .to_string()
                .starts_with("Unable to create new branch alice_AGRO_2024-01-02_030405 in OBOFoundry/purl.obolibrary.org"));
        }

        #[tokio::test]
        async fn file_sha() {
            let err = fail_at(
                FailOn::GetFile(ForgeError::NotFound("config/agro.yml".into())),
                ChangeMode::Update,
            )
            .await;
            assert_eq!(err.step, SubmitStep::GetFileSha);
            assert!(err
                .to_string()
                .starts_with("Unable to get the current SHA value for agro.yml in"));
        }

        #[tokio::test]
        async fn commit() {
            let err = fail_at(FailOn::PutFile(ForgeError::RateLimited), ChangeMode::Update).await;
            assert_eq!(err.step, SubmitStep::CommitToBranch);
            assert!(err.to_string().starts_with(
                "Unable to commit update of agro.yml to branch alice_AGRO_2024-01-02_030405"
            ));
        }

        #[tokio::test]
        async fn pull_request_leaves_branch_behind() {
            let forge = MockForge::new().fail_on(FailOn::CreatePr(ForgeError::RateLimited));
            let err = submit(&forge, &repo(), "alice", request(ChangeMode::Add), &options(), now())
                .await
                .unwrap_err();

            assert_eq!(err.step, SubmitStep::CreatePullRequest);
            assert!(forge
                .branches()
                .contains(&"alice_AGRO_2024-01-02_030405".to_string()));
        }
    }
}

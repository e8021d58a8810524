//! server::handlers
//!
//! Route handlers. Gated handlers receive the signed-in user as a
//! [`CurrentUser`] extension.

use std::path::{Component, Path as FsPath};
use std::sync::Arc;

use axum::extract::{Form, Path, Query, State};
use axum::http::header::{CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Json, Redirect, Response};
use axum::Extension;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::documents::{self, RegistrationForm};
use super::error::AppError;
use super::middleware::{blocking_store, session_user, CurrentUser};
use super::pages::{self, EditorView, IndexEntry};
use super::AppState;
use crate::core::types::{EditorType, Filename};
use crate::engine::{self, ChangeMode, ChangeRequest, SubmitError, SubmitOptions};
use crate::forge::{EntryKind, ForgeError};
use crate::validation::{self, ValidationOutcome};

// ---------------------------------------------------------------------------
// Login flow
// ---------------------------------------------------------------------------

pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if session_user(&state, &headers).await?.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let url = state.oauth.authorize_url()?;
    Ok(Redirect::to(&url).into_response())
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    next: Option<String>,
}

/// Only same-site absolute paths are followed after login.
fn local_redirect(next: Option<&str>) -> &str {
    match next {
        Some(next) if next.starts_with('/') && !next.starts_with("//") => next,
        _ => "/",
    }
}

pub async fn github_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Response, AppError> {
    let next = local_redirect(params.next.as_deref()).to_string();

    if let Err(e) = state.oauth.verify_state(params.state.as_deref()) {
        tracing::warn!(error = %e, "rejected OAuth callback");
        return Ok(Redirect::to(&next).into_response());
    }
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        tracing::warn!("OAuth callback without a code");
        return Ok(Redirect::to(&next).into_response());
    };

    let token = state.oauth.exchange_code(&code).await?;
    let github_user = state.oauth.fetch_user(&token.access_token).await?;
    let (github_id, login, access_token) = (
        github_user.id,
        github_user.login.clone(),
        token.access_token.clone(),
    );
    let user = blocking_store(&state.store, move |store| {
        store.upsert_by_github_id(github_id, &login, &access_token)
    })
    .await?;
    tracing::info!(user_id = user.id, login = %github_user.login, "user logged in");

    Ok((
        [(SET_COOKIE, state.sessions.login_cookie(user.id))],
        Redirect::to(&next),
    )
        .into_response())
}

pub async fn logout(State(state): State<Arc<AppState>>) -> Response {
    (
        [(SET_COOKIE, state.sessions.logout_cookie())],
        Redirect::to("/"),
    )
        .into_response()
}

pub async fn logged_out() -> Html<String> {
    Html(pages::logged_out())
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

async fn list_documents(
    state: &AppState,
    token: &str,
    editor_type: EditorType,
) -> Result<Vec<IndexEntry>, AppError> {
    let repo = state.config.repo_for(editor_type);
    let forge = state.forges.connect(token, &repo);
    let listing = match forge.list_directory(&repo.directory).await {
        Ok(listing) => listing,
        Err(ForgeError::NotFound(_)) => Vec::new(),
        Err(e) => return Err(e.into()),
    };

    let suffix = format!(".{}", editor_type.extension());
    let mut entries: Vec<IndexEntry> = listing
        .into_iter()
        .filter(|entry| entry.kind == EntryKind::File && entry.name.ends_with(&suffix))
        .map(|entry| {
            let stem = entry.name.trim_end_matches(&suffix);
            IndexEntry {
                title: state.catalog.title(stem).map(str::to_string),
                filename: entry.name,
            }
        })
        .collect();
    entries.sort_by(|a, b| a.filename.cmp(&b.filename));
    Ok(entries)
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Html<String>, AppError> {
    let token = &user.github_access_token;
    let purl = list_documents(&state, token, EditorType::Purl).await?;
    let registry = list_documents(&state, token, EditorType::Registry).await?;
    Ok(Html(pages::index(user.login(), &purl, &registry)))
}

fn parse_editor_type(value: Option<&str>) -> Result<EditorType, AppError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(EditorType::Purl),
        Some(value) => value
            .parse::<EditorType>()
            .map_err(|e| AppError::BadRequest(e.to_string())),
    }
}

pub async fn edit(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((editor_type, filename)): Path<(String, String)>,
) -> Result<Html<String>, AppError> {
    let editor_type = parse_editor_type(Some(editor_type.as_str()))?;
    let filename = Filename::new(filename).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let repo = state.config.repo_for(editor_type);
    let forge = state.forges.connect(&user.github_access_token, &repo);
    let file = forge.get_file(&repo.file_path(&filename), None).await?;

    let (commit_message, description) =
        documents::default_messages(editor_type, &filename, true, None, None);
    Ok(Html(pages::editor(&EditorView {
        login: user.login(),
        editor_type,
        filename: &filename,
        content: &file.content,
        existing: true,
        commit_message: &commit_message,
        description: &description,
    })))
}

/// Parameters for starting a new document.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewDocumentParams {
    idspace: Option<String>,
    editor_type: Option<String>,
    #[serde(alias = "issueNumber")]
    issue_number: Option<String>,
    #[serde(alias = "addIssueLink")]
    add_issue_link: Option<String>,
}

fn render_new(user: &CurrentUser, params: NewDocumentParams) -> Result<Html<String>, AppError> {
    let editor_type = parse_editor_type(params.editor_type.as_deref())?;
    let idspace = params
        .idspace
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(AppError::malformed)?;
    let (filename, content) = documents::new_document(idspace, editor_type)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let issue_number = params
        .issue_number
        .as_deref()
        .and_then(|n| n.trim().trim_start_matches('#').parse::<u64>().ok());
    let (commit_message, description) = documents::default_messages(
        editor_type,
        &filename,
        false,
        issue_number,
        params.add_issue_link.as_deref().map(str::trim),
    );

    Ok(Html(pages::editor(&EditorView {
        login: user.0.login(),
        editor_type,
        filename: &filename,
        content: &content,
        existing: false,
        commit_message: &commit_message,
        description: &description,
    })))
}

pub async fn edit_new_get(
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<NewDocumentParams>,
) -> Result<Html<String>, AppError> {
    render_new(&user, params)
}

pub async fn edit_new_post(
    Extension(user): Extension<CurrentUser>,
    Form(params): Form<NewDocumentParams>,
) -> Result<Html<String>, AppError> {
    render_new(&user, params)
}

pub async fn prepare_new(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Html<String> {
    Html(pages::prepare_new(user.login()))
}

pub async fn foundry_reg_form(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Html<String> {
    Html(pages::foundry_reg(user.login(), None))
}

pub async fn foundry_reg_submit(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Form(form): Form<RegistrationForm>,
) -> Result<Html<String>, AppError> {
    let id = form
        .ontology_id()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    if state.catalog.contains(&id) {
        return Err(AppError::BadRequest(format!(
            "An ontology with id '{}' is already registered",
            id
        )));
    }
    let (filename, content) = form
        .to_document()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let (commit_message, description) =
        documents::default_messages(EditorType::Registry, &filename, false, None, None);
    Ok(Html(pages::editor(&EditorView {
        login: user.login(),
        editor_type: EditorType::Registry,
        filename: &filename,
        content: &content,
        existing: false,
        commit_message: &commit_message,
        description: &description,
    })))
}

// ---------------------------------------------------------------------------
// Validation and submission
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ValidateForm {
    code: Option<String>,
    editor_type: Option<String>,
    filename: Option<String>,
}

fn optional_filename(value: Option<&str>) -> Result<Option<Filename>, AppError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(name) => Filename::new(name)
            .map(Some)
            .map_err(|_| AppError::malformed()),
    }
}

pub async fn validate(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ValidateForm>,
) -> Result<Response, AppError> {
    let code = form.code.ok_or_else(AppError::malformed)?;
    let editor_type =
        parse_editor_type(form.editor_type.as_deref()).map_err(|_| AppError::malformed())?;
    let filename = optional_filename(form.filename.as_deref())?;

    let outcome = validation::validate(&state.schemas, &code, editor_type, filename.as_ref());
    Ok(match outcome {
        ValidationOutcome::Valid => StatusCode::OK.into_response(),
        ValidationOutcome::Report(report) => {
            let status = if report.blocks_save() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::OK
            };
            tracing::debug!(
                result_type = report.result_type.as_str(),
                line = report.line_number.as_i64(),
                "validation report"
            );
            (status, Json(report)).into_response()
        }
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigForm {
    filename: Option<String>,
    code: Option<String>,
    commit_msg: Option<String>,
    editor_type: Option<String>,
    long_msg: Option<String>,
    draft: Option<String>,
}

fn is_checked(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("true" | "on" | "1" | "yes")
    )
}

/// Text equality ignoring CRLF versus LF line endings.
fn same_text(stored: &str, submitted: &str) -> bool {
    stored.replace("\r\n", "\n") == submitted.replace("\r\n", "\n")
}

async fn propose(
    state: &AppState,
    user: &CurrentUser,
    form: ConfigForm,
    mode: ChangeMode,
) -> Result<Response, AppError> {
    let filename = optional_filename(form.filename.as_deref())?.ok_or_else(AppError::malformed)?;
    let code = form.code.ok_or_else(AppError::malformed)?;
    let commit_message = form
        .commit_msg
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .ok_or_else(AppError::malformed)?;
    let editor_type =
        parse_editor_type(form.editor_type.as_deref()).map_err(|_| AppError::malformed())?;

    let outcome = validation::validate(&state.schemas, &code, editor_type, Some(&filename));
    if let ValidationOutcome::Report(report) = outcome {
        if report.blocks_save() {
            return Err(AppError::Invalid(report));
        }
    }

    let repo = state.config.repo_for(editor_type);
    let forge = state.forges.connect(&user.0.github_access_token, &repo);
    let base_branch = state.config.base_branch();

    let existing_file_sha = match mode {
        ChangeMode::Add => None,
        ChangeMode::Update => {
            let current = forge
                .get_file(&repo.file_path(&filename), base_branch.as_ref())
                .await
                .map_err(|e| SubmitError::file_sha_unavailable(&filename, &repo, e))?;
            if same_text(&current.content, &code) {
                return Err(AppError::Unchanged(format!(
                    "No changes to {} in {}",
                    filename, repo
                )));
            }
            Some(current.sha)
        }
    };

    let request = ChangeRequest {
        filename,
        new_content: code,
        commit_message,
        body: form.long_msg.filter(|m| !m.trim().is_empty()),
        draft: is_checked(form.draft.as_deref()),
        existing_file_sha,
        mode,
    };
    let options = SubmitOptions {
        base_branch,
        moderator: state.config.moderator().map(str::to_string),
    };

    let outcome = engine::submit(
        forge.as_ref(),
        &repo,
        user.0.login(),
        request,
        &options,
        Utc::now(),
    )
    .await?;

    Ok(Json(json!({ "pr_info": outcome.pull_request.raw })).into_response())
}

pub async fn add_config(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Form(form): Form<ConfigForm>,
) -> Result<Response, AppError> {
    propose(&state, &user, form, ChangeMode::Add).await
}

pub async fn update_config(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Form(form): Form<ConfigForm>,
) -> Result<Response, AppError> {
    propose(&state, &user, form, ChangeMode::Update).await
}

// ---------------------------------------------------------------------------
// Static files
// ---------------------------------------------------------------------------

fn content_type_for(path: &FsPath) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// Relative path under the static directory, or `None` if `request_path`
/// tries to leave it.
fn static_path(request_path: &str) -> Option<&FsPath> {
    let relative = request_path.trim_start_matches('/');
    if relative.is_empty() || relative.contains('\\') {
        return None;
    }
    let path = FsPath::new(relative);
    path.components()
        .all(|c| matches!(c, Component::Normal(_)))
        .then_some(path)
}

pub async fn static_file(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    let not_found = (StatusCode::NOT_FOUND, "Not found").into_response();
    let Some(relative) = static_path(uri.path()) else {
        return not_found;
    };

    let full = state.static_dir.join(relative);
    match tokio::fs::read(&full).await {
        Ok(bytes) => ([(CONTENT_TYPE, content_type_for(&full))], bytes).into_response(),
        Err(e) => {
            tracing::debug!(path = %full.display(), error = %e, "static file unavailable");
            not_found
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_targets_stay_local() {
        assert_eq!(local_redirect(None), "/");
        assert_eq!(local_redirect(Some("/edit/purl/a.yml")), "/edit/purl/a.yml");
        assert_eq!(local_redirect(Some("//evil.example")), "/");
        assert_eq!(local_redirect(Some("https://evil.example")), "/");
    }

    #[test]
    fn static_paths_cannot_escape() {
        assert_eq!(static_path("/editor.js"), Some(FsPath::new("editor.js")));
        assert_eq!(static_path("/css/site.css"), Some(FsPath::new("css/site.css")));
        assert_eq!(static_path("/../secret"), None);
        assert_eq!(static_path("/a/../../b"), None);
        assert_eq!(static_path("/"), None);
        assert_eq!(static_path("/a\\..\\b"), None);
    }

    #[test]
    fn content_types() {
        assert_eq!(
            content_type_for(FsPath::new("x.js")),
            "application/javascript; charset=utf-8"
        );
        assert_eq!(content_type_for(FsPath::new("x")), "application/octet-stream");
    }

    #[test]
    fn draft_checkbox_values() {
        assert!(is_checked(Some("on")));
        assert!(is_checked(Some("true")));
        assert!(!is_checked(Some("false")));
        assert!(!is_checked(None));
    }

    #[test]
    fn editor_type_defaults_to_purl() {
        assert_eq!(parse_editor_type(None).unwrap(), EditorType::Purl);
        assert_eq!(parse_editor_type(Some("")).unwrap(), EditorType::Purl);
        assert_eq!(
            parse_editor_type(Some("registry")).unwrap(),
            EditorType::Registry
        );
        assert!(parse_editor_type(Some("wiki")).is_err());
    }

    #[test]
    fn unchanged_check_ignores_line_endings() {
        assert!(same_text(
            "idspace: AGRO\nbase_url: /obo/agro\n",
            "idspace: AGRO\r\nbase_url: /obo/agro\r\n"
        ));
        assert!(same_text("a\n", "a\n"));
        assert!(!same_text("a\n", "a\r\nb\r\n"));
        assert!(!same_text("a\n", "a"));
    }
}

//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`BranchName`] - Validated Git branch name
//! - [`EditorType`] - Which family of files an editor session works on
//! - [`RepoRef`] - Where a family of files lives on GitHub
//! - [`Filename`] - Validated leaf filename inside a [`RepoRef`] directory
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, so handlers never build a path or ref from
//! unchecked user input.
//!
//! # Examples
//!
//! ```
//! use foundry_editor::core::types::{BranchName, EditorType, Filename};
//!
//! let branch = BranchName::new("alice_AGRO_2024-01-02_030405").unwrap();
//! assert_eq!(branch.as_ref_path(), "refs/heads/alice_AGRO_2024-01-02_030405");
//!
//! assert_eq!("purl".parse::<EditorType>().unwrap(), EditorType::Purl);
//! assert!(Filename::new("../secrets.yml").is_err());
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("unknown editor type '{0}', expected 'purl' or 'registry'")]
    UnknownEditorType(String),

    #[error("invalid filename: {0}")]
    InvalidFilename(String),
}

/// A validated Git branch name.
///
/// Branch names must conform to Git's refname rules (see `git check-ref-format`):
/// - Cannot be empty
/// - Cannot start with `.` or `-`
/// - Cannot end with `.lock` or `/`
/// - Cannot contain `..`, `@{`, `//`, or ASCII control characters
/// - Cannot contain spaces, `~`, `^`, `:`, `\`, `?`, `*`, `[`
/// - Cannot be exactly `@`
///
/// # Example
///
/// ```
/// use foundry_editor::core::types::BranchName;
///
/// let name = BranchName::new("master").unwrap();
/// assert_eq!(name.as_str(), "master");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new("has space").is_err());
/// assert!(BranchName::new("@").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        let invalid = |why: &str| Err(TypeError::InvalidBranchName(why.to_string()));

        if name.is_empty() {
            return invalid("branch name cannot be empty");
        }
        if name == "@" {
            return invalid("branch name cannot be '@' (reserved)");
        }
        if name.starts_with('.') || name.starts_with('-') {
            return invalid("branch name cannot start with '.' or '-'");
        }
        if name.ends_with(".lock") || name.ends_with('/') {
            return invalid("branch name cannot end with '.lock' or '/'");
        }
        for forbidden in ["..", "@{", "//"] {
            if name.contains(forbidden) {
                return Err(TypeError::InvalidBranchName(format!(
                    "branch name cannot contain '{forbidden}'"
                )));
            }
        }

        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
            return Err(TypeError::InvalidBranchName(format!(
                "branch name cannot contain '{c}'"
            )));
        }
        if name.chars().any(|c| c.is_ascii_control()) {
            return invalid("branch name cannot contain control characters");
        }

        for component in name.split('/').filter(|c| !c.is_empty()) {
            if component.starts_with('.') || component.ends_with(".lock") {
                return invalid("path component cannot start with '.' or end with '.lock'");
            }
        }

        Ok(())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The fully qualified ref this branch lives at (`refs/heads/<name>`).
    pub fn as_ref_path(&self) -> String {
        format!("refs/heads/{}", self.0)
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two families of documents the editor understands.
///
/// The tag arrives from the browser as the `editor_type` form field and
/// selects both the target repository and the schemas used for validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EditorType {
    /// A PURL redirect configuration (plain YAML).
    #[default]
    Purl,
    /// An ontology registry entry (Markdown with YAML front matter).
    Registry,
}

impl EditorType {
    /// The form/URL tag for this editor type.
    pub fn as_str(&self) -> &'static str {
        match self {
            EditorType::Purl => "purl",
            EditorType::Registry => "registry",
        }
    }

    /// File extension used for new documents of this type.
    pub fn extension(&self) -> &'static str {
        match self {
            EditorType::Purl => "yml",
            EditorType::Registry => "md",
        }
    }

    /// The front-matter key that must repeat the file's identifier.
    pub fn id_key(&self) -> &'static str {
        match self {
            EditorType::Purl => "idspace",
            EditorType::Registry => "id",
        }
    }
}

impl FromStr for EditorType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purl" => Ok(EditorType::Purl),
            "registry" => Ok(EditorType::Registry),
            other => Err(TypeError::UnknownEditorType(other.to_string())),
        }
    }
}

impl std::fmt::Display for EditorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A GitHub location holding one family of documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepoRef {
    /// Owning user or organization.
    pub org: String,
    /// Repository name.
    pub repo: String,
    /// Directory inside the repository, without leading or trailing `/`.
    pub directory: String,
}

impl RepoRef {
    /// Create a new repository reference.
    pub fn new(
        org: impl Into<String>,
        repo: impl Into<String>,
        directory: impl Into<String>,
    ) -> Self {
        Self {
            org: org.into(),
            repo: repo.into(),
            directory: directory.into().trim_matches('/').to_string(),
        }
    }

    /// `org/repo`, as used in messages and PR links.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.org, self.repo)
    }

    /// Repository-relative path of a file in this location.
    ///
    /// ```
    /// use foundry_editor::core::types::{Filename, RepoRef};
    ///
    /// let repo = RepoRef::new("OBOFoundry", "purl.obolibrary.org", "config");
    /// let file = Filename::new("agro.yml").unwrap();
    /// assert_eq!(repo.file_path(&file), "config/agro.yml");
    /// ```
    pub fn file_path(&self, filename: &Filename) -> String {
        if self.directory.is_empty() {
            filename.as_str().to_string()
        } else {
            format!("{}/{}", self.directory, filename.as_str())
        }
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.org, self.repo)
    }
}

/// A single path segment naming a document in a [`RepoRef`] directory.
///
/// Rejects separators and dot segments so a filename can never escape the
/// configured directory when joined into a contents API path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Filename(String);

impl Filename {
    /// Create a new validated filename.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidFilename` for empty names, names containing
    /// `/`, `\` or control characters, and names starting with `.`.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TypeError::InvalidFilename("filename cannot be empty".into()));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(TypeError::InvalidFilename(format!(
                "'{name}' must not contain path separators"
            )));
        }
        if name.starts_with('.') {
            return Err(TypeError::InvalidFilename(format!(
                "'{name}' must not start with '.'"
            )));
        }
        if name.chars().any(|c| c.is_control()) {
            return Err(TypeError::InvalidFilename(
                "filename cannot contain control characters".into(),
            ));
        }
        Ok(Self(name))
    }

    /// Build the filename for a new document of the given type.
    ///
    /// PURL configs are stored lower-cased (`agro.yml`), registry entries
    /// keep the id as given (`agro.md`).
    pub fn for_new(id: &str, editor_type: EditorType) -> Result<Self, TypeError> {
        let stem = match editor_type {
            EditorType::Purl => id.trim().to_lowercase(),
            EditorType::Registry => id.trim().to_string(),
        };
        Self::new(format!("{}.{}", stem, editor_type.extension()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The filename without its final extension.
    pub fn stem(&self) -> &str {
        match self.0.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.0,
        }
    }

    /// The upper-cased stem, i.e. the idspace a PURL config declares.
    pub fn idspace(&self) -> String {
        self.stem().to_uppercase()
    }
}

impl TryFrom<String> for Filename {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Filename> for String {
    fn from(name: Filename) -> Self {
        name.0
    }
}

impl std::fmt::Display for Filename {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//! store::traits
//!
//! The persisted user table.
//!
//! # Design
//!
//! One row per GitHub user who has logged in. Rows are matched by GitHub
//! id, so a user who renames their account or re-authorizes the application
//! keeps the same row id and therefore the same session cookie.
//!
//! # Security
//!
//! Implementations MUST never log, print, or include access tokens in error
//! messages. [`User`] implements a redacting `Debug`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from user store operations.
///
/// Note: Error messages intentionally do not include token values.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to read the store.
    #[error("failed to read user store: {0}")]
    ReadError(String),

    /// Failed to write the store.
    #[error("failed to write user store: {0}")]
    WriteError(String),

    /// Failed to lock the store file.
    #[error("failed to lock user store: {0}")]
    LockError(String),
}

/// A user who has logged in through GitHub.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Row id, carried in the session cookie.
    pub id: u64,
    /// OAuth access token used for every GitHub call on the user's behalf.
    pub github_access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_login: Option<String>,
}

impl User {
    /// GitHub login, or an empty string for a row that never completed login.
    pub fn login(&self) -> &str {
        self.github_login.as_deref().unwrap_or_default()
    }
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("github_access_token", &"[REDACTED]")
            .field("github_id", &self.github_id)
            .field("github_login", &self.github_login)
            .finish()
    }
}

/// Trait for user table storage.
///
/// Implementations must be thread-safe (Send + Sync).
pub trait UserStore: Send + Sync {
    /// Look up a row by id.
    fn get(&self, id: u64) -> Result<Option<User>, StoreError>;

    /// Insert or update the row for GitHub user `github_id`.
    ///
    /// An existing row keeps its id and receives the new token and login.
    /// Otherwise a row is created with the next free id.
    fn upsert_by_github_id(
        &self,
        github_id: u64,
        github_login: &str,
        access_token: &str,
    ) -> Result<User, StoreError>;

    /// All rows, ordered by id.
    fn all(&self) -> Result<Vec<User>, StoreError>;
}

/// Apply an upsert to an in-memory table.
pub(crate) fn upsert_rows(
    rows: &mut Vec<User>,
    github_id: u64,
    github_login: &str,
    access_token: &str,
) -> User {
    if let Some(row) = rows.iter_mut().find(|u| u.github_id == Some(github_id)) {
        row.github_access_token = access_token.to_string();
        row.github_login = Some(github_login.to_string());
        return row.clone();
    }

    let id = rows.iter().map(|u| u.id).max().unwrap_or(0) + 1;
    let user = User {
        id,
        github_access_token: access_token.to_string(),
        github_id: Some(github_id),
        github_login: Some(github_login.to_string()),
    };
    rows.push(user.clone());
    user
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_assigns_sequential_ids() {
        let mut rows = Vec::new();
        let a = upsert_rows(&mut rows, 100, "alice", "t1");
        let b = upsert_rows(&mut rows, 200, "bob", "t2");
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn upsert_updates_existing_row() {
        let mut rows = Vec::new();
        upsert_rows(&mut rows, 100, "alice", "old");
        let again = upsert_rows(&mut rows, 100, "alice-renamed", "new");

        assert_eq!(again.id, 1);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].github_access_token, "new");
        assert_eq!(rows[0].login(), "alice-renamed");
    }

    #[test]
    fn debug_redacts_token() {
        let user = User {
            id: 1,
            github_access_token: "gho_secret".into(),
            github_id: Some(1),
            github_login: Some("alice".into()),
        };
        let debug = format!("{:?}", user);
        assert!(!debug.contains("gho_secret"));
        assert!(debug.contains("alice"));
    }

    #[test]
    fn login_defaults_to_empty() {
        let user = User {
            id: 1,
            github_access_token: "t".into(),
            github_id: None,
            github_login: None,
        };
        assert_eq!(user.login(), "");
    }
}

//! store::file_store
//!
//! File-based user table.
//!
//! # Security
//!
//! - Rows are stored in a TOML file (`users.toml` by default)
//! - File permissions are set to 0600 on Unix (owner read/write only)
//! - All writes are atomic (write to temp file, then rename)
//! - Tokens are NEVER logged, printed, or included in error messages
//!
//! # Concurrency
//!
//! Read-modify-write cycles are serialised by an in-process mutex and an
//! `fs2` exclusive lock on a sibling `.lock` file, so two server processes
//! sharing one table cannot lose each other's rows.
//!
//! ```toml
//! [[users]]
//! id = 1
//! github_access_token = "gho_..."
//! github_id = 583231
//! github_login = "octocat"
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use fs2::FileExt;
use serde::{Deserialize, Serialize};

use super::traits::{upsert_rows, StoreError, User, UserStore};

#[derive(Debug, Default, Serialize, Deserialize)]
struct UsersFile {
    #[serde(default)]
    users: Vec<User>,
}

/// File-based user store.
#[derive(Debug)]
pub struct FileUserStore {
    /// Path to the users file
    path: PathBuf,
    /// Serialises writers within this process.
    write_guard: Mutex<()>,
}

impl FileUserStore {
    /// Create a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_guard: Mutex::new(()),
        }
    }

    /// Get the path to the users file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    /// Read all rows from the file.
    fn read_rows(&self) -> Result<Vec<User>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| StoreError::ReadError(format!("cannot read users file: {}", e)))?;

        let file: UsersFile = toml::from_str(&content)
            .map_err(|e| StoreError::ReadError(format!("cannot parse users file: {}", e)))?;

        Ok(file.users)
    }

    /// Write rows to the file with atomic write and proper permissions.
    fn write_rows(&self, users: Vec<User>) -> Result<(), StoreError> {
        let content = toml::to_string_pretty(&UsersFile { users })
            .map_err(|e| StoreError::WriteError(format!("cannot serialize users: {}", e)))?;

        let temp_path = self.path.with_extension("tmp");
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(|e| StoreError::WriteError(format!("cannot create temp file: {}", e)))?;

            // Restrict permissions before any token is written
            #[cfg(unix)]
            {
                let permissions = fs::Permissions::from_mode(0o600);
                file.set_permissions(permissions).map_err(|e| {
                    StoreError::WriteError(format!("cannot set permissions: {}", e))
                })?;
            }

            file.write_all(content.as_bytes())
                .map_err(|e| StoreError::WriteError(format!("cannot write users: {}", e)))?;

            file.sync_all()
                .map_err(|e| StoreError::WriteError(format!("cannot sync to disk: {}", e)))?;
        }

        fs::rename(&temp_path, &self.path)
            .map_err(|e| StoreError::WriteError(format!("cannot rename temp file: {}", e)))?;

        Ok(())
    }

    /// Open and exclusively lock the sibling lock file.
    ///
    /// The lock is released when the returned handle is dropped.
    fn lock_file(&self) -> Result<File, StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    StoreError::WriteError(format!("cannot create directory: {}", e))
                })?;
            }
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(|e| StoreError::LockError(format!("cannot open lock file: {}", e)))?;
        file.lock_exclusive()
            .map_err(|e| StoreError::LockError(e.to_string()))?;
        Ok(file)
    }

    /// Verify file permissions are correct (Unix only).
    ///
    /// Returns true if the file doesn't exist or has 0600 permissions.
    #[cfg(unix)]
    pub fn verify_permissions(&self) -> Result<bool, StoreError> {
        if !self.path.exists() {
            return Ok(true);
        }

        let metadata = fs::metadata(&self.path)
            .map_err(|e| StoreError::ReadError(format!("cannot read file metadata: {}", e)))?;

        let mode = metadata.permissions().mode() & 0o777;
        Ok(mode == 0o600)
    }

    /// Verify file permissions are correct (non-Unix always returns true).
    #[cfg(not(unix))]
    pub fn verify_permissions(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

impl UserStore for FileUserStore {
    fn get(&self, id: u64) -> Result<Option<User>, StoreError> {
        Ok(self.read_rows()?.into_iter().find(|u| u.id == id))
    }

    fn upsert_by_github_id(
        &self,
        github_id: u64,
        github_login: &str,
        access_token: &str,
    ) -> Result<User, StoreError> {
        let _guard = self
            .write_guard
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let lock = self.lock_file()?;

        let mut rows = self.read_rows()?;
        let user = upsert_rows(&mut rows, github_id, github_login, access_token);
        self.write_rows(rows)?;

        FileExt::unlock(&lock).map_err(|e| StoreError::LockError(e.to_string()))?;
        tracing::debug!(user_id = user.id, github_id, "stored user");
        Ok(user)
    }

    fn all(&self) -> Result<Vec<User>, StoreError> {
        let mut rows = self.read_rows()?;
        rows.sort_by_key(|u| u.id);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, FileUserStore) {
        let temp = TempDir::new().expect("create temp dir");
        let store = FileUserStore::new(temp.path().join("users.toml"));
        (temp, store)
    }

    #[test]
    fn get_nonexistent_returns_none() {
        let (_temp, store) = create_test_store();
        assert!(store.get(1).expect("get").is_none());
        assert!(store.all().expect("all").is_empty());
    }

    #[test]
    fn upsert_and_get() {
        let (_temp, store) = create_test_store();

        let user = store
            .upsert_by_github_id(583231, "octocat", "gho_token")
            .expect("upsert");
        assert_eq!(user.id, 1);

        let loaded = store.get(1).expect("get").expect("row");
        assert_eq!(loaded.github_access_token, "gho_token");
        assert_eq!(loaded.github_login.as_deref(), Some("octocat"));
    }

    #[test]
    fn upsert_existing_keeps_id() {
        let (_temp, store) = create_test_store();
        store.upsert_by_github_id(1, "a", "t1").expect("first");
        store.upsert_by_github_id(2, "b", "t2").expect("second");
        let again = store.upsert_by_github_id(1, "a", "t3").expect("third");

        assert_eq!(again.id, 1);
        let all = store.all().expect("all");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].github_access_token, "t3");
    }

    #[test]
    fn persistence_across_instances() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("users.toml");

        FileUserStore::new(&path)
            .upsert_by_github_id(9, "nine", "tok")
            .expect("upsert");

        let reopened = FileUserStore::new(&path);
        assert_eq!(reopened.get(1).expect("get").expect("row").login(), "nine");
    }

    #[test]
    fn creates_directory_if_missing() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("subdir").join("users.toml");
        let store = FileUserStore::new(&path);

        store.upsert_by_github_id(1, "a", "t").expect("upsert");
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn permissions_0600_on_unix() {
        let (_temp, store) = create_test_store();
        assert!(store.verify_permissions().expect("verify before write"));

        store.upsert_by_github_id(1, "a", "t").expect("upsert");

        let metadata = fs::metadata(store.path()).expect("metadata");
        assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
        assert!(store.verify_permissions().expect("verify after write"));
    }

    #[test]
    fn corrupt_file_is_read_error() {
        let (_temp, store) = create_test_store();
        fs::write(store.path(), "users = [unclosed").expect("write bad toml");

        let err = store.get(1).unwrap_err();
        assert!(matches!(err, StoreError::ReadError(_)));
    }

    #[test]
    fn concurrent_upserts_keep_every_row() {
        let (_temp, store) = create_test_store();
        let store = std::sync::Arc::new(store);

        let handles: Vec<_> = (0..8u64)
            .map(|n| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .upsert_by_github_id(n, &format!("user{}", n), "t")
                        .expect("upsert")
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("join");
        }

        let all = store.all().expect("all");
        assert_eq!(all.len(), 8);
        let ids: Vec<u64> = all.iter().map(|u| u.id).collect();
        assert_eq!(ids, (1..=8).collect::<Vec<_>>());
    }
}

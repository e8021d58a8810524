//! store::memory_store
//!
//! In-memory user table for tests and throwaway servers.

use std::sync::{Mutex, PoisonError};

use super::traits::{upsert_rows, StoreError, User, UserStore};

/// User store that forgets everything on restart.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    rows: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with pre-existing rows.
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            rows: Mutex::new(users),
        }
    }
}

impl UserStore for MemoryUserStore {
    fn get(&self, id: u64) -> Result<Option<User>, StoreError> {
        let rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(rows.iter().find(|u| u.id == id).cloned())
    }

    fn upsert_by_github_id(
        &self,
        github_id: u64,
        github_login: &str,
        access_token: &str,
    ) -> Result<User, StoreError> {
        let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(upsert_rows(&mut rows, github_id, github_login, access_token))
    }

    fn all(&self) -> Result<Vec<User>, StoreError> {
        let mut rows = self
            .rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        rows.sort_by_key(|u| u.id);
        Ok(rows)
    }
}

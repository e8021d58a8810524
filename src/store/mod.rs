//! store - persisted user table
//!
//! # Components
//!
//! - [`UserStore`] - trait over the single `users` table
//! - [`FileUserStore`] - TOML file, atomic writes, 0600 permissions
//! - [`MemoryUserStore`] - in-memory, for tests
//!
//! # Example
//!
//! ```
//! use foundry_editor::store::{MemoryUserStore, UserStore};
//!
//! let store = MemoryUserStore::new();
//! let user = store.upsert_by_github_id(583231, "octocat", "gho_token").unwrap();
//! assert_eq!(store.get(user.id).unwrap().unwrap().login(), "octocat");
//! ```

mod file_store;
mod memory_store;
mod traits;

pub use file_store::FileUserStore;
pub use memory_store::MemoryUserStore;
pub use traits::{StoreError, User, UserStore};

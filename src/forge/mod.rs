//! forge
//!
//! Abstraction over the repository host (GitHub).
//!
//! # Architecture
//!
//! The `Forge` trait defines every remote operation the editor needs:
//! reading branch heads, creating branches, reading and committing files,
//! and opening pull requests. Handlers obtain forges through a
//! [`ForgeFactory`] so each request acts with the signed-in user's token.
//!
//! # Modules
//!
//! - `traits`: Core `Forge` trait and request/response types
//! - [`github`]: GitHub implementation using the REST API
//! - [`mock`]: In-memory implementation for deterministic testing
//! - `factory`: Per-request forge creation

mod factory;
pub mod github;
pub mod mock;
mod traits;

pub use factory::{ForgeFactory, GitHubFactory};
pub use traits::*;

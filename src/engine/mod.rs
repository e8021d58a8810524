//! engine
//!
//! Orchestrates the change lifecycle: a validated document becomes a branch,
//! a commit and a pull request on the forge.
//!
//! # Architecture
//!
//! The engine only talks to the [`Forge`](crate::forge::Forge) trait. It
//! never validates content; callers run validation first and only submit
//! documents that did not block saving.
//!
//! # Invariants
//!
//! - Every submission creates a fresh branch; branches are never reused
//! - Steps run in a fixed order and the first failure stops the sequence
//! - Nothing is retried and nothing is rolled back
//!
//! # Example
//!
//! ```ignore
//! use foundry_editor::engine::{submit, ChangeMode, ChangeRequest, SubmitOptions};
//!
//! let outcome = submit(forge.as_ref(), &repo, &login, request, &options, Utc::now()).await?;
//! println!("opened {}", outcome.pull_request.url);
//! ```

pub mod submit;

pub use submit::{
    submit, ChangeMode, ChangeRequest, SubmitError, SubmitOptions, SubmitOutcome, SubmitStep,
};

//! core
//!
//! Core domain types, naming and configuration for the editor.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, EditorType, RepoRef, Filename
//! - [`naming`] - Branch naming for change requests
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Configuration is loaded once at startup and immutable afterwards

pub mod config;
pub mod naming;
pub mod types;

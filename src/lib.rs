//! foundry-editor - a web editor for PURL configs and ontology registry entries
//!
//! Users log in with GitHub, edit a YAML PURL configuration or a Markdown
//! registry entry in the browser, validate it against JSON Schemas, and
//! submit it. Submitting creates a branch, commits the file and opens a
//! pull request on the user's behalf.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface (`serve`, `validate`)
//! - [`server`] - axum router, login gate, handlers and pages
//! - [`validation`] - YAML parsing, schema validation, error line location
//! - [`engine`] - Turns an edit into branch, commit and pull request
//! - [`forge`] - Abstraction for the repository host (GitHub, mock)
//! - [`auth`] - GitHub OAuth web flow and signed session cookies
//! - [`store`] - Persisted user table
//! - [`metadata`] - Ontology metadata catalog
//! - [`core`] - Domain types, branch naming and configuration

pub mod auth;
pub mod cli;
pub mod core;
pub mod engine;
pub mod forge;
pub mod metadata;
pub mod server;
pub mod store;
pub mod validation;

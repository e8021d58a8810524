//! auth - GitHub OAuth web flow and sessions
//!
//! # Architecture
//!
//! The auth system:
//! - Sends users through GitHub's OAuth web flow (`scope=repo`)
//! - Stores each user's access token in the user store, keyed by GitHub id
//! - Identifies returning browsers with an HMAC-signed session cookie
//! - Never exposes tokens in logs, errors, or outputs
//!
//! # Components
//!
//! - [`OAuthClient`] - authorize URL, code exchange, `GET /user`
//! - [`SessionSigner`] - signs and verifies the session cookie
//! - [`AuthError`] - error type for all of the above
//!
//! # Security
//!
//! Access tokens, the client secret and the session key must never appear
//! in logs (including `--debug`), error messages, or `Debug` output. All
//! types in this module that hold one implement a redacting `Debug`.

mod errors;
mod oauth;
pub mod session;

pub use errors::AuthError;
pub use oauth::{GitHubUser, OAuthClient, TokenResponse, DEFAULT_SCOPES};
pub use session::{cookie_value, SessionSigner, SESSION_COOKIE};

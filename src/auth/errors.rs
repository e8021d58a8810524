//! auth::errors
//!
//! Authentication error types for the GitHub OAuth web flow.
//!
//! # Design
//!
//! Error messages never contain access tokens, client secrets or session
//! keys. Each variant carries only enough context to diagnose the failure.
//!
//! # Example
//!
//! ```
//! use foundry_editor::auth::AuthError;
//!
//! let err = AuthError::OAuth("bad_verification_code: The code passed is incorrect".to_string());
//! assert!(err.to_string().contains("bad_verification_code"));
//! assert!(!err.to_string().contains("gho_")); // Never contains tokens
//! ```

use thiserror::Error;

/// Errors from authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The callback's `state` does not match the configured value.
    #[error("OAuth state mismatch; the login request did not originate here")]
    StateMismatch,

    /// The callback carried no authorization code.
    #[error("OAuth callback is missing the authorization code")]
    MissingCode,

    /// GitHub rejected the code exchange.
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// Network error during authentication.
    #[error("network error: {0}")]
    Network(String),

    /// GitHub API error during authentication.
    #[error("GitHub API error: {status} - {message}")]
    GitHubApi {
        /// HTTP status code
        status: u16,
        /// Error message from GitHub
        message: String,
    },

    /// Session signing is not configured correctly.
    #[error("session configuration error: {0}")]
    SessionConfig(String),

    /// Error from the user store.
    #[error("user store error: {0}")]
    Store(String),
}

impl AuthError {
    /// Check if this error means the login attempt itself was invalid and
    /// the user should simply start over.
    pub fn needs_reauth(&self) -> bool {
        matches!(
            self,
            AuthError::StateMismatch | AuthError::MissingCode | AuthError::OAuth(_)
        )
    }

    /// Check if this error indicates a transient failure that might succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::Network(_))
            || matches!(self, AuthError::GitHubApi { status, .. } if *status >= 500)
    }
}

impl From<crate::store::StoreError> for AuthError {
    fn from(err: crate::store::StoreError) -> Self {
        AuthError::Store(err.to_string())
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        assert!(AuthError::StateMismatch.to_string().contains("state mismatch"));
        assert!(AuthError::MissingCode
            .to_string()
            .contains("authorization code"));
    }

    #[test]
    fn github_api_error_formatting() {
        let err = AuthError::GitHubApi {
            status: 401,
            message: "Bad credentials".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("Bad credentials"));
    }

    #[test]
    fn needs_reauth_classification() {
        assert!(AuthError::StateMismatch.needs_reauth());
        assert!(AuthError::MissingCode.needs_reauth());
        assert!(AuthError::OAuth("x".into()).needs_reauth());

        assert!(!AuthError::Network("err".into()).needs_reauth());
        assert!(!AuthError::Store("err".into()).needs_reauth());
    }

    #[test]
    fn is_transient_classification() {
        assert!(AuthError::Network("err".into()).is_transient());
        assert!(AuthError::GitHubApi {
            status: 502,
            message: "bad gateway".into()
        }
        .is_transient());

        assert!(!AuthError::GitHubApi {
            status: 401,
            message: "Bad credentials".into()
        }
        .is_transient());
        assert!(!AuthError::StateMismatch.is_transient());
    }

    #[test]
    fn error_messages_never_contain_token_patterns() {
        let errors = vec![
            AuthError::StateMismatch,
            AuthError::MissingCode,
            AuthError::OAuth("bad_verification_code".to_string()),
            AuthError::Network("network error".to_string()),
            AuthError::GitHubApi {
                status: 401,
                message: "unauthorized".to_string(),
            },
            AuthError::SessionConfig("empty key".to_string()),
            AuthError::Store("store error".to_string()),
        ];

        for err in errors {
            let msg = err.to_string();
            assert!(
                !msg.contains("gho_"),
                "Error message contains access token pattern: {}",
                msg
            );
        }
    }
}

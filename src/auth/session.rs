//! auth::session
//!
//! Signed session cookies.
//!
//! The cookie carries only the user's row id and an HMAC-SHA256 signature
//! over it, keyed with the configured session secret:
//!
//! ```text
//! foundry_session=<user_id>.<hex signature>
//! ```
//!
//! A cookie whose signature does not verify is treated as absent. Tokens
//! never leave the server.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::errors::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "foundry_session";

/// Signs and verifies session cookie values.
#[derive(Clone)]
pub struct SessionSigner {
    mac: HmacSha256,
    secure: bool,
}

// Custom Debug to avoid exposing the key
impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner")
            .field("secure", &self.secure)
            .finish_non_exhaustive()
    }
}

impl SessionSigner {
    /// Create a signer keyed with `secret`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SessionConfig`] for an empty secret.
    pub fn new(secret: &str, secure: bool) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::SessionConfig(
                "session secret key must not be empty".into(),
            ));
        }
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| AuthError::SessionConfig(e.to_string()))?;
        Ok(Self { mac, secure })
    }

    fn payload(user_id: u64) -> String {
        format!("session:{}", user_id)
    }

    /// Signed cookie value for `user_id`.
    pub fn sign(&self, user_id: u64) -> String {
        let mut mac = self.mac.clone();
        mac.update(Self::payload(user_id).as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        format!("{}.{}", user_id, signature)
    }

    /// User id carried by a cookie value, if its signature is valid.
    pub fn verify(&self, value: &str) -> Option<u64> {
        let (id, signature) = value.split_once('.')?;
        let user_id: u64 = id.parse().ok()?;
        let signature = hex::decode(signature).ok()?;

        let mut mac = self.mac.clone();
        mac.update(Self::payload(user_id).as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(user_id)
    }

    /// `Set-Cookie` value establishing a session for `user_id`.
    pub fn login_cookie(&self, user_id: u64) -> String {
        self.cookie(&self.sign(user_id), None)
    }

    /// `Set-Cookie` value removing the session.
    pub fn logout_cookie(&self) -> String {
        self.cookie("", Some(0))
    }

    fn cookie(&self, value: &str, max_age: Option<u64>) -> String {
        let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, value);
        if let Some(age) = max_age {
            cookie.push_str(&format!("; Max-Age={}", age));
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Find cookie `name` in a `Cookie` request header.
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

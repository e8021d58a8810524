//! core::config::schema
//!
//! Configuration schema types.
//!
//! Every field is optional on disk; defaults are applied by the accessor
//! methods on [`Config`](super::Config), and secrets may instead come from
//! the environment.
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they conform to
//! expected formats (e.g., `bind` must be a socket address, `base_branch`
//! must be a valid branch name).

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::BranchName;

/// Top-level configuration file.
///
/// # Example
///
/// ```toml
/// bind = "127.0.0.1:5000"
/// static_dir = "static"
/// user_store = "/var/lib/foundry-editor/users.toml"
/// metadata_url = "https://obofoundry.org/registry/ontologies.jsonld"
///
/// [github]
/// client_id = "Iv1.0123"
/// moderator = "purl-moderator"
///
/// [purl]
/// org = "OBOFoundry"
/// repo = "purl.obolibrary.org"
/// directory = "config"
/// schemas = ["https://example.org/purl.schema.json"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Address the HTTP server listens on.
    pub bind: Option<String>,

    /// Directory served for static assets.
    pub static_dir: Option<PathBuf>,

    /// Path of the persisted user table.
    pub user_store: Option<PathBuf>,

    /// Where ontology metadata is fetched from at startup.
    pub metadata_url: Option<String>,

    /// GitHub OAuth application and API settings.
    pub github: Option<GitHubSection>,

    /// Session cookie settings.
    pub session: Option<SessionSection>,

    /// PURL config repository.
    pub purl: Option<DocumentRepoSection>,

    /// Ontology registry repository.
    pub registry: Option<DocumentRepoSection>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(bind) = &self.bind {
            bind.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue(format!("invalid bind address '{}': {}", bind, e))
            })?;
        }

        if let Some(url) = &self.metadata_url {
            validate_source("metadata_url", url)?;
        }

        if let Some(github) = &self.github {
            github.validate()?;
        }

        for (name, section) in [("purl", &self.purl), ("registry", &self.registry)] {
            if let Some(section) = section {
                section.validate(name)?;
            }
        }

        Ok(())
    }
}

/// `[github]` section.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GitHubSection {
    /// OAuth application client id.
    pub client_id: Option<String>,

    /// OAuth application client secret.
    pub client_secret: Option<String>,

    /// Opaque `state` value sent to and expected back from GitHub.
    pub oauth_state: Option<String>,

    /// REST API base URL (GitHub Enterprise or tests).
    pub api_base: Option<String>,

    /// Base URL hosting `/login/oauth/*`.
    pub oauth_base: Option<String>,

    /// Branch pull requests target; the repository default when unset.
    pub base_branch: Option<String>,

    /// GitHub login mentioned in every pull request body.
    pub moderator: Option<String>,
}

// Custom Debug to avoid exposing client_secret
impl std::fmt::Debug for GitHubSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubSection")
            .field("client_id", &self.client_id)
            .field("has_client_secret", &self.client_secret.is_some())
            .field("has_oauth_state", &self.oauth_state.is_some())
            .field("api_base", &self.api_base)
            .field("oauth_base", &self.oauth_base)
            .field("base_branch", &self.base_branch)
            .field("moderator", &self.moderator)
            .finish()
    }
}

impl GitHubSection {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, url) in [("api_base", &self.api_base), ("oauth_base", &self.oauth_base)] {
            if let Some(url) = url {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ConfigError::InvalidValue(format!(
                        "github.{} must be an http(s) URL, got '{}'",
                        name, url
                    )));
                }
            }
        }

        if let Some(branch) = &self.base_branch {
            BranchName::new(branch).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid github.base_branch: {}", e))
            })?;
        }

        if let Some(moderator) = &self.moderator {
            if moderator.trim().is_empty() || moderator.contains(char::is_whitespace) {
                return Err(ConfigError::InvalidValue(format!(
                    "github.moderator must be a single GitHub login, got '{}'",
                    moderator
                )));
            }
        }

        Ok(())
    }
}

/// `[session]` section.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SessionSection {
    /// Key used to sign session cookies.
    pub secret_key: Option<String>,

    /// Mark the cookie `Secure` (HTTPS deployments).
    pub secure_cookie: Option<bool>,
}

impl std::fmt::Debug for SessionSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSection")
            .field("has_secret_key", &self.secret_key.is_some())
            .field("secure_cookie", &self.secure_cookie)
            .finish()
    }
}

/// `[purl]` / `[registry]` section: where a document family lives.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentRepoSection {
    /// Owning user or organization.
    pub org: Option<String>,

    /// Repository name.
    pub repo: Option<String>,

    /// Directory holding the documents.
    pub directory: Option<String>,

    /// JSON Schema sources (URLs or local paths) applied to every document.
    pub schemas: Option<Vec<String>>,
}

impl DocumentRepoSection {
    fn validate(&self, section: &str) -> Result<(), ConfigError> {
        for (name, value) in [("org", &self.org), ("repo", &self.repo)] {
            if let Some(value) = value {
                if value.is_empty() || value.contains('/') {
                    return Err(ConfigError::InvalidValue(format!(
                        "{}.{} must be a non-empty name without '/', got '{}'",
                        section, name, value
                    )));
                }
            }
        }

        if let Some(dir) = &self.directory {
            if dir.split('/').any(|part| part == "..") {
                return Err(ConfigError::InvalidValue(format!(
                    "{}.directory cannot contain '..'",
                    section
                )));
            }
        }

        for source in self.schemas.iter().flatten() {
            validate_source(&format!("{}.schemas", section), source)?;
        }

        Ok(())
    }
}

fn validate_source(field: &str, source: &str) -> Result<(), ConfigError> {
    if source.trim().is_empty() {
        return Err(ConfigError::InvalidValue(format!(
            "{} entries cannot be empty",
            field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_valid() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config, FileConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn full_config_parses() {
        let toml = r#"
bind = "0.0.0.0:8080"
static_dir = "public"
user_store = "/tmp/users.toml"
metadata_url = "https://example.org/ontologies.jsonld"

[github]
client_id = "id"
client_secret = "secret"
oauth_state = "state"
api_base = "http://127.0.0.1:9999"
base_branch = "master"
moderator = "mod"

[session]
secret_key = "k"

[purl]
org = "OBOFoundry"
repo = "purl.obolibrary.org"
directory = "config"
schemas = ["schema.json"]

[registry]
schemas = ["a.json", "b.json"]
"#;
        let config: FileConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind.as_deref(), Some("0.0.0.0:8080"));
        assert_eq!(
            config.registry.as_ref().and_then(|r| r.schemas.as_ref()).map(Vec::len),
            Some(2)
        );
    }

    #[test]
    fn unknown_fields_rejected() {
        let result: Result<FileConfig, _> = toml::from_str("colour = \"blue\"");
        assert!(result.is_err());

        let result: Result<FileConfig, _> = toml::from_str("[github]\ntoken = \"x\"");
        assert!(result.is_err());
    }

    #[test]
    fn invalid_bind_rejected() {
        let config = FileConfig {
            bind: Some("not an address".into()),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn invalid_base_branch_rejected() {
        let config = FileConfig {
            github: Some(GitHubSection {
                base_branch: Some("bad..branch".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_http_api_base_rejected() {
        let config = FileConfig {
            github: Some(GitHubSection {
                api_base: Some("ftp://example.org".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn repo_with_slash_rejected() {
        let config = FileConfig {
            purl: Some(DocumentRepoSection {
                repo: Some("a/b".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_redacts_secrets() {
        let github = GitHubSection {
            client_secret: Some("very-secret-value".into()),
            ..Default::default()
        };
        let session = SessionSection {
            secret_key: Some("another-secret".into()),
            ..Default::default()
        };
        assert!(!format!("{:?}", github).contains("very-secret-value"));
        assert!(!format!("{:?}", session).contains("another-secret"));
    }
}

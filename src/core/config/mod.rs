//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. Environment variables (secrets and bind address)
//! 4. CLI flags (not handled here)
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. Path given with `--config`
//! 2. `$FOUNDRY_EDITOR_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/foundry-editor/config.toml`
//! 4. `~/.foundry-editor/config.toml`
//!
//! # Environment
//!
//! `GITHUB_CLIENT_ID`, `GITHUB_CLIENT_SECRET`, `GITHUB_OAUTH_STATE`,
//! `SESSION_SECRET_KEY` and `FOUNDRY_EDITOR_BIND` override the matching
//! file values so secrets never have to be written to disk.
//!
//! # Example
//!
//! ```no_run
//! use foundry_editor::core::config::Config;
//! use foundry_editor::core::types::EditorType;
//!
//! let config = Config::load(None).unwrap();
//! println!("Listening on {}", config.bind());
//! println!("PURL configs live in {}", config.repo_for(EditorType::Purl));
//! ```

pub mod schema;

pub use schema::{DocumentRepoSection, FileConfig, GitHubSection, SessionSection};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::types::{BranchName, EditorType, RepoRef};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "FOUNDRY_EDITOR_CONFIG";

const DEFAULT_BIND: &str = "127.0.0.1:5000";
const DEFAULT_API_BASE: &str = "https://api.github.com";
const DEFAULT_OAUTH_BASE: &str = "https://github.com";
const DEFAULT_ORG: &str = "OBOFoundry";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("missing required setting '{setting}' (set it in the config file or via ${env})")]
    Missing {
        setting: &'static str,
        env: &'static str,
    },
}

/// OAuth application credentials, all three required to log users in.
#[derive(Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub state: String,
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// Loaded configuration.
///
/// Accessor methods apply defaults so callers never deal with the
/// optional on-disk representation.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents with environment overrides applied.
    pub file: FileConfig,
    /// Path the configuration was read from, if any.
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `explicit` or the default locations, then
    /// apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly requested file is missing, or if a
    /// config file exists but cannot be parsed or validated. Missing default
    /// config files are not an error (defaults are used).
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        let (file, path) = match explicit {
            Some(path) => (Self::read_config(path)?, Some(path.to_path_buf())),
            None => Self::load_default()?,
        };

        let mut config = Config { file, path };
        config.apply_env(|key| std::env::var(key).ok());
        config.file.validate()?;
        Ok(config)
    }

    /// Build a configuration from TOML text (no environment overrides).
    pub fn from_toml_str(contents: &str) -> Result<Config, ConfigError> {
        let file: FileConfig = toml::from_str(contents).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })?;
        file.validate()?;
        Ok(Config { file, path: None })
    }

    fn load_default() -> Result<(FileConfig, Option<PathBuf>), ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Ok((Self::read_config(&path)?, Some(path)));
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("foundry-editor/config.toml");
            if path.exists() {
                return Ok((Self::read_config(&path)?, Some(path)));
            }
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".foundry-editor/config.toml");
            if path.exists() {
                return Ok((Self::read_config(&path)?, Some(path)));
            }
        }

        Ok((FileConfig::default(), None))
    }

    fn read_config(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let github = self.file.github.get_or_insert_with(Default::default);
        if let Some(v) = lookup("GITHUB_CLIENT_ID") {
            github.client_id = Some(v);
        }
        if let Some(v) = lookup("GITHUB_CLIENT_SECRET") {
            github.client_secret = Some(v);
        }
        if let Some(v) = lookup("GITHUB_OAUTH_STATE") {
            github.oauth_state = Some(v);
        }

        if let Some(v) = lookup("SESSION_SECRET_KEY") {
            self.file
                .session
                .get_or_insert_with(Default::default)
                .secret_key = Some(v);
        }

        if let Some(v) = lookup("FOUNDRY_EDITOR_BIND") {
            self.file.bind = Some(v);
        }
    }

    /// Path the configuration was read from.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Listen address. Defaults to `127.0.0.1:5000`.
    pub fn bind(&self) -> &str {
        self.file.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }

    /// Static asset directory. Defaults to `./static`.
    pub fn static_dir(&self) -> PathBuf {
        self.file
            .static_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("static"))
    }

    /// User table location. Defaults to `./users.toml`.
    pub fn user_store_path(&self) -> PathBuf {
        self.file
            .user_store
            .clone()
            .unwrap_or_else(|| PathBuf::from("users.toml"))
    }

    /// Ontology metadata source, if configured.
    pub fn metadata_url(&self) -> Option<&str> {
        self.file.metadata_url.as_deref()
    }

    fn github(&self) -> Option<&GitHubSection> {
        self.file.github.as_ref()
    }

    /// GitHub REST API base, without a trailing slash.
    pub fn github_api_base(&self) -> String {
        self.github()
            .and_then(|g| g.api_base.as_deref())
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/')
            .to_string()
    }

    /// Base URL for the OAuth endpoints, without a trailing slash.
    pub fn github_oauth_base(&self) -> String {
        self.github()
            .and_then(|g| g.oauth_base.as_deref())
            .unwrap_or(DEFAULT_OAUTH_BASE)
            .trim_end_matches('/')
            .to_string()
    }

    /// Explicit pull-request target branch, if configured.
    pub fn base_branch(&self) -> Option<BranchName> {
        self.github()
            .and_then(|g| g.base_branch.as_deref())
            .and_then(|b| BranchName::new(b).ok())
    }

    /// Login to mention in pull request bodies.
    pub fn moderator(&self) -> Option<&str> {
        self.github().and_then(|g| g.moderator.as_deref())
    }

    /// OAuth credentials.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` naming the first absent setting.
    pub fn oauth_credentials(&self) -> Result<OAuthCredentials, ConfigError> {
        let github = self.github();
        let client_id = github
            .and_then(|g| g.client_id.clone())
            .ok_or(ConfigError::Missing {
                setting: "github.client_id",
                env: "GITHUB_CLIENT_ID",
            })?;
        let client_secret =
            github
                .and_then(|g| g.client_secret.clone())
                .ok_or(ConfigError::Missing {
                    setting: "github.client_secret",
                    env: "GITHUB_CLIENT_SECRET",
                })?;
        let state = github
            .and_then(|g| g.oauth_state.clone())
            .ok_or(ConfigError::Missing {
                setting: "github.oauth_state",
                env: "GITHUB_OAUTH_STATE",
            })?;

        Ok(OAuthCredentials {
            client_id,
            client_secret,
            state,
        })
    }

    /// Session signing key.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` when no key is configured.
    pub fn session_secret(&self) -> Result<&str, ConfigError> {
        self.file
            .session
            .as_ref()
            .and_then(|s| s.secret_key.as_deref())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::Missing {
                setting: "session.secret_key",
                env: "SESSION_SECRET_KEY",
            })
    }

    /// Whether session cookies carry the `Secure` attribute.
    pub fn secure_cookie(&self) -> bool {
        self.file
            .session
            .as_ref()
            .and_then(|s| s.secure_cookie)
            .unwrap_or(false)
    }

    fn section(&self, editor_type: EditorType) -> Option<&DocumentRepoSection> {
        match editor_type {
            EditorType::Purl => self.file.purl.as_ref(),
            EditorType::Registry => self.file.registry.as_ref(),
        }
    }

    /// Repository holding documents of `editor_type`.
    ///
    /// Defaults to `OBOFoundry/purl.obolibrary.org` (`config/`) for PURL
    /// configs and `OBOFoundry/OBOFoundry.github.io` (`ontology/`) for
    /// registry entries.
    pub fn repo_for(&self, editor_type: EditorType) -> RepoRef {
        let (default_repo, default_dir) = match editor_type {
            EditorType::Purl => ("purl.obolibrary.org", "config"),
            EditorType::Registry => ("OBOFoundry.github.io", "ontology"),
        };
        let section = self.section(editor_type);
        RepoRef::new(
            section
                .and_then(|s| s.org.as_deref())
                .unwrap_or(DEFAULT_ORG),
            section
                .and_then(|s| s.repo.as_deref())
                .unwrap_or(default_repo),
            section
                .and_then(|s| s.directory.as_deref())
                .unwrap_or(default_dir),
        )
    }

    /// Schema sources applied to documents of `editor_type`.
    pub fn schemas_for(&self, editor_type: EditorType) -> &[String] {
        self.section(editor_type)
            .and_then(|s| s.schemas.as_deref())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn defaults_apply() {
        let config = Config::default();
        assert_eq!(config.bind(), "127.0.0.1:5000");
        assert_eq!(config.github_api_base(), "https://api.github.com");
        assert_eq!(config.github_oauth_base(), "https://github.com");
        assert_eq!(config.static_dir(), PathBuf::from("static"));
        assert!(config.moderator().is_none());
        assert!(config.base_branch().is_none());
        assert!(config.schemas_for(EditorType::Purl).is_empty());
        assert!(!config.secure_cookie());
    }

    #[test]
    fn default_repositories() {
        let config = Config::default();
        let purl = config.repo_for(EditorType::Purl);
        assert_eq!(purl.slug(), "OBOFoundry/purl.obolibrary.org");
        assert_eq!(purl.directory, "config");

        let registry = config.repo_for(EditorType::Registry);
        assert_eq!(registry.slug(), "OBOFoundry/OBOFoundry.github.io");
        assert_eq!(registry.directory, "ontology");
    }

    #[test]
    fn repo_section_overrides_defaults() {
        let config = Config::from_toml_str("[purl]\norg = \"me\"\ndirectory = \"cfg\"\n").unwrap();
        let purl = config.repo_for(EditorType::Purl);
        assert_eq!(purl.slug(), "me/purl.obolibrary.org");
        assert_eq!(purl.directory, "cfg");
    }

    #[test]
    fn api_base_trailing_slash_trimmed() {
        let config =
            Config::from_toml_str("[github]\napi_base = \"http://localhost:1234/\"\n").unwrap();
        assert_eq!(config.github_api_base(), "http://localhost:1234");
    }

    #[test]
    fn missing_credentials_reported() {
        let config = Config::default();
        let err = config.oauth_credentials().unwrap_err();
        assert!(err.to_string().contains("GITHUB_CLIENT_ID"));
        let err = config.session_secret().unwrap_err();
        assert!(err.to_string().contains("SESSION_SECRET_KEY"));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config =
            Config::from_toml_str("bind = \"127.0.0.1:1\"\n[github]\nclient_id = \"file\"\n")
                .unwrap();
        let env: HashMap<&str, &str> = [
            ("GITHUB_CLIENT_ID", "env-id"),
            ("GITHUB_CLIENT_SECRET", "env-secret"),
            ("GITHUB_OAUTH_STATE", "env-state"),
            ("SESSION_SECRET_KEY", "env-key"),
            ("FOUNDRY_EDITOR_BIND", "0.0.0.0:80"),
        ]
        .into_iter()
        .collect();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        let creds = config.oauth_credentials().unwrap();
        assert_eq!(creds.client_id, "env-id");
        assert_eq!(creds.client_secret, "env-secret");
        assert_eq!(creds.state, "env-state");
        assert_eq!(config.session_secret().unwrap(), "env-key");
        assert_eq!(config.bind(), "0.0.0.0:80");
    }

    #[test]
    fn credentials_debug_redacts_secret() {
        let creds = OAuthCredentials {
            client_id: "id".into(),
            client_secret: "hunter2".into(),
            state: "state-value".into(),
        };
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("state-value"));
    }

    #[test]
    fn load_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "bind = \"127.0.0.1:7000\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.path(), Some(path.as_path()));
    }

    #[test]
    fn load_explicit_missing_path_fails() {
        let temp = TempDir::new().unwrap();
        let result = Config::load(Some(&temp.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn parse_error_names_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "bind = [").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }
}

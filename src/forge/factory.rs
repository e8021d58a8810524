//! forge::factory
//!
//! Forge creation per request.
//!
//! # Design
//!
//! Every web request acts with the signed-in user's own access token, so a
//! forge cannot be built once at startup. Handlers hold a
//! [`ForgeFactory`] instead and ask it for a forge bound to the user's token
//! and the target repository. Handlers never import a concrete forge.
//!
//! # Example
//!
//! ```ignore
//! use foundry_editor::forge::{ForgeFactory, GitHubFactory};
//!
//! let factory = GitHubFactory::new(reqwest::Client::new(), "https://api.github.com");
//! let forge = factory.connect(&user.github_access_token, &config.repo_for(EditorType::Purl));
//! let master = forge.default_branch().await?;
//! ```

use std::sync::Arc;

use reqwest::Client;

use super::github::{GitHubForge, DEFAULT_API_BASE};
use super::mock::MockForge;
use super::traits::Forge;
use crate::core::types::RepoRef;

/// Creates forges bound to a user token and repository.
pub trait ForgeFactory: Send + Sync {
    /// Build a forge acting on `repo` with `token`.
    fn connect(&self, token: &str, repo: &RepoRef) -> Arc<dyn Forge>;
}

/// Factory for [`GitHubForge`] instances sharing one HTTP client.
#[derive(Debug, Clone)]
pub struct GitHubFactory {
    client: Client,
    api_base: String,
}

impl GitHubFactory {
    /// Create a factory talking to `api_base`.
    pub fn new(client: Client, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
        }
    }

    /// The API base URL forges will use.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

impl Default for GitHubFactory {
    fn default() -> Self {
        Self::new(Client::new(), DEFAULT_API_BASE)
    }
}

impl ForgeFactory for GitHubFactory {
    fn connect(&self, token: &str, repo: &RepoRef) -> Arc<dyn Forge> {
        Arc::new(
            GitHubForge::new(self.client.clone(), token, &repo.org, &repo.repo)
                .with_api_base(&self.api_base),
        )
    }
}

/// Every connection shares the mock's single in-memory repository.
impl ForgeFactory for MockForge {
    fn connect(&self, _token: &str, _repo: &RepoRef) -> Arc<dyn Forge> {
        Arc::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> RepoRef {
        RepoRef::new("OBOFoundry", "purl.obolibrary.org", "config")
    }

    mod github_factory {
        use super::*;

        #[test]
        fn connects_github_forge() {
            let factory = GitHubFactory::default();
            assert_eq!(factory.api_base(), DEFAULT_API_BASE);
            let forge = factory.connect("token", &repo());
            assert_eq!(forge.name(), "github");
        }
    }

    mod mock_factory {
        use super::*;

        #[tokio::test]
        async fn connections_share_state() {
            let mock = MockForge::new().with_file("config/agro.yml", "x");
            let forge = mock.connect("token", &repo());
            let file = forge.get_file("config/agro.yml", None).await.unwrap();
            assert_eq!(file.content, "x");
            assert_eq!(mock.operations().len(), 1);
        }
    }
}

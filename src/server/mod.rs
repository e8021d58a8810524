//! server - HTTP front end
//!
//! # Architecture
//!
//! [`AppState`] is built once at startup (configuration, compiled schemas,
//! ontology catalog, user store, OAuth client, session signer) and shared by
//! every request behind an `Arc`. Nothing in it changes after boot except
//! the user store, which serialises its own writes.
//!
//! Routes split in two groups:
//!
//! - public: `/login`, `/github_callback`, `/logout`, `/logged_out` and
//!   static files (router fallback)
//! - gated: everything else, wrapped in [`middleware::require_login`],
//!   which redirects to `/logged_out` when there is no valid session
//!
//! Every request runs inside an `http.request` tracing span.

pub mod documents;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod pages;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::auth::{AuthError, OAuthClient, SessionSigner};
use crate::core::config::{Config, ConfigError};
use crate::forge::{ForgeFactory, GitHubFactory};
use crate::metadata::OntologyCatalog;
use crate::store::{FileUserStore, UserStore};
use crate::validation::schemas::SchemaRegistry;

pub use error::{AppError, MALFORMED_REQUEST};

/// Errors that stop the server from starting or serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("invalid bind address '{addr}': {message}")]
    Bind { addr: String, message: String },

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared, read-mostly application state.
pub struct AppState {
    pub config: Config,
    pub schemas: SchemaRegistry,
    pub catalog: OntologyCatalog,
    pub store: Arc<dyn UserStore>,
    pub forges: Arc<dyn ForgeFactory>,
    pub oauth: OAuthClient,
    pub sessions: SessionSigner,
    pub static_dir: PathBuf,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("schemas", &self.schemas.len())
            .field("catalog", &self.catalog.len())
            .field("static_dir", &self.static_dir)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build the production state: GitHub forges, file-backed user store,
    /// and schemas and metadata fetched from their configured sources.
    ///
    /// # Errors
    ///
    /// Fails when an OAuth credential or the session secret is missing.
    /// Schema and metadata sources that cannot be loaded are logged and
    /// skipped.
    pub async fn from_config(config: Config) -> Result<Self, ServerError> {
        let oauth_credentials = config.oauth_credentials()?;
        let sessions = SessionSigner::new(config.session_secret()?, config.secure_cookie())?;

        let client = reqwest::Client::builder()
            .user_agent(crate::forge::github::USER_AGENT_VALUE)
            .build()
            .map_err(|e| ServerError::HttpClient(e.to_string()))?;

        let schemas = SchemaRegistry::load(&config, &client).await;
        let catalog = OntologyCatalog::load(&client, config.metadata_url()).await;

        let oauth = OAuthClient::new(
            client.clone(),
            oauth_credentials,
            config.github_oauth_base(),
            config.github_api_base(),
        );
        let forges = GitHubFactory::new(client, config.github_api_base());
        let store = FileUserStore::new(config.user_store_path());
        tracing::info!(
            schemas = schemas.len(),
            ontologies = catalog.len(),
            user_store = %store.path().display(),
            "application state ready"
        );

        Ok(Self {
            static_dir: config.static_dir(),
            config,
            schemas,
            catalog,
            store: Arc::new(store),
            forges: Arc::new(forges),
            oauth,
            sessions,
        })
    }
}

/// Assemble the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let gated = Router::new()
        .route("/", get(handlers::index))
        .route("/edit/:editor_type/:filename", get(handlers::edit))
        .route(
            "/edit_new",
            get(handlers::edit_new_get).post(handlers::edit_new_post),
        )
        .route("/prepare_new", get(handlers::prepare_new))
        .route(
            "/foundry_reg",
            get(handlers::foundry_reg_form).post(handlers::foundry_reg_submit),
        )
        .route("/validate", post(handlers::validate))
        .route("/add_config", post(handlers::add_config))
        .route("/update_config", post(handlers::update_config))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_login));

    let public = Router::new()
        .route("/login", get(handlers::login))
        .route("/github_callback", get(handlers::github_callback))
        .route("/logout", get(handlers::logout))
        .route(middleware::LOGGED_OUT_PATH, get(handlers::logged_out));

    Router::new()
        .merge(gated)
        .merge(public)
        .fallback(handlers::static_file)
        .layer(from_fn(middleware::request_tracing))
        .with_state(state)
}

/// Parse a `host:port` bind address.
pub fn parse_bind(addr: &str) -> Result<SocketAddr, ServerError> {
    addr.parse().map_err(|e: std::net::AddrParseError| ServerError::Bind {
        addr: addr.to_string(),
        message: e.to_string(),
    })
}

/// Serve `state` on `addr` until interrupted.
pub async fn run(state: Arc<AppState>, addr: SocketAddr) -> Result<(), ServerError> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "foundry-editor listening");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

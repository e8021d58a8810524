//! serve command - run the web editor

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::core::config::Config;
use crate::server::{self, AppState};

/// Load configuration and state, then serve until interrupted.
pub async fn serve(config_path: Option<&Path>, bind: Option<&str>) -> Result<()> {
    let config = Config::load(config_path).context("Failed to load configuration")?;
    if let Some(path) = config.path() {
        tracing::info!(config = %path.display(), "loaded configuration");
    }

    let addr = server::parse_bind(bind.unwrap_or(config.bind()))?;
    let state = AppState::from_config(config)
        .await
        .context("Failed to initialise the editor")?;

    server::run(Arc::new(state), addr).await?;
    Ok(())
}

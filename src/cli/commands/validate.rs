//! validate command - check a local document with the configured schemas

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::core::config::Config;
use crate::core::types::{EditorType, Filename};
use crate::validation::schemas::SchemaRegistry;
use crate::validation::{self, ValidationOutcome};

/// Validate `file` and print the report.
///
/// Returns `false` when the document must not be saved.
pub async fn validate(
    editor_type: EditorType,
    file: &Path,
    config_path: Option<&Path>,
) -> Result<bool> {
    let config = Config::load(config_path).context("Failed to load configuration")?;
    let code = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read '{}'", file.display()))?;

    let schemas = SchemaRegistry::load(&config, &reqwest::Client::new()).await;
    let filename = file
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| Filename::new(name).ok());

    match validation::validate(&schemas, &code, editor_type, filename.as_ref()) {
        ValidationOutcome::Valid => {
            println!("{}: valid", file.display());
            Ok(true)
        }
        ValidationOutcome::Report(report) => {
            let json = serde_json::to_string_pretty(&report)
                .context("Failed to serialise the validation report")?;
            println!("{}", json);
            Ok(!report.blocks_save())
        }
    }
}

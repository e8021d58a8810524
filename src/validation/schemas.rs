//! validation::schemas
//!
//! Boot-time loading and compilation of JSON Schemas.
//!
//! # Lifecycle
//!
//! Schemas are fetched once when the server starts and kept immutable for
//! the life of the process; picking up a changed schema requires a
//! restart. A source that cannot be fetched, parsed or compiled is logged
//! and skipped, so a broken schema URL degrades validation to YAML syntax
//! checks instead of preventing startup.
//!
//! Sources are either `http(s)://` URLs or local paths. Files ending in
//! `.yml`/`.yaml` are read as YAML, everything else as JSON.

use std::sync::Arc;

use jsonschema::JSONSchema;
use serde_json::Value;
use thiserror::Error;

use crate::core::config::Config;
use crate::core::types::EditorType;

/// Errors from loading a single schema source.
#[derive(Debug, Error)]
pub enum SchemaLoadError {
    #[error("failed to fetch schema '{source_name}': {message}")]
    Fetch {
        source_name: String,
        message: String,
    },

    #[error("failed to parse schema '{source_name}': {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    #[error("failed to compile schema '{source_name}': {message}")]
    Compile {
        source_name: String,
        message: String,
    },
}

/// A compiled schema together with its raw document.
///
/// The raw document is kept so violations can look up the `description`
/// and `level` of the failing schema fragment.
pub struct CompiledSchema {
    source: String,
    raw: Arc<Value>,
    compiled: JSONSchema,
}

impl std::fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl CompiledSchema {
    /// Compile a schema document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaLoadError::Compile`] if the document is not a valid schema.
    pub fn compile(source: impl Into<String>, raw: Value) -> Result<Self, SchemaLoadError> {
        let source = source.into();
        let compiled = JSONSchema::compile(&raw).map_err(|e| SchemaLoadError::Compile {
            source_name: source.clone(),
            message: e.to_string(),
        })?;
        Ok(Self {
            source,
            raw: Arc::new(raw),
            compiled,
        })
    }

    /// Where the schema was loaded from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The raw schema document.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub(crate) fn compiled(&self) -> &JSONSchema {
        &self.compiled
    }
}

/// All schemas, grouped by editor type.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    purl: Vec<CompiledSchema>,
    registry: Vec<CompiledSchema>,
}

impl SchemaRegistry {
    /// An empty registry: only YAML syntax is checked.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a registry from already compiled schemas.
    pub fn from_parts(purl: Vec<CompiledSchema>, registry: Vec<CompiledSchema>) -> Self {
        Self { purl, registry }
    }

    /// Load every schema source named in `config`.
    ///
    /// Never fails: broken sources are logged and left out.
    pub async fn load(config: &Config, client: &reqwest::Client) -> Self {
        let mut registry = Self::empty();
        for editor_type in [EditorType::Purl, EditorType::Registry] {
            for source in config.schemas_for(editor_type) {
                match load_source(client, source).await {
                    Ok(schema) => {
                        tracing::info!(%editor_type, source = %source, "loaded schema");
                        registry.push(editor_type, schema);
                    }
                    Err(e) => {
                        tracing::warn!(%editor_type, error = %e, "skipping schema");
                    }
                }
            }
        }
        registry
    }

    /// Add a schema for `editor_type`.
    pub fn push(&mut self, editor_type: EditorType, schema: CompiledSchema) {
        match editor_type {
            EditorType::Purl => self.purl.push(schema),
            EditorType::Registry => self.registry.push(schema),
        }
    }

    /// Schemas applied to documents of `editor_type`.
    pub fn for_type(&self, editor_type: EditorType) -> &[CompiledSchema] {
        match editor_type {
            EditorType::Purl => &self.purl,
            EditorType::Registry => &self.registry,
        }
    }

    /// Total number of loaded schemas.
    pub fn len(&self) -> usize {
        self.purl.len() + self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fetch, parse and compile one schema source.
pub async fn load_source(
    client: &reqwest::Client,
    source: &str,
) -> Result<CompiledSchema, SchemaLoadError> {
    let fetch_err = |message: String| SchemaLoadError::Fetch {
        source_name: source.to_string(),
        message,
    };

    let text = if source.starts_with("http://") || source.starts_with("https://") {
        let response = client
            .get(source)
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;
        if !response.status().is_success() {
            return Err(fetch_err(format!("HTTP {}", response.status())));
        }
        response.text().await.map_err(|e| fetch_err(e.to_string()))?
    } else {
        tokio::fs::read_to_string(source)
            .await
            .map_err(|e| fetch_err(e.to_string()))?
    };

    let raw = parse_document(source, &text)?;
    CompiledSchema::compile(source, raw)
}

fn parse_document(source: &str, text: &str) -> Result<Value, SchemaLoadError> {
    let is_yaml = source.ends_with(".yml") || source.ends_with(".yaml");
    let parsed = if is_yaml {
        serde_yaml::from_str::<Value>(text).map_err(|e| e.to_string())
    } else {
        serde_json::from_str::<Value>(text).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| SchemaLoadError::Parse {
        source_name: source.to_string(),
        message,
    })
}

//! metadata
//!
//! Ontology metadata catalog, loaded once at startup.
//!
//! The catalog source is the registry's JSON export:
//!
//! ```json
//! {"ontologies": [{"id": "agro", "title": "Agronomy Ontology", ...}]}
//! ```
//!
//! Only a few fields are kept. The catalog annotates the index page with
//! titles and tells the registration form which ids are already taken. A
//! catalog that cannot be loaded is logged and replaced by an empty one.

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

/// Errors from loading the catalog.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to fetch ontology metadata from '{source_name}': {message}")]
    Fetch {
        source_name: String,
        message: String,
    },

    #[error("failed to parse ontology metadata: {0}")]
    Parse(String),
}

/// One ontology in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OntologyEntry {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
}

#[derive(Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    ontologies: Vec<OntologyEntry>,
}

/// Known ontologies, looked up by id (case-insensitive).
#[derive(Debug, Default, Clone)]
pub struct OntologyCatalog {
    entries: Vec<OntologyEntry>,
    by_id: HashMap<String, usize>,
}

impl OntologyCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog from entries. Later duplicates of an id are ignored.
    pub fn from_entries(entries: Vec<OntologyEntry>) -> Self {
        let mut by_id = HashMap::new();
        for (index, entry) in entries.iter().enumerate() {
            by_id.entry(entry.id.to_lowercase()).or_insert(index);
        }
        Self { entries, by_id }
    }

    /// Parse the registry's JSON export.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Parse`] if `text` is not a JSON object with
    /// an `ontologies` array of objects carrying an `id`.
    pub fn from_json_str(text: &str) -> Result<Self, MetadataError> {
        let document: CatalogDocument =
            serde_json::from_str(text).map_err(|e| MetadataError::Parse(e.to_string()))?;
        Ok(Self::from_entries(document.ontologies))
    }

    /// Load the catalog from `source`, or return an empty catalog.
    ///
    /// Never fails: errors are logged.
    pub async fn load(client: &reqwest::Client, source: Option<&str>) -> Self {
        let Some(source) = source else {
            tracing::info!("no ontology metadata source configured");
            return Self::empty();
        };

        match load_source(client, source).await {
            Ok(catalog) => {
                tracing::info!(source, ontologies = catalog.len(), "loaded ontology metadata");
                catalog
            }
            Err(e) => {
                tracing::warn!(error = %e, "continuing without ontology metadata");
                Self::empty()
            }
        }
    }

    /// Whether an ontology with `id` exists.
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(&id.to_lowercase())
    }

    pub fn get(&self, id: &str) -> Option<&OntologyEntry> {
        self.by_id
            .get(&id.to_lowercase())
            .and_then(|&index| self.entries.get(index))
    }

    /// Title of ontology `id`, if known.
    pub fn title(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(|e| e.title.as_deref())
    }

    pub fn entries(&self) -> &[OntologyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fetch and parse a catalog from a URL or local path.
pub async fn load_source(
    client: &reqwest::Client,
    source: &str,
) -> Result<OntologyCatalog, MetadataError> {
    let fetch_err = |message: String| MetadataError::Fetch {
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

    OntologyCatalog::from_json_str(&text)
}

//! server::documents
//!
//! Starting content for new documents and default submission messages.

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use thiserror::Error;

use crate::core::types::{EditorType, Filename, TypeError};

/// Errors from building a registry entry out of the registration form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("'{0}' is required")]
    MissingField(&'static str),

    #[error("invalid ontology id '{id}': {reason}")]
    InvalidId { id: String, reason: String },

    #[error("failed to render registry entry: {0}")]
    Render(String),
}

/// Fields of the new-registry-entry form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub license: Option<String>,
    pub contact: Option<String>,
    pub repository: Option<String>,
    pub tracker: Option<String>,
    pub domain: Option<String>,
}

fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl RegistrationForm {
    /// The lower-cased ontology id, validated as a file stem.
    pub fn ontology_id(&self) -> Result<String, RegistrationError> {
        let id = filled(&self.id)
            .ok_or(RegistrationError::MissingField("id"))?
            .to_lowercase();
        let valid = id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !valid || !id.starts_with(|c: char| c.is_ascii_lowercase()) {
            return Err(RegistrationError::InvalidId {
                id,
                reason: "use a letter followed by letters, digits or '_'".into(),
            });
        }
        Ok(id)
    }

    /// Build the registry document and its filename.
    ///
    /// # Errors
    ///
    /// Fails when `id` or `title` is missing or the id is unusable.
    pub fn to_document(&self) -> Result<(Filename, String), RegistrationError> {
        let id = self.ontology_id()?;
        let title = filled(&self.title).ok_or(RegistrationError::MissingField("title"))?;
        let filename = Filename::for_new(&id, EditorType::Registry).map_err(|e| {
            RegistrationError::InvalidId {
                id: id.clone(),
                reason: e.to_string(),
            }
        })?;

        let mut front = Mapping::new();
        let mut put = |key: &str, value: Value| {
            front.insert(Value::String(key.to_string()), value);
        };
        put("layout", "ontology_detail".into());
        put("id", id.clone().into());
        put("title", title.into());
        if let Some(description) = filled(&self.description) {
            put("description", description.into());
        }
        if let Some(homepage) = filled(&self.homepage) {
            put("homepage", homepage.into());
        }
        if let Some(license) = filled(&self.license) {
            put("license", labelled("label", license));
        }
        if let Some(contact) = filled(&self.contact) {
            put("contact", labelled("email", contact));
        }
        if let Some(repository) = filled(&self.repository) {
            put("repository", repository.into());
        }
        if let Some(tracker) = filled(&self.tracker) {
            put("tracker", tracker.into());
        }
        if let Some(domain) = filled(&self.domain) {
            put("domain", domain.into());
        }
        put("activity_status", "active".into());

        let yaml = serde_yaml::to_string(&front)
            .map_err(|e| RegistrationError::Render(e.to_string()))?;
        let body = filled(&self.description).unwrap_or(title);
        Ok((filename, format!("---\n{}---\n\n{}\n", yaml, body)))
    }
}

fn labelled(key: &str, value: &str) -> Value {
    let mut map = Mapping::new();
    map.insert(Value::String(key.to_string()), value.into());
    Value::Mapping(map)
}

/// Starting content for a brand-new document named after `id`.
pub fn new_document(id: &str, editor_type: EditorType) -> Result<(Filename, String), TypeError> {
    let filename = Filename::for_new(id, editor_type)?;
    let content = match editor_type {
        EditorType::Purl => purl_template(&filename),
        EditorType::Registry => registry_template(&filename),
    };
    Ok((filename, content))
}

fn purl_template(filename: &Filename) -> String {
    let lower = filename.stem().to_lowercase();
    let idspace = filename.idspace();
    format!(
        "\
idspace: {idspace}
base_url: /obo/{lower}

products:
- {lower}.owl: https://raw.githubusercontent.com/ORGANIZATION/REPOSITORY/master/{lower}.owl

term_browser: ontobee
example_terms:
- {idspace}_0000001

entries:
- prefix: /about/
  replacement: http://www.ontobee.org/ontology/{idspace}?iri=http://purl.obolibrary.org/obo/
"
    )
}

fn registry_template(filename: &Filename) -> String {
    format!(
        "\
---
layout: ontology_detail
id: {id}
title:
description:
homepage:
license:
  label:
contact:
  email:
activity_status: active
---

",
        id = filename.stem()
    )
}

/// Default commit title and pull request description offered in the editor.
pub fn default_messages(
    editor_type: EditorType,
    filename: &Filename,
    existing: bool,
    issue_number: Option<u64>,
    issue_link: Option<&str>,
) -> (String, String) {
    let project = filename.idspace();
    let kind = match editor_type {
        EditorType::Purl => "PURL",
        EditorType::Registry => "registry",
    };

    if existing {
        return (
            format!("Updating {}", filename),
            format!("Updating {} configuration for {}", kind, project),
        );
    }

    let mut description = format!("Adding {} configuration for {}", kind, project);
    match (editor_type, issue_number, issue_link) {
        (EditorType::Registry, Some(issue), _) => {
            description.push_str(&format!(". Closes #{}", issue));
        }
        (EditorType::Purl, _, Some(link)) if !link.is_empty() => {
            description.push_str(&format!(". See also {}", link));
        }
        _ => {}
    }
    (format!("Adding {}", filename), description)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::front_matter;

    fn form() -> RegistrationForm {
        RegistrationForm {
            id: Some("AgrO".into()),
            title: Some("Agronomy Ontology".into()),
            description: Some("Describes agronomic practices: fields, crops".into()),
            homepage: Some("https://agroportal.org".into()),
            license: Some("CC-BY 4.0".into()),
            contact: Some("someone@example.org".into()),
            repository: Some("https://github.com/AgriculturalSemantics/agro".into()),
            tracker: Some("https://github.com/AgriculturalSemantics/agro/issues".into()),
            domain: Some("agriculture".into()),
        }
    }

    mod registration {
        use super::*;

        #[test]
        fn builds_parseable_front_matter() {
            let (filename, doc) = form().to_document().unwrap();
            assert_eq!(filename.as_str(), "agro.md");

            let split = front_matter::split(&doc).unwrap();
            let parsed: serde_yaml::Value = serde_yaml::from_str(split.front_matter).unwrap();
            assert_eq!(parsed["id"], "agro");
            assert_eq!(parsed["title"], "Agronomy Ontology");
            assert_eq!(
                parsed["description"],
                "Describes agronomic practices: fields, crops"
            );
            assert_eq!(parsed["license"]["label"], "CC-BY 4.0");
            assert_eq!(parsed["contact"]["email"], "someone@example.org");
            assert!(split.body.contains("Describes agronomic practices"));
        }

        #[test]
        fn id_comes_first_after_layout() {
            let (_, doc) = form().to_document().unwrap();
            assert!(doc.starts_with("---\nlayout: ontology_detail\nid: agro\n"));
        }

        #[test]
        fn blank_optional_fields_omitted() {
            let mut form = form();
            form.homepage = Some("  ".into());
            form.domain = None;
            let (_, doc) = form.to_document().unwrap();
            assert!(!doc.contains("homepage"));
            assert!(!doc.contains("domain"));
        }

        #[test]
        fn requires_id_and_title() {
            let mut no_id = form();
            no_id.id = None;
            assert_eq!(
                no_id.to_document().unwrap_err(),
                RegistrationError::MissingField("id")
            );

            let mut no_title = form();
            no_title.title = Some("".into());
            assert_eq!(
                no_title.to_document().unwrap_err(),
                RegistrationError::MissingField("title")
            );
        }

        #[test]
        fn rejects_bad_ids() {
            for bad in ["../x", "1abc", "a-b", "a b"] {
                let mut form = form();
                form.id = Some(bad.into());
                assert!(
                    matches!(form.ontology_id(), Err(RegistrationError::InvalidId { .. })),
                    "{bad}"
                );
            }
        }
    }

    mod templates {
        use super::*;

        #[test]
        fn purl_template_is_valid_yaml_with_idspace() {
            let (filename, content) = new_document("AGRO", EditorType::Purl).unwrap();
            assert_eq!(filename.as_str(), "agro.yml");
            let parsed: serde_yaml::Value = serde_yaml::from_str(&content).unwrap();
            assert_eq!(parsed["idspace"], "AGRO");
            assert_eq!(parsed["base_url"], "/obo/agro");
        }

        #[test]
        fn registry_template_splits() {
            let (filename, content) = new_document("agro", EditorType::Registry).unwrap();
            assert_eq!(filename.as_str(), "agro.md");
            let split = front_matter::split(&content).unwrap();
            let parsed: serde_yaml::Value = serde_yaml::from_str(split.front_matter).unwrap();
            assert_eq!(parsed["id"], "agro");
        }

        #[test]
        fn invalid_id_rejected() {
            assert!(new_document("../etc", EditorType::Purl).is_err());
        }
    }

    mod messages {
        use super::*;

        fn file(name: &str) -> Filename {
            Filename::new(name).unwrap()
        }

        #[test]
        fn update() {
            let (title, body) =
                default_messages(EditorType::Purl, &file("agro.yml"), true, None, None);
            assert_eq!(title, "Updating agro.yml");
            assert_eq!(body, "Updating PURL configuration for AGRO");
        }

        #[test]
        fn new_registry_closes_issue() {
            let (title, body) =
                default_messages(EditorType::Registry, &file("agro.md"), false, Some(12), None);
            assert_eq!(title, "Adding agro.md");
            assert_eq!(body, "Adding registry configuration for AGRO. Closes #12");
        }

        #[test]
        fn new_purl_links_issue() {
            let (_, body) = default_messages(
                EditorType::Purl,
                &file("agro.yml"),
                false,
                None,
                Some("https://github.com/o/r/pull/3"),
            );
            assert_eq!(
                body,
                "Adding PURL configuration for AGRO. See also https://github.com/o/r/pull/3"
            );
        }
    }
}

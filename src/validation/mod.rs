//! validation
//!
//! Validation dispatch for editor submissions.
//!
//! # Pipeline
//!
//! 1. Select the YAML to check: the whole text for PURL configs, the front
//!    matter for registry entries (see [`front_matter`]).
//! 2. Parse it. A syntax error yields an `error` report carrying the
//!    parser's own line number.
//! 3. Validate the parsed document against every schema loaded for the
//!    editor type and, when a filename is known, check that the declared
//!    identifier matches it.
//! 4. Bucket violations by severity. The highest non-empty bucket among
//!    error > warning > info becomes the report; only errors block saving.
//!
//! Lines are located with [`locator::locate`] and always refer to the
//! whole submitted text.

pub mod front_matter;
pub mod locator;
pub mod schemas;

use jsonschema::error::ValidationErrorKind;
use serde::Serialize;
use serde_json::Value;

use crate::core::types::{EditorType, Filename};
use locator::{locate, LineLocation, PathComponent};
use schemas::{CompiledSchema, SchemaRegistry};

/// Summary used for YAML syntax errors.
pub const YAML_PARSE_SUMMARY: &str = "YAML parsing error";

/// Severity of a violation, taken from the failing schema fragment's
/// `level` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    // Declaration order is priority order: `Error` sorts first.
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Parse a schema `level` value; anything unrecognized is an error.
    pub fn from_level(level: Option<&str>) -> Self {
        match level.map(str::to_ascii_lowercase).as_deref() {
            Some("warning") => Severity::Warning,
            Some("info") => Severity::Info,
            _ => Severity::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One schema (or identifier) violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Validator message.
    pub message: String,
    /// Path of the offending element in the parsed document.
    pub path: Vec<PathComponent>,
    /// `description` of the failing schema fragment.
    pub description: Option<String>,
    pub level: Severity,
}

impl Violation {
    /// Human-readable summary: the fragment description when present,
    /// always followed by the validator message.
    pub fn summary(&self) -> String {
        match &self.description {
            Some(description) => format!("{} ({})", description, self.message),
            None => self.message.clone(),
        }
    }

    fn detail_line(&self) -> String {
        if self.path.is_empty() {
            format!("<root>: {}", self.message)
        } else {
            let path: Vec<String> = self.path.iter().map(ToString::to_string).collect();
            format!("{}: {}", path.join("/"), self.message)
        }
    }
}

/// The JSON body returned for a failed or graded validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub result_type: Severity,
    pub summary: String,
    pub line_number: LineLocation,
    pub details: String,
}

impl ValidationReport {
    /// Whether this report prevents the document from being saved.
    pub fn blocks_save(&self) -> bool {
        self.result_type == Severity::Error
    }
}

/// Result of validating one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// No violations at all.
    Valid,
    /// The highest-priority bucket of violations.
    Report(ValidationReport),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    /// Whether saving must be refused.
    pub fn blocks_save(&self) -> bool {
        match self {
            ValidationOutcome::Valid => false,
            ValidationOutcome::Report(report) => report.blocks_save(),
        }
    }

    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            ValidationOutcome::Valid => None,
            ValidationOutcome::Report(report) => Some(report),
        }
    }
}

/// Validate `code` as a document of `editor_type`.
///
/// When `filename` is given, the document's identifier key (`idspace` for
/// PURL configs, `id` for registry entries) must match it.
///
/// # Example
///
/// ```
/// use foundry_editor::core::types::EditorType;
/// use foundry_editor::validation::{validate, schemas::SchemaRegistry, Severity};
///
/// let schemas = SchemaRegistry::empty();
/// assert!(validate(&schemas, "idspace: GO\n", EditorType::Purl, None).is_valid());
///
/// let outcome = validate(&schemas, "a: [1\n", EditorType::Purl, None);
/// let report = outcome.report().unwrap();
/// assert_eq!(report.result_type, Severity::Error);
/// assert_eq!(report.summary, "YAML parsing error");
/// ```
pub fn validate(
    schemas: &SchemaRegistry,
    code: &str,
    editor_type: EditorType,
    filename: Option<&Filename>,
) -> ValidationOutcome {
    let (yaml, offset) = match editor_type {
        EditorType::Purl => (code, 0),
        EditorType::Registry => match front_matter::split(code) {
            Ok(doc) => (doc.front_matter, doc.line_offset()),
            Err(e) => {
                return ValidationOutcome::Report(ValidationReport {
                    result_type: Severity::Error,
                    summary: "Front matter error".to_string(),
                    line_number: LineLocation::at(1),
                    details: e.to_string(),
                });
            }
        },
    };

    let instance: Value = match serde_yaml::from_str(yaml) {
        Ok(value) => value,
        Err(e) => {
            let line = e
                .location()
                .map(|loc| LineLocation::at(loc.line()))
                .unwrap_or_default();
            tracing::debug!(%editor_type, error = %e, "yaml parse failed");
            return ValidationOutcome::Report(ValidationReport {
                result_type: Severity::Error,
                summary: YAML_PARSE_SUMMARY.to_string(),
                line_number: line.shifted(offset),
                details: e.to_string(),
            });
        }
    };

    let mut violations: Vec<Violation> = schemas
        .for_type(editor_type)
        .iter()
        .flat_map(|schema| schema_violations(schema, &instance))
        .collect();

    if let Some(filename) = filename {
        violations.extend(identifier_violation(&instance, editor_type, filename));
    }

    match build_report(yaml, offset, &violations) {
        Some(report) => {
            tracing::debug!(
                %editor_type,
                result_type = %report.result_type,
                count = violations.len(),
                "validation produced report"
            );
            ValidationOutcome::Report(report)
        }
        None => ValidationOutcome::Valid,
    }
}

/// Run one compiled schema against `instance`.
pub fn schema_violations(schema: &CompiledSchema, instance: &Value) -> Vec<Violation> {
    let errors = match schema.compiled().validate(instance) {
        Ok(()) => return Vec::new(),
        Err(errors) => errors,
    };

    errors
        .map(|error| {
            let mut path = resolve_instance_path(instance, &error.instance_path.to_string());
            if let ValidationErrorKind::AdditionalProperties { unexpected } = &error.kind {
                if let Some(first) = unexpected.first() {
                    path.push(PathComponent::Key(first.clone()));
                }
            }

            let fragment = schema_fragment(schema.raw(), &error.schema_path.to_string());
            Violation {
                message: error.to_string(),
                path,
                description: fragment
                    .and_then(|f| f.get("description"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                level: Severity::from_level(
                    fragment.and_then(|f| f.get("level")).and_then(Value::as_str),
                ),
            }
        })
        .collect()
}

/// Check that the declared identifier matches the filename.
fn identifier_violation(
    instance: &Value,
    editor_type: EditorType,
    filename: &Filename,
) -> Option<Violation> {
    let key = editor_type.id_key();
    let expected = match editor_type {
        EditorType::Purl => filename.idspace(),
        EditorType::Registry => filename.stem().to_string(),
    };

    let declared = instance.get(key).map(|v| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    });

    match declared {
        Some(actual) if actual == expected => None,
        Some(actual) => Some(Violation {
            message: format!(
                "'{}: {}' does not match the expected value: '{}'",
                key, actual, expected
            ),
            path: vec![PathComponent::key(key)],
            description: None,
            level: Severity::Error,
        }),
        None => Some(Violation {
            message: format!("'{}: ' is required", key),
            path: Vec::new(),
            description: None,
            level: Severity::Error,
        }),
    }
}

fn build_report(yaml: &str, offset: usize, violations: &[Violation]) -> Option<ValidationReport> {
    let severity = violations.iter().map(|v| v.level).min()?;
    let bucket: Vec<&Violation> = violations.iter().filter(|v| v.level == severity).collect();
    let first = bucket.first()?;

    let details: Vec<String> = bucket.iter().map(|v| v.detail_line()).collect();
    Some(ValidationReport {
        result_type: severity,
        summary: first.summary(),
        line_number: locate(yaml, &first.path).shifted(offset),
        details: details.join("\n"),
    })
}

/// Turn a JSON pointer into path components, using the instance to tell
/// array indices from object keys that happen to be numeric.
pub fn resolve_instance_path(instance: &Value, pointer: &str) -> Vec<PathComponent> {
    let mut components = Vec::new();
    if pointer.is_empty() {
        return components;
    }

    let mut current = Some(instance);
    for raw in pointer.trim_start_matches('/').split('/') {
        let token = raw.replace("~1", "/").replace("~0", "~");
        let component = match current {
            Some(Value::Array(_)) => match token.parse::<usize>() {
                Ok(index) => PathComponent::Index(index),
                Err(_) => PathComponent::Key(token),
            },
            _ => PathComponent::Key(token),
        };

        current = match (&component, current) {
            (PathComponent::Index(i), Some(Value::Array(items))) => items.get(*i),
            (PathComponent::Key(k), Some(Value::Object(map))) => map.get(k),
            _ => None,
        };
        components.push(component);
    }
    components
}

/// The schema object containing the failing keyword.
///
/// The path is walked one segment at a time so that local `$ref`s
/// (`#/definitions/...`) are followed into the fragment they name.
fn schema_fragment<'a>(schema: &'a Value, schema_path: &str) -> Option<&'a Value> {
    let (parent, keyword) = schema_path.rsplit_once('/').unwrap_or(("", schema_path));

    let mut current = schema;
    for raw in parent.split('/').skip(1) {
        let token = raw.replace("~1", "/").replace("~0", "~");
        current = match current {
            Value::Object(map) => match map.get(&token) {
                Some(next) => next,
                None => resolve_ref(schema, current)?.get(&token)?,
            },
            Value::Array(items) => items.get(token.parse::<usize>().ok()?)?,
            _ => return None,
        };
        if token == "$ref" {
            current = follow_pointer(schema, current.as_str()?)?;
        }
    }

    // The failing keyword may live behind a `$ref` of the last object.
    if current.get(keyword).is_none() {
        if let Some(target) = resolve_ref(schema, current) {
            current = target;
        }
    }
    current.is_object().then_some(current)
}

/// Target of `fragment`'s local `$ref`, if it has one.
fn resolve_ref<'a>(root: &'a Value, fragment: &Value) -> Option<&'a Value> {
    let reference = fragment.get("$ref")?.as_str()?;
    follow_pointer(root, reference)
}

fn follow_pointer<'a>(root: &'a Value, reference: &str) -> Option<&'a Value> {
    let mut target = root.pointer(reference.strip_prefix('#')?)?;
    // Chained references, bounded so a self-reference cannot loop.
    for _ in 0..8 {
        match target.get("$ref").and_then(Value::as_str) {
            Some(next) if target.as_object().map_or(false, |m| m.len() == 1) => {
                target = root.pointer(next.strip_prefix('#')?)?;
            }
            _ => break,
        }
    }
    Some(target)
}

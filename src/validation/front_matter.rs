//! validation::front_matter
//!
//! Splits registry documents into YAML front matter and free-text body.
//!
//! A registry entry looks like:
//!
//! ```text
//! ---
//! id: agro
//! title: Agronomy Ontology
//! ---
//!
//! Free text describing the ontology.
//! ```
//!
//! Only the front matter is schema-checked. Line numbers reported for it
//! are shifted by [`RegistryDocument::line_offset`] so they point into the
//! whole document.

use thiserror::Error;

const DELIMITER: &str = "---";

/// Errors from splitting a registry document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FrontMatterError {
    #[error("registry entries must start with a '---' line")]
    MissingOpening,

    #[error("front matter opened on line 1 is never closed with '---'")]
    Unterminated,
}

/// A registry document split at its front-matter delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryDocument<'a> {
    /// YAML between the delimiters (without them).
    pub front_matter: &'a str,
    /// Everything after the closing delimiter line.
    pub body: &'a str,
}

impl RegistryDocument<'_> {
    /// Lines preceding the front matter in the whole document.
    pub fn line_offset(&self) -> usize {
        1
    }
}

/// Split `text` into front matter and body.
///
/// # Errors
///
/// Returns [`FrontMatterError::MissingOpening`] if the first line is not
/// `---`, and [`FrontMatterError::Unterminated`] if no closing `---` line
/// follows it.
///
/// # Example
///
/// ```
/// use foundry_editor::validation::front_matter::split;
///
/// let doc = split("---\nid: agro\n---\nBody text\n").unwrap();
/// assert_eq!(doc.front_matter, "id: agro\n");
/// assert_eq!(doc.body, "Body text\n");
/// ```
pub fn split(text: &str) -> Result<RegistryDocument<'_>, FrontMatterError> {
    let mut lines = text.split_inclusive('\n');

    let first = lines.next().ok_or(FrontMatterError::MissingOpening)?;
    if !is_delimiter(first) {
        return Err(FrontMatterError::MissingOpening);
    }

    let fm_start = first.len();
    let mut pos = fm_start;
    for line in lines {
        if is_delimiter(line) {
            return Ok(RegistryDocument {
                front_matter: &text[fm_start..pos],
                body: &text[pos + line.len()..],
            });
        }
        pos += line.len();
    }

    Err(FrontMatterError::Unterminated)
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_front_matter_and_body() {
        let text = "---\nid: agro\ntitle: Agronomy\n---\n\n## About\n";
        let doc = split(text).unwrap();
        assert_eq!(doc.front_matter, "id: agro\ntitle: Agronomy\n");
        assert_eq!(doc.body, "\n## About\n");
        assert_eq!(doc.line_offset(), 1);
    }

    #[test]
    fn empty_body() {
        let doc = split("---\nid: x\n---").unwrap();
        assert_eq!(doc.front_matter, "id: x\n");
        assert_eq!(doc.body, "");
    }

    #[test]
    fn crlf_delimiters() {
        let doc = split("---\r\nid: x\r\n---\r\nbody").unwrap();
        assert_eq!(doc.front_matter, "id: x\r\n");
        assert_eq!(doc.body, "body");
    }

    #[test]
    fn body_may_contain_rules() {
        let doc = split("---\nid: x\n---\ntext\n---\nmore\n").unwrap();
        assert_eq!(doc.front_matter, "id: x\n");
        assert_eq!(doc.body, "text\n---\nmore\n");
    }

    #[test]
    fn missing_opening() {
        assert_eq!(split("id: x\n---\n"), Err(FrontMatterError::MissingOpening));
        assert_eq!(split(""), Err(FrontMatterError::MissingOpening));
    }

    #[test]
    fn unterminated() {
        assert_eq!(split("---\nid: x\n"), Err(FrontMatterError::Unterminated));
    }
}

//! validation::locator
//!
//! Maps a schema violation's instance path back to a line in the raw
//! YAML text.
//!
//! # Algorithm
//!
//! The parsed document has no positions, so the locator re-scans the
//! original text. It keeps a current line and walks the path:
//!
//! - A key `k` is found by scanning forward for a line matching
//!   `^\s*-?\s*k\s*:.*$`. After another key the scan starts on the next
//!   line; after an index it starts on the item line itself so that
//!   `- k: value` items match.
//! - An index `n` scans the lines below the current label for list items.
//!   The first item fixes the indentation level and only items at that
//!   level are counted. A non-item line at or left of that level ends the
//!   block.
//!
//! Nesting depth is not tracked when scanning for a key, so a key that
//! also appears deeper inside an earlier sibling can win.
//!
//! # Example
//!
//! ```
//! use foundry_editor::validation::locator::{locate, LineLocation, PathComponent};
//!
//! let yaml = "idspace: AGRO\nentries:\n- exact: /a\n- exact: /b\n";
//! let path = [PathComponent::key("entries"), PathComponent::Index(1)];
//! assert_eq!(locate(yaml, &path), LineLocation::at(4));
//! assert_eq!(locate(yaml, &[]), LineLocation::unknown());
//! ```

use regex::Regex;
use serde::{Serialize, Serializer};

/// One step of an instance path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathComponent {
    /// Mapping key.
    Key(String),
    /// Zero-based sequence index.
    Index(usize),
}

impl PathComponent {
    pub fn key(key: impl Into<String>) -> Self {
        PathComponent::Key(key.into())
    }
}

impl std::fmt::Display for PathComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathComponent::Key(k) => f.write_str(k),
            PathComponent::Index(i) => write!(f, "{}", i),
        }
    }
}

impl Serialize for PathComponent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PathComponent::Key(k) => serializer.serialize_str(k),
            PathComponent::Index(i) => serializer.serialize_u64(*i as u64),
        }
    }
}

/// A 1-based source line, or unknown.
///
/// Serializes as the line number, with `-1` standing for unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LineLocation(Option<usize>);

impl LineLocation {
    /// A known 1-based line. Zero is treated as unknown.
    pub fn at(line: usize) -> Self {
        if line == 0 {
            Self(None)
        } else {
            Self(Some(line))
        }
    }

    pub fn unknown() -> Self {
        Self(None)
    }

    pub fn line(&self) -> Option<usize> {
        self.0
    }

    pub fn is_known(&self) -> bool {
        self.0.is_some()
    }

    /// Shift a known line down by `lines`; unknown stays unknown.
    pub fn shifted(self, lines: usize) -> Self {
        Self(self.0.map(|l| l + lines))
    }

    /// Wire value: the line number or `-1`.
    pub fn as_i64(&self) -> i64 {
        self.0.map(|l| l as i64).unwrap_or(-1)
    }
}

impl Serialize for LineLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_i64())
    }
}

impl std::fmt::Display for LineLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(line) => write!(f, "line {}", line),
            None => f.write_str("unknown line"),
        }
    }
}

/// Find the line where the element at `path` starts in `source`.
///
/// Returns [`LineLocation::unknown`] for an empty path or when any step
/// of the path cannot be found.
pub fn locate(source: &str, path: &[PathComponent]) -> LineLocation {
    if path.is_empty() {
        return LineLocation::unknown();
    }

    let lines: Vec<&str> = source.lines().collect();
    let mut current: Option<usize> = None;
    let mut after_index = false;

    for component in path {
        let found = match component {
            PathComponent::Key(key) => {
                let start = match current {
                    None => 0,
                    Some(line) if after_index => line,
                    Some(line) => line + 1,
                };
                find_key(&lines, key, start)
            }
            PathComponent::Index(n) => find_item(&lines, current, *n, after_index),
        };

        match found {
            Some(line) => current = Some(line),
            None => {
                tracing::debug!(%component, "could not locate path component");
                return LineLocation::unknown();
            }
        }
        after_index = matches!(component, PathComponent::Index(_));
    }

    current
        .map(|line| LineLocation::at(line + 1))
        .unwrap_or_default()
}

fn find_key(lines: &[&str], key: &str, start: usize) -> Option<usize> {
    let pattern = format!(r"^\s*-?\s*{}\s*:.*$", regex::escape(key));
    let re = Regex::new(&pattern).ok()?;
    (start..lines.len()).find(|&i| re.is_match(lines[i]))
}

/// Column at which a line's content starts, treating a leading `- ` as
/// indentation so that `- key:` labels its children at the key column.
fn content_column(line: &str) -> usize {
    let indent = indentation(line);
    let rest = &line[indent..];
    match rest.strip_prefix('-') {
        Some(after) if after.starts_with(' ') || after.starts_with('\t') => {
            indent + 1 + indentation(after)
        }
        _ => indent,
    }
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn is_list_item(trimmed: &str) -> bool {
    trimmed == "-" || trimmed.starts_with("- ") || trimmed.starts_with("-\t")
}

fn is_ignorable(trimmed: &str) -> bool {
    trimmed.is_empty() || trimmed.starts_with('#')
}

fn find_item(lines: &[&str], label: Option<usize>, n: usize, inline: bool) -> Option<usize> {
    let (start, label_column) = match label {
        Some(line) => (line + 1, Some(content_column(lines.get(line)?))),
        None => (0, None),
    };

    let mut level: Option<usize> = None;
    let mut seen = 0;

    // `- - a`: the outer item's line already holds the first inner item.
    if let (true, Some(line), Some(column)) = (inline, label, label_column) {
        if is_list_item(&lines[line][column..]) {
            if n == 0 {
                return Some(line);
            }
            level = Some(column);
            seen = 1;
        }
    }

    for (i, line) in lines.iter().enumerate().skip(start) {
        let trimmed = line.trim_start();
        if is_ignorable(trimmed) {
            continue;
        }
        let indent = indentation(line);
        let item = is_list_item(trimmed);

        match level {
            None => {
                if item && label_column.map_or(true, |col| indent >= col) {
                    level = Some(indent);
                } else if label_column.map_or(false, |col| indent <= col) {
                    // The label's block ended before any item appeared.
                    return None;
                } else {
                    continue;
                }
            }
            Some(lvl) => {
                if indent < lvl || (indent == lvl && !item) {
                    return None;
                }
                if indent > lvl {
                    continue;
                }
            }
        }

        if seen == n {
            return Some(i);
        }
        seen += 1;
    }

    None
}

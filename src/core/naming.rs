//! core::naming
//!
//! Branch naming for change requests.
//!
//! Every submission gets a fresh branch named
//! `<login>_<IDSPACE>_<YYYY-MM-DD_HHMMSS>` with the timestamp in UTC.
//! Branches are never reused and never cleaned up, so a failed submission
//! may leave one behind.

use chrono::{DateTime, Utc};

use super::types::{BranchName, Filename, TypeError};

/// Timestamp layout used in generated branch names.
pub const BRANCH_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";

/// Generate the branch name for a change to `filename` by `login`.
///
/// Characters that Git rejects in ref names are replaced with `-` so that
/// an unusual login or filename still produces a usable branch.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use foundry_editor::core::naming::change_branch_name;
/// use foundry_editor::core::types::Filename;
///
/// let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
/// let file = Filename::new("agro.yml").unwrap();
/// let branch = change_branch_name("alice", &file, now).unwrap();
/// assert_eq!(branch.as_str(), "alice_AGRO_2024-03-09_140507");
/// ```
///
/// # Errors
///
/// Returns `TypeError::InvalidBranchName` if nothing usable is left after
/// sanitizing (for example an empty login).
pub fn change_branch_name(
    login: &str,
    filename: &Filename,
    now: DateTime<Utc>,
) -> Result<BranchName, TypeError> {
    let name = format!(
        "{}_{}_{}",
        sanitize(login),
        sanitize(&filename.idspace()),
        now.format(BRANCH_TIMESTAMP_FORMAT)
    );
    BranchName::new(name)
}

fn sanitize(part: &str) -> String {
    let cleaned: String = part
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect();

    let mut out = String::with_capacity(cleaned.len());
    for c in cleaned.chars() {
        if c == '.' && out.ends_with('.') {
            continue;
        }
        out.push(c);
    }
    out.trim_matches(|c| c == '.' || c == '-').to_string()
}

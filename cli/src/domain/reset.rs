//! Reset diff: which remote routes disappear after a full re-import.

use std::collections::HashSet;

/// Routes present in `remote` but absent from `imported`.
///
/// Keeps the order in which the remote index listed them and drops duplicates.
#[must_use]
pub fn routes_to_delete(remote: &[String], imported: &[String]) -> Vec<String> {
    let keep: HashSet<&str> = imported.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    remote
        .iter()
        .filter(|id| !keep.contains(id.as_str()) && seen.insert(id.as_str()))
        .cloned()
        .collect()
}

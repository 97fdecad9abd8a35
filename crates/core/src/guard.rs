//! Allow/deny check applied to the prune root before anything is listed.

use std::fs;
use std::path::{Path, PathBuf};

/// Returns true if `root` may be pruned given allow/deny prefixes.
/// If the allow list is non-empty, the root must sit under at least one prefix.
/// Deny always overrides.
///
/// `root` must already be canonical. Prefixes are canonicalized when they
/// exist, and matching goes by whole path components.
pub fn is_allowed(root: &Path, allow: &[PathBuf], deny: &[PathBuf]) -> bool {
    if deny.iter().any(|p| root.starts_with(resolve(p))) {
        return false;
    }
    if allow.is_empty() {
        return true;
    }
    allow.iter().any(|p| root.starts_with(resolve(p)))
}

// A prefix that does not exist cannot contain the (existing) root through a
// link, so its literal form is enough.
fn resolve(prefix: &Path) -> PathBuf {
    fs::canonicalize(prefix).unwrap_or_else(|_| prefix.to_path_buf())
}

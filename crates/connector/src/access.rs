//! Access-control predicate consulted by the runtime before attribute rules.
//!
//! Entries whose name starts with a dot are unreadable, unwritable, hidden
//! and locked. Everything else is left to the runtime.

use roots::Attribute;

/// Decide `attribute` for `path`, or `None` to let the runtime decide.
pub fn dotfile_access(attribute: Attribute, path: &str) -> Option<bool> {
    basename(path)
        .starts_with('.')
        .then_some(!attribute.is_access())
}

/// Final segment of a `/`-separated path, ignoring trailing separators.
fn basename(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
}

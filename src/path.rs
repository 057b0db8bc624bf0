//! # Path Codec
//!
//! Turns host-supplied paths into the canonical keys every store is indexed by.
//!
//! A canonical path has no leading or trailing `/`. The filesystem root is the
//! empty string. Interior separators are kept as-is, so `"docs/a.txt"` names
//! the entry `a.txt` inside the folder `docs`.

/// Path separator used by the host.
pub const SEP: char = '/';

/// Canonical key of the filesystem root.
pub const ROOT: &str = "";

/// Convert a host path to its canonical key.
///
/// Every leading and trailing separator is stripped, so `//a` and `/a` name
/// the same key. Canonicalizing a canonical path returns it unchanged.
///
/// ```rust
/// use jsonfs::canonicalize;
///
/// assert_eq!(canonicalize("/docs/a.txt"), "docs/a.txt");
/// assert_eq!(canonicalize("/docs/"), "docs");
/// assert_eq!(canonicalize("/"), "");
/// ```
pub fn canonicalize(path: &str) -> &str {
    path.trim_matches(SEP)
}

/// Canonical key of the folder containing `path`.
///
/// Top-level entries belong to the root. The root has no parent.
pub fn parent_of(path: &str) -> Option<&str> {
    if path.is_empty() {
        return None;
    }
    Some(path.rsplit_once(SEP).map_or(ROOT, |(parent, _)| parent))
}

/// Whether `path` lies strictly below `ancestor`.
///
/// Every non-root path descends from the root. Otherwise `path` must start
/// with `ancestor` followed by a separator, so `"ab"` is not below `"a"`.
pub fn is_descendant(path: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() {
        return !path.is_empty();
    }
    path.strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with(SEP))
}

/// Re-root `path` from under `from` to under `to`.
///
/// Callers pass `path == from` or a descendant of `from`.
pub(crate) fn rebase(path: &str, from: &str, to: &str) -> String {
    let rest = &path[from.len()..];
    if to.is_empty() {
        rest.trim_start_matches(SEP).to_owned()
    } else {
        format!("{to}{rest}")
    }
}

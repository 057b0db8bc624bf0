//! # Filesystem State
//!
//! The four path-keyed stores plus filesystem metadata.
//!
//! | Store | Key → Value | Missing key |
//! |-------|-------------|-------------|
//! | attributes | path → [`Attributes`] | [`FsError::NotFound`] |
//! | content | path → bytes (regular files) | empty bytes |
//! | extended attributes | path → opaque bytes | empty bytes |
//! | entity index | path → [`EntityKind`] | `None` |
//!
//! Attribute and entity-index keys always match. Entries are inserted,
//! moved and removed across every store together, so callers never see one
//! store updated without the others.

use std::collections::BTreeMap;
use std::time::SystemTime;

use crate::path::{self, ROOT};
use crate::{Attributes, EntityKind, FsError, FsMeta};

/// Canonical path of the reserved file whose content is the current snapshot.
pub const EXPORT_PATH: &str = "__FSDATA__";

/// Mode bits of the reserved export file.
pub(crate) const EXPORT_PERMISSIONS: u32 = 0o664;

/// Complete in-memory state of one filesystem.
#[derive(Debug, Clone, PartialEq)]
pub struct FsState {
    pub(crate) meta: FsMeta,
    pub(crate) attrs: BTreeMap<String, Attributes>,
    pub(crate) data: BTreeMap<String, Vec<u8>>,
    pub(crate) xattrs: BTreeMap<String, Vec<u8>>,
    pub(crate) kinds: BTreeMap<String, EntityKind>,
}

impl FsState {
    /// A fresh filesystem holding only the root folder.
    ///
    /// The root's permission bits come from `meta.default_umask`.
    pub fn new(meta: FsMeta, now: SystemTime) -> Self {
        Self::with_root(meta, Attributes::folder(meta.default_umask, now))
    }

    pub(crate) fn with_root(meta: FsMeta, root: Attributes) -> Self {
        let mut state = Self::empty(meta);
        state.attrs.insert(ROOT.to_owned(), root);
        state.kinds.insert(ROOT.to_owned(), EntityKind::Folder);
        state
    }

    pub(crate) fn empty(meta: FsMeta) -> Self {
        Self {
            meta,
            attrs: BTreeMap::new(),
            data: BTreeMap::new(),
            xattrs: BTreeMap::new(),
            kinds: BTreeMap::new(),
        }
    }

    /// Filesystem-wide metadata.
    pub fn meta(&self) -> FsMeta {
        self.meta
    }

    /// Whether `path` exists.
    pub fn contains(&self, path: &str) -> bool {
        self.attrs.contains_key(path)
    }

    /// Attribute record of `path`.
    pub fn attr(&self, path: &str) -> Result<&Attributes, FsError> {
        self.attrs.get(path).ok_or_else(|| FsError::not_found(path))
    }

    pub(crate) fn attr_mut(&mut self, path: &str) -> Result<&mut Attributes, FsError> {
        self.attrs
            .get_mut(path)
            .ok_or_else(|| FsError::not_found(path))
    }

    /// Entity kind of `path`, if indexed.
    pub fn kind(&self, path: &str) -> Option<EntityKind> {
        self.kinds.get(path).copied()
    }

    /// Content of `path`. Paths without content read as empty.
    pub fn content(&self, path: &str) -> &[u8] {
        self.data.get(path).map_or(&[], Vec::as_slice)
    }

    /// Extended-attribute blob of `path`. Never-set blobs read as empty.
    pub fn xattrs(&self, path: &str) -> &[u8] {
        self.xattrs.get(path).map_or(&[], Vec::as_slice)
    }

    /// All existing paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.attrs.keys().map(String::as_str)
    }

    /// Existing paths strictly below `folder`, in sorted order.
    pub fn descendants<'a>(&'a self, folder: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.paths()
            .filter(move |candidate| path::is_descendant(candidate, folder))
    }

    /// Replace the content of `path` and keep its size in step.
    pub(crate) fn set_content(&mut self, path: &str, content: Vec<u8>) -> Result<(), FsError> {
        let attr = self.attr_mut(path)?;
        attr.size = content.len() as u64;
        self.data.insert(path.to_owned(), content);
        Ok(())
    }

    pub(crate) fn set_xattrs(&mut self, path: &str, blob: Vec<u8>) -> Result<(), FsError> {
        self.attr(path)?;
        self.xattrs.insert(path.to_owned(), blob);
        Ok(())
    }

    /// Insert a new entity. Regular files also get an empty content entry.
    pub(crate) fn insert(&mut self, path: &str, attr: Attributes, kind: EntityKind) {
        if attr.is_file() {
            self.data.insert(path.to_owned(), Vec::new());
        }
        self.attrs.insert(path.to_owned(), attr);
        self.kinds.insert(path.to_owned(), kind);
    }

    /// Remove `path` from every store.
    pub(crate) fn remove(&mut self, path: &str) -> Result<Attributes, FsError> {
        let attr = self
            .attrs
            .remove(path)
            .ok_or_else(|| FsError::not_found(path))?;
        self.data.remove(path);
        self.xattrs.remove(path);
        self.kinds.remove(path);
        Ok(attr)
    }

    /// Move every store's entry for `from` to `to`.
    pub(crate) fn move_entry(&mut self, from: &str, to: &str) -> Result<(), FsError> {
        let attr = self
            .attrs
            .remove(from)
            .ok_or_else(|| FsError::not_found(from))?;
        self.attrs.insert(to.to_owned(), attr);
        if let Some(content) = self.data.remove(from) {
            self.data.insert(to.to_owned(), content);
        }
        if let Some(blob) = self.xattrs.remove(from) {
            self.xattrs.insert(to.to_owned(), blob);
        }
        if let Some(kind) = self.kinds.remove(from) {
            self.kinds.insert(to.to_owned(), kind);
        }
        Ok(())
    }

    /// Add one subfolder link to `folder`.
    pub(crate) fn link_subfolder(&mut self, folder: &str) -> Result<(), FsError> {
        self.attr_mut(folder)?.nlink += 1;
        Ok(())
    }

    /// Drop one subfolder link from `folder`.
    pub(crate) fn unlink_subfolder(&mut self, folder: &str) -> Result<(), FsError> {
        let attr = self.attr_mut(folder)?;
        attr.nlink = attr.nlink.saturating_sub(1).max(2);
        Ok(())
    }

    /// Check that `path` may receive a new child.
    pub(crate) fn require_folder(&self, path: &str) -> Result<(), FsError> {
        match (self.kind(path), self.attrs.get(path)) {
            (Some(EntityKind::Folder), Some(attr)) if attr.is_dir() => Ok(()),
            (_, Some(_)) => Err(FsError::NotADirectory {
                path: path.to_owned(),
            }),
            (_, None) => Err(FsError::not_found(path)),
        }
    }

    /// Create the reserved export file if it is missing.
    pub(crate) fn ensure_export_entry(&mut self, now: SystemTime) {
        if !self.contains(EXPORT_PATH) {
            self.insert(
                EXPORT_PATH,
                Attributes::file(EXPORT_PERMISSIONS, now),
                EntityKind::File,
            );
        }
    }

    /// Verify the structural invariants every live filesystem keeps.
    pub(crate) fn validate(&self) -> Result<(), FsError> {
        match (self.attrs.get(ROOT), self.kind(ROOT)) {
            (Some(attr), Some(EntityKind::Folder)) if attr.is_dir() => {}
            _ => return Err(invalid("root folder is missing")),
        }

        if self.attrs.len() != self.kinds.len()
            || self.attrs.keys().any(|p| !self.kinds.contains_key(p))
        {
            return Err(invalid("ATTRS and LOOKUPMAP disagree on the set of paths"));
        }

        let mut subfolders: BTreeMap<&str, u64> = BTreeMap::new();
        for (path, attr) in &self.attrs {
            if let Some(parent) = path::parent_of(path) {
                self.require_folder(parent)
                    .map_err(|_| invalid(&format!("parent of {path:?} is not a folder")))?;
                if attr.is_dir() {
                    *subfolders.entry(parent).or_default() += 1;
                }
            }
            if attr.is_file() && attr.size != self.content(path).len() as u64 {
                return Err(invalid(&format!(
                    "size of {path:?} does not match its content"
                )));
            }
        }

        for (path, attr) in self.attrs.iter().filter(|(_, attr)| attr.is_dir()) {
            let expected = 2 + subfolders.get(path.as_str()).copied().unwrap_or(0);
            if attr.nlink != expected {
                return Err(invalid(&format!(
                    "folder {path:?} has {} links, expected {expected}",
                    attr.nlink
                )));
            }
        }

        for path in self.data.keys() {
            if self.kind(path) != Some(EntityKind::File) {
                return Err(invalid(&format!("content stored for non-file {path:?}")));
            }
        }

        for path in self.xattrs.keys() {
            if !self.contains(path) {
                return Err(invalid(&format!(
                    "extended attributes stored for missing {path:?}"
                )));
            }
        }

        Ok(())
    }
}

fn invalid(reason: &str) -> FsError {
    FsError::InvalidSnapshot(reason.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> FsState {
        FsState::new(FsMeta { default_umask: 0o755 }, SystemTime::UNIX_EPOCH)
    }

    #[test]
    fn new_state_has_root_folder() {
        let s = state();
        let root = s.attr(ROOT).unwrap();
        assert!(root.is_dir());
        assert_eq!(root.nlink, 2);
        assert_eq!(root.permissions(), 0o755);
        assert_eq!(s.kind(ROOT), Some(EntityKind::Folder));
        assert!(s.validate().is_ok());
    }

    #[test]
    fn missing_content_reads_empty() {
        let s = state();
        assert!(s.content("nope").is_empty());
        assert!(s.xattrs("nope").is_empty());
    }

    #[test]
    fn missing_attr_is_not_found() {
        let s = state();
        assert!(matches!(s.attr("nope"), Err(FsError::NotFound { .. })));
    }

    #[test]
    fn insert_file_creates_content_entry() {
        let mut s = state();
        s.insert(
            "a",
            Attributes::file(0o644, SystemTime::UNIX_EPOCH),
            EntityKind::File,
        );
        assert!(s.data.contains_key("a"));
        assert_eq!(s.kind("a"), Some(EntityKind::File));
        assert!(s.validate().is_ok());
    }

    #[test]
    fn set_content_tracks_size() {
        let mut s = state();
        s.insert(
            "a",
            Attributes::file(0o644, SystemTime::UNIX_EPOCH),
            EntityKind::File,
        );
        s.set_content("a", b"abc".to_vec()).unwrap();
        assert_eq!(s.attr("a").unwrap().size, 3);
        assert_eq!(s.content("a"), b"abc");
    }

    #[test]
    fn remove_clears_every_store() {
        let mut s = state();
        s.insert(
            "a",
            Attributes::file(0o644, SystemTime::UNIX_EPOCH),
            EntityKind::File,
        );
        s.set_xattrs("a", b"x".to_vec()).unwrap();
        s.remove("a").unwrap();
        assert!(!s.contains("a"));
        assert!(!s.data.contains_key("a"));
        assert!(!s.xattrs.contains_key("a"));
        assert_eq!(s.kind("a"), None);
    }

    #[test]
    fn move_entry_carries_every_store() {
        let mut s = state();
        s.insert(
            "a",
            Attributes::file(0o644, SystemTime::UNIX_EPOCH),
            EntityKind::File,
        );
        s.set_content("a", b"data".to_vec()).unwrap();
        s.set_xattrs("a", b"meta".to_vec()).unwrap();
        s.move_entry("a", "b").unwrap();
        assert_eq!(s.content("b"), b"data");
        assert_eq!(s.xattrs("b"), b"meta");
        assert_eq!(s.kind("b"), Some(EntityKind::File));
        assert!(!s.contains("a"));
        assert!(s.validate().is_ok());
    }

    #[test]
    fn descendants_exclude_self_and_siblings() {
        let mut s = state();
        let now = SystemTime::UNIX_EPOCH;
        s.insert("a", Attributes::folder(0o755, now), EntityKind::Folder);
        s.insert("a/x", Attributes::file(0o644, now), EntityKind::File);
        s.insert("ab", Attributes::file(0o644, now), EntityKind::File);
        let below: Vec<_> = s.descendants("a").collect();
        assert_eq!(below, vec!["a/x"]);
    }

    #[test]
    fn validate_rejects_orphan() {
        let mut s = state();
        s.insert(
            "missing/a",
            Attributes::file(0o644, SystemTime::UNIX_EPOCH),
            EntityKind::File,
        );
        assert!(matches!(s.validate(), Err(FsError::InvalidSnapshot(_))));
    }

    #[test]
    fn validate_rejects_size_mismatch() {
        let mut s = state();
        s.insert(
            "a",
            Attributes::file(0o644, SystemTime::UNIX_EPOCH),
            EntityKind::File,
        );
        s.attr_mut("a").unwrap().size = 10;
        assert!(s.validate().is_err());
    }

    #[test]
    fn validate_rejects_content_on_folder() {
        let mut s = state();
        s.insert(
            "d",
            Attributes::folder(0o755, SystemTime::UNIX_EPOCH),
            EntityKind::Folder,
        );
        s.link_subfolder(ROOT).unwrap();
        assert!(s.validate().is_ok());
        s.data.insert("d".into(), b"x".to_vec());
        assert!(s.validate().is_err());
    }

    #[test]
    fn validate_checks_folder_link_counts() {
        let mut s = state();
        let now = SystemTime::UNIX_EPOCH;
        s.insert("d", Attributes::folder(0o755, now), EntityKind::Folder);
        assert!(matches!(s.validate(), Err(FsError::InvalidSnapshot(_))));

        s.link_subfolder(ROOT).unwrap();
        assert!(s.validate().is_ok());

        s.insert("d/f", Attributes::file(0o644, now), EntityKind::File);
        s.insert("d/l", Attributes::symlink(1, now), EntityKind::Folder);
        assert!(s.validate().is_ok());

        s.attr_mut("d").unwrap().nlink = 5;
        assert!(s.validate().is_err());
    }

    #[test]
    fn validate_rejects_children_of_folder_symlink() {
        let mut s = state();
        let now = SystemTime::UNIX_EPOCH;
        s.insert("d", Attributes::folder(0o755, now), EntityKind::Folder);
        s.link_subfolder(ROOT).unwrap();
        s.insert("l", Attributes::symlink(2, now), EntityKind::Folder);
        assert!(s.validate().is_ok());

        s.insert("l/x", Attributes::file(0o644, now), EntityKind::File);
        assert!(matches!(s.validate(), Err(FsError::InvalidSnapshot(_))));
    }

    #[test]
    fn subfolder_links() {
        let mut s = state();
        s.link_subfolder(ROOT).unwrap();
        assert_eq!(s.attr(ROOT).unwrap().nlink, 3);
        s.unlink_subfolder(ROOT).unwrap();
        assert_eq!(s.attr(ROOT).unwrap().nlink, 2);
        s.unlink_subfolder(ROOT).unwrap();
        assert_eq!(s.attr(ROOT).unwrap().nlink, 2);
    }

    #[test]
    fn require_folder_classifies() {
        let mut s = state();
        s.insert(
            "f",
            Attributes::file(0o644, SystemTime::UNIX_EPOCH),
            EntityKind::File,
        );
        assert!(s.require_folder(ROOT).is_ok());
        assert!(matches!(
            s.require_folder("f"),
            Err(FsError::NotADirectory { .. })
        ));
        assert!(matches!(
            s.require_folder("nope"),
            Err(FsError::NotFound { .. })
        ));
    }

    #[test]
    fn export_entry_is_created_once() {
        let mut s = state();
        s.ensure_export_entry(SystemTime::UNIX_EPOCH);
        s.set_content(EXPORT_PATH, b"{}".to_vec()).unwrap();
        s.ensure_export_entry(SystemTime::UNIX_EPOCH);
        assert_eq!(s.content(EXPORT_PATH), b"{}");
        assert_eq!(s.attr(EXPORT_PATH).unwrap().permissions(), 0o664);
    }
}

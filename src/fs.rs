//! # JsonFs
//!
//! The single owned context a host binding dispatches into.
//!
//! All four stores live in one [`FsState`] behind one mutex. Every operation
//! takes the lock once, so multi-store changes such as `rename` or
//! `remove_dir` are never observed half-done.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use parking_lot::Mutex;

use crate::path::{self, ROOT, canonicalize};
use crate::store::{EXPORT_PATH, FsState};
use crate::types::to_micros;
use crate::{
    Attributes, EntityKind, FsConfig, FsDir, FsError, FsHandles, FsLink, FsMeta, FsPermissions,
    FsRead, FsStats, FsWrite, FsXattr, Handle, Snapshot,
};

/// In-memory filesystem persisted as one [`Snapshot`] document.
///
/// ```rust
/// use jsonfs::{FsRead, FsWrite, JsonFs};
///
/// let fs = JsonFs::default();
/// fs.create_file("/a.txt", 0o644).unwrap();
/// assert_eq!(fs.write("/a.txt", b"hello", 0).unwrap(), 5);
/// assert_eq!(fs.read("/a.txt", 5, 0).unwrap(), b"hello");
/// ```
#[derive(Debug)]
pub struct JsonFs {
    state: Mutex<FsState>,
    config: FsConfig,
    /// Next handle id; 0 is never issued.
    next_handle: AtomicU64,
}

impl JsonFs {
    /// Make a fresh filesystem holding only the root folder and the reserved
    /// export file.
    pub fn new(config: FsConfig) -> Self {
        let now = now();
        let root = Attributes::folder(config.default_umask, now).owned_by(config.uid, config.gid);
        let mut state = FsState::with_root(
            FsMeta {
                default_umask: config.default_umask,
            },
            root,
        );
        state.ensure_export_entry(now);
        tracing::info!(default_umask = config.default_umask, "created filesystem");
        Self::with_state(state, config)
    }

    /// Restore a filesystem from a snapshot document.
    ///
    /// The snapshot's `default_umask` wins over the one in `config`.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidSnapshot`] if the document is malformed or
    ///   inconsistent
    pub fn from_snapshot(snapshot: &Snapshot, config: FsConfig) -> Result<Self, FsError> {
        let mut state = snapshot.decode()?;
        state.ensure_export_entry(now());
        tracing::info!(
            entries = state.attrs.len(),
            "restored filesystem from snapshot"
        );
        Ok(Self::with_state(state, config))
    }

    fn with_state(state: FsState, config: FsConfig) -> Self {
        Self {
            state: Mutex::new(state),
            config,
            next_handle: AtomicU64::new(1),
        }
    }

    /// Capture the current state as a document.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::encode(&self.state.lock())
    }

    /// Run `f` against the current state while holding the lock.
    pub fn inspect<R>(&self, f: impl FnOnce(&FsState) -> R) -> R {
        f(&*self.state.lock())
    }

    /// Settings this filesystem was built with.
    pub fn config(&self) -> FsConfig {
        self.config
    }

    fn issue_handle(&self) -> Handle {
        Handle(self.next_handle.fetch_add(1, Ordering::SeqCst))
    }

    fn new_attributes(&self, attr: Attributes) -> Attributes {
        attr.owned_by(self.config.uid, self.config.gid)
    }
}

impl Default for JsonFs {
    fn default() -> Self {
        Self::new(FsConfig::default())
    }
}

/// Regenerate the export file's content from the rest of the state.
fn refresh_export(state: &mut FsState) -> Result<(), FsError> {
    state.ensure_export_entry(now());
    let text = Snapshot::encode(state).to_json_pretty()?;
    state.set_content(EXPORT_PATH, text.into_bytes())
}

fn reject_export(path: &str, operation: &'static str) -> Result<(), FsError> {
    if path == EXPORT_PATH {
        return Err(FsError::invalid_argument(path, operation));
    }
    Ok(())
}

/// Check `path` names a regular file whose content may change.
fn require_regular(state: &FsState, path: &str, operation: &'static str) -> Result<(), FsError> {
    let attr = state.attr(path)?;
    if attr.is_dir() {
        return Err(FsError::IsADirectory {
            path: path.to_owned(),
        });
    }
    if !attr.is_file() {
        return Err(FsError::invalid_argument(path, operation));
    }
    Ok(())
}

/// Current time at the resolution snapshots keep.
fn now() -> SystemTime {
    to_micros(SystemTime::now())
}

fn to_index(offset: u64) -> usize {
    usize::try_from(offset).unwrap_or(usize::MAX)
}

impl FsRead for JsonFs {
    fn get_attributes(&self, path: &str) -> Result<Attributes, FsError> {
        let path = canonicalize(path);
        let mut state = self.state.lock();
        if path == EXPORT_PATH {
            refresh_export(&mut state)?;
        }
        state.attr(path).cloned()
    }

    fn read(&self, path: &str, size: usize, offset: u64) -> Result<Vec<u8>, FsError> {
        let path = canonicalize(path);
        let mut state = self.state.lock();
        if path == EXPORT_PATH {
            refresh_export(&mut state)?;
        }
        let content = state.content(path);
        let start = to_index(offset).min(content.len());
        let end = start.saturating_add(size).min(content.len());
        tracing::trace!(path, offset, len = end - start, "read");
        Ok(content[start..end].to_vec())
    }
}

impl FsWrite for JsonFs {
    fn create_file(&self, path: &str, mode: u32) -> Result<Handle, FsError> {
        let path = canonicalize(path);
        reject_export(path, "create")?;
        let mut state = self.state.lock();
        if state.contains(path) {
            return Err(FsError::already_exists(path, "create"));
        }
        if let Some(parent) = path::parent_of(path) {
            state.require_folder(parent)?;
        }
        let attr = self.new_attributes(Attributes::file(mode, now()));
        state.insert(path, attr, EntityKind::File);
        tracing::debug!(path, mode, "created file");
        Ok(self.issue_handle())
    }

    fn write(&self, path: &str, data: &[u8], offset: u64) -> Result<usize, FsError> {
        let path = canonicalize(path);
        reject_export(path, "write")?;
        let mut state = self.state.lock();
        require_regular(&state, path, "write")?;

        let current = state.content(path);
        let start = to_index(offset).min(current.len());
        let mut next = Vec::with_capacity(current.len().max(start + data.len()));
        next.extend_from_slice(&current[..start]);
        next.extend_from_slice(data);
        if let Some(tail) = current.get(start + data.len()..) {
            next.extend_from_slice(tail);
        }

        state.set_content(path, next)?;
        state.attr_mut(path)?.mtime = now();
        tracing::debug!(path, offset, len = data.len(), "wrote");
        Ok(data.len())
    }

    fn truncate(&self, path: &str, length: u64) -> Result<(), FsError> {
        let path = canonicalize(path);
        reject_export(path, "truncate")?;
        let mut state = self.state.lock();
        require_regular(&state, path, "truncate")?;

        let content = state.content(path);
        let keep = to_index(length).min(content.len());
        let clipped = content[..keep].to_vec();
        state.set_content(path, clipped)?;
        state.attr_mut(path)?.mtime = now();
        tracing::debug!(path, length, "truncated");
        Ok(())
    }

    fn unlink(&self, path: &str) -> Result<(), FsError> {
        let path = canonicalize(path);
        reject_export(path, "unlink")?;
        let mut state = self.state.lock();
        if state.attr(path)?.is_dir() {
            return Err(FsError::IsADirectory {
                path: path.to_owned(),
            });
        }
        state.remove(path)?;
        tracing::debug!(path, "unlinked");
        Ok(())
    }

    fn rename(&self, old: &str, new: &str) -> Result<(), FsError> {
        let old = canonicalize(old);
        let new = canonicalize(new);
        reject_export(old, "rename")?;
        reject_export(new, "rename")?;
        if old == ROOT {
            return Err(FsError::invalid_argument(old, "rename"));
        }

        let mut state = self.state.lock();
        let is_dir = state.attr(old)?.is_dir();
        if state.contains(new) {
            return Err(FsError::already_exists(new, "rename"));
        }
        if path::is_descendant(new, old) {
            return Err(FsError::invalid_argument(new, "rename"));
        }
        let old_parent = path::parent_of(old).unwrap_or(ROOT);
        let new_parent = path::parent_of(new).unwrap_or(ROOT);
        state.require_folder(new_parent)?;

        let moving: Vec<String> = std::iter::once(old)
            .chain(state.descendants(old))
            .map(str::to_owned)
            .collect();
        for from in &moving {
            let to = path::rebase(from, old, new);
            state.move_entry(from, &to)?;
        }

        if is_dir && old_parent != new_parent {
            state.unlink_subfolder(old_parent)?;
            state.link_subfolder(new_parent)?;
        }
        tracing::debug!(old, new, entries = moving.len(), "renamed");
        Ok(())
    }

    fn set_times(
        &self,
        path: &str,
        times: Option<(SystemTime, SystemTime)>,
    ) -> Result<(), FsError> {
        let path = canonicalize(path);
        let (atime, mtime) = match times {
            Some((atime, mtime)) => (to_micros(atime), to_micros(mtime)),
            None => {
                let now = now();
                (now, now)
            }
        };
        let mut state = self.state.lock();
        let attr = state.attr_mut(path)?;
        attr.atime = atime;
        attr.mtime = mtime;
        tracing::debug!(path, "set times");
        Ok(())
    }
}

impl FsDir for JsonFs {
    fn read_dir(&self, path: &str) -> Result<Vec<String>, FsError> {
        let path = canonicalize(path);
        let state = self.state.lock();
        let mut entries = vec![".".to_owned(), "..".to_owned()];
        entries.extend(state.descendants(path).map(str::to_owned));
        tracing::trace!(path, count = entries.len() - 2, "listed");
        Ok(entries)
    }

    fn create_dir(&self, path: &str, mode: u32) -> Result<(), FsError> {
        let path = canonicalize(path);
        reject_export(path, "mkdir")?;
        let mut state = self.state.lock();
        if state.contains(path) {
            return Err(FsError::already_exists(path, "mkdir"));
        }
        let parent = path::parent_of(path).unwrap_or(ROOT);
        state.require_folder(parent)?;
        let attr = self.new_attributes(Attributes::folder(mode, now()));
        state.insert(path, attr, EntityKind::Folder);
        state.link_subfolder(parent)?;
        tracing::debug!(path, mode, "created folder");
        Ok(())
    }

    fn remove_dir(&self, path: &str) -> Result<(), FsError> {
        let path = canonicalize(path);
        if path == ROOT {
            return Err(FsError::invalid_argument(path, "rmdir"));
        }
        let mut state = self.state.lock();
        if !state.attr(path)?.is_dir() {
            return Err(FsError::NotADirectory {
                path: path.to_owned(),
            });
        }
        if state.descendants(path).next().is_some() {
            return Err(FsError::DirectoryNotEmpty {
                path: path.to_owned(),
            });
        }
        state.remove(path)?;
        state.unlink_subfolder(path::parent_of(path).unwrap_or(ROOT))?;
        tracing::debug!(path, "removed folder");
        Ok(())
    }
}

impl FsLink for JsonFs {
    fn symlink(&self, link: &str, source: &str) -> Result<(), FsError> {
        let link = canonicalize(link);
        reject_export(link, "symlink")?;
        let mut state = self.state.lock();
        if state.contains(link) {
            return Err(FsError::already_exists(link, "symlink"));
        }
        state.require_folder(path::parent_of(link).unwrap_or(ROOT))?;
        let kind = state
            .kind(canonicalize(source))
            .unwrap_or(EntityKind::File);
        let attr = self.new_attributes(Attributes::symlink(
            source.len() as u64,
            now(),
        ));
        state.insert(link, attr, kind);
        tracing::debug!(link, source, ?kind, "created symlink");
        Ok(())
    }
}

impl FsPermissions for JsonFs {
    fn set_mode(&self, path: &str, mode: u32) -> Result<(), FsError> {
        let path = canonicalize(path);
        self.state.lock().attr_mut(path)?.set_permissions(mode);
        tracing::debug!(path, mode, "set mode");
        Ok(())
    }

    fn set_owner(&self, path: &str, uid: u32, gid: u32) -> Result<(), FsError> {
        let path = canonicalize(path);
        let mut state = self.state.lock();
        let attr = state.attr_mut(path)?;
        attr.uid = uid;
        attr.gid = gid;
        tracing::debug!(path, uid, gid, "set owner");
        Ok(())
    }
}

impl FsXattr for JsonFs {
    fn get_xattrs(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let path = canonicalize(path);
        let state = self.state.lock();
        state.attr(path)?;
        Ok(state.xattrs(path).to_vec())
    }

    fn set_xattrs(&self, path: &str, blob: &[u8]) -> Result<(), FsError> {
        let path = canonicalize(path);
        self.state.lock().set_xattrs(path, blob.to_vec())?;
        tracing::debug!(path, len = blob.len(), "set extended attributes");
        Ok(())
    }
}

impl FsHandles for JsonFs {
    fn open(&self, path: &str) -> Result<Handle, FsError> {
        let handle = self.issue_handle();
        tracing::trace!(path, handle = handle.0, "opened");
        Ok(handle)
    }
}

impl FsStats for JsonFs {
    fn statfs(&self, _path: &str) -> Result<Attributes, FsError> {
        self.state.lock().attr(ROOT).cloned()
    }
}

//! Write operations for the filesystem core.

use std::time::SystemTime;

use crate::{FsError, Handle};

/// File creation, mutation and removal.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self`, so
/// implementations guard their state internally.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsWrite`.
pub trait FsWrite: Send + Sync {
    /// Create an empty regular file with permission bits `mode`.
    ///
    /// Returns a fresh handle for the new file.
    ///
    /// # Errors
    ///
    /// - [`FsError::AlreadyExists`] if the path exists
    /// - [`FsError::NotFound`] if the parent folder does not exist
    /// - [`FsError::NotADirectory`] if the parent is not a folder
    /// - [`FsError::InvalidArgument`] for the reserved export file
    fn create_file(&self, path: &str, mode: u32) -> Result<Handle, FsError>;

    /// Splice `data` into the content at `offset`. Returns the bytes written.
    ///
    /// Content before `offset` and after the written range is kept. An
    /// `offset` past the end is not zero-filled: the data lands right after
    /// the existing content.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    /// - [`FsError::IsADirectory`] if the path is a folder
    /// - [`FsError::InvalidArgument`] for the reserved export file
    fn write(&self, path: &str, data: &[u8], offset: u64) -> Result<usize, FsError>;

    /// Clip the content to at most `length` bytes.
    ///
    /// Content never grows; a `length` past the end leaves it unchanged.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    /// - [`FsError::IsADirectory`] if the path is a folder
    /// - [`FsError::InvalidArgument`] for the reserved export file
    fn truncate(&self, path: &str, length: u64) -> Result<(), FsError>;

    /// Remove a non-folder entry from every store.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    /// - [`FsError::IsADirectory`] if the path is a folder (use
    ///   [`FsDir::remove_dir`](super::FsDir::remove_dir))
    /// - [`FsError::InvalidArgument`] for the reserved export file
    fn unlink(&self, path: &str) -> Result<(), FsError>;

    /// Move an entry, with its content and extended attributes, to `new`.
    ///
    /// Folders move together with everything below them.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if `old` or the parent of `new` does not exist
    /// - [`FsError::AlreadyExists`] if `new` exists
    /// - [`FsError::NotADirectory`] if the parent of `new` is not a folder
    /// - [`FsError::InvalidArgument`] for the root, the reserved export file,
    ///   or a folder moved below itself
    fn rename(&self, old: &str, new: &str) -> Result<(), FsError>;

    /// Set access and modification times. `None` sets both to now.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    fn set_times(&self, path: &str, times: Option<(SystemTime, SystemTime)>)
    -> Result<(), FsError>;
}

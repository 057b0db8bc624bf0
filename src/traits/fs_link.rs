//! Symbolic link creation.

use crate::FsError;

/// Symbolic link operations.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self`, so
/// implementations guard their state internally.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsLink`.
pub trait FsLink: Send + Sync {
    /// Create a symbolic link at `link` pointing at `source`.
    ///
    /// The link's size is the byte length of `source`. Its entity kind is
    /// copied from `source` when that path exists, and is `File` otherwise.
    ///
    /// # Errors
    ///
    /// - [`FsError::AlreadyExists`] if `link` exists
    /// - [`FsError::NotFound`] if the parent of `link` does not exist
    /// - [`FsError::NotADirectory`] if the parent of `link` is not a folder
    /// - [`FsError::InvalidArgument`] for the reserved export file
    fn symlink(&self, link: &str, source: &str) -> Result<(), FsError>;
}

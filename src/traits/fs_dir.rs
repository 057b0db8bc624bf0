//! Folder operations for the filesystem core.

use crate::FsError;

/// Folder creation, removal and listing.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self`, so
/// implementations guard their state internally.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsDir`.
pub trait FsDir: Send + Sync {
    /// List a folder.
    ///
    /// Returns `.` and `..` followed by the canonical path of every existing
    /// entry strictly below `path`, in sorted order. Nested entries are
    /// included, not just direct children.
    fn read_dir(&self, path: &str) -> Result<Vec<String>, FsError>;

    /// Create a folder and add one link to its parent.
    ///
    /// # Errors
    ///
    /// - [`FsError::AlreadyExists`] if the path exists
    /// - [`FsError::NotFound`] if the parent folder does not exist
    /// - [`FsError::NotADirectory`] if the parent is not a folder
    /// - [`FsError::InvalidArgument`] for the reserved export file
    fn create_dir(&self, path: &str, mode: u32) -> Result<(), FsError>;

    /// Remove an empty folder and drop one link from its parent.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    /// - [`FsError::NotADirectory`] if the path is not a folder
    /// - [`FsError::DirectoryNotEmpty`] if anything exists below it
    /// - [`FsError::InvalidArgument`] for the root
    fn remove_dir(&self, path: &str) -> Result<(), FsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_dir_is_object_safe() {
        fn _check(_: &dyn FsDir) {}
    }

    #[test]
    fn fs_dir_requires_send_sync() {
        fn _assert_send_sync<T: Send + Sync>() {}
        fn _check<T: FsDir>() {
            _assert_send_sync::<T>();
        }
    }
}

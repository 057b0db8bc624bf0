//! Read operations for the filesystem core.

use crate::{Attributes, FsError};

/// Attribute and content reads.
///
/// Paths are raw host paths; implementations canonicalize them first.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self`, so
/// implementations guard their state internally.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsRead`.
pub trait FsRead: Send + Sync {
    /// Attribute record of `path`.
    ///
    /// Reading the reserved export file first regenerates its content, so
    /// the reported size matches the current snapshot.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    fn get_attributes(&self, path: &str) -> Result<Attributes, FsError>;

    /// Read up to `size` bytes starting at `offset`.
    ///
    /// Reads past the end of the content come back short or empty. Paths
    /// with no content read as empty.
    fn read(&self, path: &str, size: usize, offset: u64) -> Result<Vec<u8>, FsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_read_is_object_safe() {
        fn _check(_: &dyn FsRead) {}
    }

    #[test]
    fn fs_read_requires_send_sync() {
        fn _assert_send_sync<T: Send + Sync>() {}
        fn _check<T: FsRead>() {
            _assert_send_sync::<T>();
        }
    }
}

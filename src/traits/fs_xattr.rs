//! Extended attribute storage.
//!
//! Each path carries one opaque blob of extended-attribute bytes. The core
//! does not parse it into name/value pairs; a host binding that needs
//! per-name access encodes its own layout inside the blob.
//!
//! # Example
//!
//! ```rust
//! use jsonfs::{FsXattr, FsError};
//!
//! // Generic function that works with any FsXattr implementation
//! fn tag_len<B: FsXattr>(backend: &B, path: &str) -> Result<usize, FsError> {
//!     Ok(backend.get_xattrs(path)?.len())
//! }
//! ```

use crate::FsError;

/// Extended attribute operations.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self`, so
/// implementations guard their state internally.
pub trait FsXattr: Send + Sync {
    /// The extended-attribute blob of `path`, empty if never set.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path doesn't exist
    fn get_xattrs(&self, path: &str) -> Result<Vec<u8>, FsError>;

    /// Replace the extended-attribute blob of `path`.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path doesn't exist
    fn set_xattrs(&self, path: &str, blob: &[u8]) -> Result<(), FsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_xattr_is_object_safe() {
        fn _check(_: &dyn FsXattr) {}
    }

    #[test]
    fn fs_xattr_requires_send_sync() {
        fn _assert_send_sync<T: Send + Sync>() {}
        fn _check<T: FsXattr>() {
            _assert_send_sync::<T>();
        }
    }
}

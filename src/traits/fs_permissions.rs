//! Mode and ownership changes.

use crate::FsError;

/// Mode and ownership changes.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self`, so
/// implementations guard their state internally.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsPermissions`.
///
/// # Note
///
/// Bits are recorded, not enforced. Reading them back is done via
/// [`FsRead::get_attributes`](super::FsRead::get_attributes).
pub trait FsPermissions: Send + Sync {
    /// Replace the permission bits of `path`, keeping its type bits.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    fn set_mode(&self, path: &str, mode: u32) -> Result<(), FsError>;

    /// Change the owner of `path`.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    fn set_owner(&self, path: &str, uid: u32, gid: u32) -> Result<(), FsError>;
}

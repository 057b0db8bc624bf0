//! # Filesystem Traits
//!
//! The operation surface a host FUSE binding calls into.
//!
//! ## Quick Reference
//!
//! | Trait | Operations |
//! |-------|------------|
//! | [`FsRead`] | `get_attributes`, `read` |
//! | [`FsWrite`] | `create_file`, `write`, `truncate`, `unlink`, `rename`, `set_times` |
//! | [`FsDir`] | `read_dir`, `create_dir`, `remove_dir` |
//! | [`FsLink`] | `symlink` |
//! | [`FsPermissions`] | `set_mode`, `set_owner` |
//! | [`FsXattr`] | `get_xattrs`, `set_xattrs` |
//! | [`FsHandles`] | `open` |
//! | [`FsStats`] | `statfs` |
//!
//! [`FsOperations`] joins them all and has a blanket implementation: implement
//! the components and the composite comes for free.
//!
//! ## Paths
//!
//! Every method takes the raw path the host delivered. Implementations
//! canonicalize it (see [`canonicalize`](crate::canonicalize)) before touching
//! any store.
//!
//! ## Errors
//!
//! Every method returns `Result<_, FsError>`. Hosts translate failures with
//! [`FsError::errno`](crate::FsError::errno).
//!
//! ## Object Safety
//!
//! All traits are object-safe:
//!
//! ```rust
//! use jsonfs::FsOperations;
//!
//! fn size_of(fs: &dyn FsOperations, path: &str) -> u64 {
//!     fs.get_attributes(path).map(|a| a.size).unwrap_or(0)
//! }
//! ```

mod fs_dir;
mod fs_handles;
mod fs_link;
mod fs_permissions;
mod fs_read;
mod fs_stats;
mod fs_write;
mod fs_xattr;

pub use fs_dir::FsDir;
pub use fs_handles::FsHandles;
pub use fs_link::FsLink;
pub use fs_permissions::FsPermissions;
pub use fs_read::FsRead;
pub use fs_stats::FsStats;
pub use fs_write::FsWrite;
pub use fs_xattr::FsXattr;

/// Every operation a host FUSE binding dispatches.
///
/// # Example
///
/// ```rust
/// use jsonfs::{FsOperations, FsError};
///
/// // Generic function that works with any FsOperations implementation
/// fn save_note<B: FsOperations>(fs: &B, text: &str) -> Result<(), FsError> {
///     fs.create_dir("/notes", 0o755)?;
///     fs.create_file("/notes/today.txt", 0o644)?;
///     fs.write("/notes/today.txt", text.as_bytes(), 0)?;
///     Ok(())
/// }
/// ```
pub trait FsOperations:
    FsRead + FsWrite + FsDir + FsLink + FsPermissions + FsXattr + FsHandles + FsStats
{
}

// Blanket implementation
impl<T> FsOperations for T where
    T: FsRead + FsWrite + FsDir + FsLink + FsPermissions + FsXattr + FsHandles + FsStats
{
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_operations_is_object_safe() {
        fn _check(_: &dyn FsOperations) {}
    }
}

//! Filesystem statistics operations.

use crate::{Attributes, FsError};

/// Filesystem-level capacity query.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsStats`.
pub trait FsStats: Send + Sync {
    /// Capacity and usage of the filesystem holding `path`.
    ///
    /// The in-memory core has no fixed capacity, so this reports the root's
    /// attribute record.
    fn statfs(&self, path: &str) -> Result<Attributes, FsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_stats_is_object_safe() {
        fn _check(_: &dyn FsStats) {}
    }

    #[test]
    fn fs_stats_requires_send_sync() {
        fn _assert_send_sync<T: Send + Sync>() {}
        fn _check<T: FsStats>() {
            _assert_send_sync::<T>();
        }
    }
}

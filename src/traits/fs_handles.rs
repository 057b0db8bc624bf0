//! Handle issuing.
//!
//! Content operations in this core are path-based; handles exist because the
//! host protocol hands one back from every `open` and `create`. Ids only need
//! to be unique: they increase monotonically from 1 and are never reused.

use crate::{FsError, Handle};

/// Handle issuing for a host binding.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Concurrent callers must
/// still receive distinct handles.
pub trait FsHandles: Send + Sync {
    /// Issue a new handle. The path is not checked.
    fn open(&self, path: &str) -> Result<Handle, FsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_handles_is_object_safe() {
        fn _check(_: &dyn FsHandles) {}
    }
}

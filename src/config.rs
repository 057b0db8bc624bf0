//! Construction-time settings for a [`JsonFs`](crate::JsonFs).

use serde::{Deserialize, Serialize};

/// Settings applied when a filesystem is made or restored.
///
/// Deserializes with every field optional, so hosts can embed it in their own
/// configuration files.
///
/// ```rust
/// use jsonfs::FsConfig;
///
/// let config: FsConfig = serde_json::from_str(r#"{"uid": 1000}"#).unwrap();
/// assert_eq!(config.uid, 1000);
/// assert_eq!(config.default_umask, 0o755);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsConfig {
    /// Permission bits of the root folder of a freshly made filesystem.
    /// Restored filesystems keep the value recorded in their snapshot.
    pub default_umask: u32,
    /// Owner uid recorded on entities created by this process.
    pub uid: u32,
    /// Owner gid recorded on entities created by this process.
    pub gid: u32,
}

impl FsConfig {
    /// Settings that create entities owned by `uid:gid`.
    pub fn owned_by(uid: u32, gid: u32) -> Self {
        Self {
            uid,
            gid,
            ..Self::default()
        }
    }
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            default_umask: 0o755,
            uid: 0,
            gid: 0,
        }
    }
}

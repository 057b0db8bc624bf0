//! Core types for the jsonfs filesystem core.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Bit mask for the file type bits of a mode.
pub const S_IFMT: u32 = 0o170000;
/// Directory type bits.
pub const S_IFDIR: u32 = 0o040000;
/// Regular file type bits.
pub const S_IFREG: u32 = 0o100000;
/// Symbolic link type bits.
pub const S_IFLNK: u32 = 0o120000;

/// Permission bits of a mode (including setuid/setgid/sticky).
const PERMISSION_BITS: u32 = 0o7777;

/// Classification of a path in the entity index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Regular file (or a link that points at one).
    #[serde(rename = "FILES")]
    File,
    /// Folder (or a link that points at one).
    #[serde(rename = "FOLDERS")]
    Folder,
}

/// POSIX-like attribute record for one path.
///
/// Field names on the wire follow `struct stat` (`st_mode`, `st_nlink`, ...).
/// Timestamps are written as float seconds since the Unix epoch. Missing
/// fields decode to their defaults, since older snapshots omit some of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attributes {
    /// Type bits plus permission bits.
    #[serde(rename = "st_mode")]
    pub mode: u32,
    /// Number of hard links.
    #[serde(rename = "st_nlink")]
    pub nlink: u64,
    /// Size in bytes.
    #[serde(rename = "st_size")]
    pub size: u64,
    /// Owner user id.
    #[serde(rename = "st_uid")]
    pub uid: u32,
    /// Owner group id.
    #[serde(rename = "st_gid")]
    pub gid: u32,
    /// Creation time.
    #[serde(rename = "st_ctime", with = "system_time_serde")]
    pub ctime: SystemTime,
    /// Last modification time.
    #[serde(rename = "st_mtime", with = "system_time_serde")]
    pub mtime: SystemTime,
    /// Last access time.
    #[serde(rename = "st_atime", with = "system_time_serde")]
    pub atime: SystemTime,
}

impl Attributes {
    fn with_mode(mode: u32, nlink: u64, size: u64, now: SystemTime) -> Self {
        let now = to_micros(now);
        Self {
            mode,
            nlink,
            size,
            uid: 0,
            gid: 0,
            ctime: now,
            mtime: now,
            atime: now,
        }
    }

    /// Attributes for a new, empty regular file.
    pub fn file(permissions: u32, now: SystemTime) -> Self {
        Self::with_mode(S_IFREG | (permissions & PERMISSION_BITS), 1, 0, now)
    }

    /// Attributes for a new folder with no subfolders.
    pub fn folder(permissions: u32, now: SystemTime) -> Self {
        Self::with_mode(S_IFDIR | (permissions & PERMISSION_BITS), 2, 0, now)
    }

    /// Attributes for a symbolic link whose target text is `target_len` bytes.
    pub fn symlink(target_len: u64, now: SystemTime) -> Self {
        Self::with_mode(S_IFLNK | 0o777, 1, target_len, now)
    }

    /// Set the owner.
    pub fn owned_by(mut self, uid: u32, gid: u32) -> Self {
        self.uid = uid;
        self.gid = gid;
        self
    }

    /// The type bits of `mode`.
    #[inline]
    pub fn file_type(&self) -> u32 {
        self.mode & S_IFMT
    }

    /// The permission bits of `mode`.
    #[inline]
    pub fn permissions(&self) -> u32 {
        self.mode & PERMISSION_BITS
    }

    /// Replace the permission bits, keeping the type bits.
    pub fn set_permissions(&mut self, permissions: u32) {
        self.mode = self.file_type() | (permissions & PERMISSION_BITS);
    }

    /// Returns `true` if this is a folder.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.file_type() == S_IFDIR
    }

    /// Returns `true` if this is a regular file.
    #[inline]
    pub fn is_file(&self) -> bool {
        self.file_type() == S_IFREG
    }

    /// Returns `true` if this is a symbolic link.
    #[inline]
    pub fn is_symlink(&self) -> bool {
        self.file_type() == S_IFLNK
    }
}

impl Default for Attributes {
    fn default() -> Self {
        Self::with_mode(0, 0, 0, SystemTime::UNIX_EPOCH)
    }
}

/// Filesystem-wide metadata stored alongside the stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsMeta {
    /// Permission bits of the root folder.
    #[serde(rename = "DEFAULTUMASK")]
    pub default_umask: u32,
}

/// Opaque handle identifier returned by `open` and `create`.
///
/// Ids increase monotonically and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub u64);

/// Round `time` down to whole microseconds. Pre-epoch times clamp to the
/// epoch.
///
/// Snapshots store float seconds, which hold microseconds exactly for any
/// realistic date. Every stored timestamp passes through here so a saved and
/// restored filesystem compares equal to the live one.
pub(crate) fn to_micros(time: SystemTime) -> SystemTime {
    let since = time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
    from_micros(since.as_micros())
}

fn from_micros(micros: u128) -> SystemTime {
    let micros = u64::try_from(micros).unwrap_or(u64::MAX);
    UNIX_EPOCH
        .checked_add(Duration::from_micros(micros))
        .unwrap_or(UNIX_EPOCH)
}

/// SystemTime as float seconds since the epoch, read back to the nearest
/// microsecond. Pre-epoch or non-finite values clamp to the epoch.
mod system_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let duration = time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        let since = Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO);
        Ok(super::from_micros((since.as_nanos() + 500) / 1000))
    }
}

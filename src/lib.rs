//! # jsonfs
//!
//! An in-memory filesystem whose whole state (directory tree, attributes,
//! file contents and extended attributes) is persisted as a single JSON
//! snapshot document.
//!
//! The crate is the core a FUSE host binding calls into. The binding delivers
//! already-parsed calls with raw host paths and maps the returned
//! [`FsError`]s to errno values. Mounting, argument parsing and reading or
//! writing the snapshot file belong to the host.
//!
//! ---
//!
//! ## Quick Start
//!
//! ```rust
//! use jsonfs::{FsConfig, FsDir, FsRead, FsWrite, JsonFs, Snapshot};
//!
//! # fn main() -> Result<(), jsonfs::FsError> {
//! let fs = JsonFs::new(FsConfig::default());
//! fs.create_dir("/docs", 0o755)?;
//! fs.create_file("/docs/a.txt", 0o644)?;
//! fs.write("/docs/a.txt", b"hello", 0)?;
//!
//! // Persist...
//! let text = fs.snapshot().to_json_pretty()?;
//!
//! // ...and restore.
//! let restored = JsonFs::from_snapshot(&Snapshot::from_json(&text)?, FsConfig::default())?;
//! assert_eq!(restored.read("/docs/a.txt", 5, 0)?, b"hello");
//! # Ok(())
//! # }
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`JsonFs`] | The filesystem context; implements every operation trait |
//! | [`FsState`] | The four path-keyed stores plus metadata |
//! | [`Snapshot`] | Serializable document form of an [`FsState`] |
//! | [`EncodedBytes`] | Binary-safe representation of one byte blob |
//! | [`Attributes`] | `stat`-like attribute record |
//! | [`EntityKind`] | File or folder classification |
//! | [`FsError`] | Error taxonomy with errno mapping |
//!
//! ---
//!
//! ## Paths
//!
//! Every store is keyed by canonical path: the host path with leading and
//! trailing `/` removed. The root is the empty string. See [`canonicalize`].
//!
//! ## Reserved Export File
//!
//! [`EXPORT_PATH`] always exists at the root. Reading it (or its attributes)
//! regenerates its content as the JSON of the current snapshot, so a host can
//! copy the whole filesystem out through the mount itself. It cannot be
//! created, written, renamed or removed.
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync` and take `&self`. [`JsonFs`] keeps its
//! state behind a single mutex, so each operation is one atomic step.

// Private modules
mod config;
mod error;
mod fs;
mod path;
mod snapshot;
mod store;
mod traits;
mod types;

// Public re-exports - error types
pub use error::FsError;

// Public re-exports - core types
pub use types::{Attributes, EntityKind, FsMeta, Handle, S_IFDIR, S_IFLNK, S_IFMT, S_IFREG};

// Public re-exports - state and snapshot codec
pub use snapshot::{EncodedBytes, LookupEntry, Snapshot};
pub use store::{EXPORT_PATH, FsState};

// Public re-exports - path codec
pub use path::{ROOT, SEP, canonicalize, is_descendant, parent_of};

// Public re-exports - operation traits
pub use traits::{
    FsDir, FsHandles, FsLink, FsOperations, FsPermissions, FsRead, FsStats, FsWrite, FsXattr,
};

// Public re-exports - filesystem context
pub use config::FsConfig;
pub use fs::JsonFs;

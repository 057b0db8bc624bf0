//! Error types for the jsonfs filesystem core.

/// Filesystem error type returned by every operation.
///
/// Variants carry the canonical path the operation was working on. A host
/// binding turns them into OS error codes with [`FsError::errno`].
///
/// # Examples
///
/// ```rust
/// use jsonfs::FsError;
///
/// let err = FsError::NotFound { path: "docs/a.txt".into() };
/// assert_eq!(err.to_string(), "not found: docs/a.txt");
/// assert_eq!(err.errno(), libc::ENOENT);
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// Path does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// The canonical path that was not found.
        path: String,
    },

    /// Path already exists when it shouldn't.
    #[error("{operation}: already exists: {path}")]
    AlreadyExists {
        /// The canonical path that already exists.
        path: String,
        /// The operation that failed.
        operation: &'static str,
    },

    /// The request conflicts with a reserved path or is otherwise malformed.
    #[error("{operation}: invalid argument: {path}")]
    InvalidArgument {
        /// The canonical path involved.
        path: String,
        /// The operation that failed.
        operation: &'static str,
    },

    /// Expected a folder but found something else.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// The path that is not a folder.
        path: String,
    },

    /// Expected a file but found a folder.
    #[error("is a directory: {path}")]
    IsADirectory {
        /// The path that is a folder.
        path: String,
    },

    /// Folder still has entries beneath it.
    #[error("directory not empty: {path}")]
    DirectoryNotEmpty {
        /// The path to the non-empty folder.
        path: String,
    },

    /// A snapshot document could not be decoded into a consistent filesystem.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

impl FsError {
    /// POSIX errno equivalent for this error.
    pub fn errno(&self) -> i32 {
        match self {
            FsError::NotFound { .. } => libc::ENOENT,
            FsError::AlreadyExists { .. } => libc::EEXIST,
            FsError::InvalidArgument { .. } => libc::EINVAL,
            FsError::NotADirectory { .. } => libc::ENOTDIR,
            FsError::IsADirectory { .. } => libc::EISDIR,
            FsError::DirectoryNotEmpty { .. } => libc::ENOTEMPTY,
            FsError::InvalidSnapshot(_) => libc::EINVAL,
        }
    }

    pub(crate) fn not_found(path: &str) -> Self {
        FsError::NotFound {
            path: path.to_owned(),
        }
    }

    pub(crate) fn already_exists(path: &str, operation: &'static str) -> Self {
        FsError::AlreadyExists {
            path: path.to_owned(),
            operation,
        }
    }

    pub(crate) fn invalid_argument(path: &str, operation: &'static str) -> Self {
        FsError::InvalidArgument {
            path: path.to_owned(),
            operation,
        }
    }
}

impl From<serde_json::Error> for FsError {
    fn from(error: serde_json::Error) -> Self {
        FsError::InvalidSnapshot(error.to_string())
    }
}

impl From<base64::DecodeError> for FsError {
    fn from(error: base64::DecodeError) -> Self {
        FsError::InvalidSnapshot(format!("bad base64 payload: {error}"))
    }
}

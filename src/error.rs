//! Error types for the storage abstraction.

/// Storage error type with contextual variants.
///
/// Policy variants (`FileCountLimit*`, `ForbiddenExtensionRejected`,
/// `MaxSizeLimitExceeded`) are produced by the
/// [`ConfigurationEnforcer`](crate::ConfigurationEnforcer) before a backend is
/// touched. Everything else comes from the backend itself.
///
/// # Examples
///
/// ```rust
/// use anystorage::StorageError;
///
/// let err = StorageError::NotFound { name: "missing.txt".into() };
/// assert_eq!(err.to_string(), "not found: missing.txt");
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    // Policy errors
    /// The directory already holds as many items as its limit allows.
    #[error("file count limit reached in {directory}: {current}/{limit}")]
    FileCountLimitExceeded {
        /// The directory that is full.
        directory: String,
        /// The configured limit.
        limit: usize,
        /// Items currently in the directory.
        current: usize,
    },

    /// A batch of creations would push the directory over its limit.
    #[error(
        "file count limit would be exceeded in {directory}: {current} + {requested} > {limit}"
    )]
    FileCountLimitBatchExceeded {
        /// The directory that would overflow.
        directory: String,
        /// The configured limit.
        limit: usize,
        /// Items currently in the directory.
        current: usize,
        /// Items the batch wanted to add.
        requested: usize,
    },

    /// The extension is on the forbidden list.
    #[error("forbidden extension: {extension} ({name})")]
    ForbiddenExtensionRejected {
        /// The rejected name as given.
        name: String,
        /// The normalized extension that matched.
        extension: String,
    },

    /// The storage would grow past its total size budget.
    #[error("max size limit exceeded: limit {limit}, usage {usage}, requested {requested}")]
    MaxSizeLimitExceeded {
        /// The configured limit in bytes.
        limit: f64,
        /// Bytes currently in use.
        usage: u64,
        /// Bytes the operation wanted to add.
        requested: u64,
    },

    // Item errors
    /// Referenced file or directory does not exist.
    #[error("not found: {name}")]
    NotFound {
        /// The name or path that did not resolve.
        name: String,
    },

    /// Target name collides with an existing item.
    #[error("{operation}: already exists: {name}")]
    AlreadyExists {
        /// The colliding name or path.
        name: String,
        /// The operation that failed.
        operation: &'static str,
    },

    /// Expected a directory but found something else.
    #[error("not a directory: {name}")]
    NotADirectory {
        /// The offending name or path.
        name: String,
    },

    /// Name cannot be used for an item (empty, separators, `.` or `..`).
    #[error("invalid name: {name:?}")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    // Batch errors
    /// A batch stopped at its first failure; earlier steps stay applied.
    #[error("batch stopped after {completed} of {total} steps: {source}")]
    BatchIncomplete {
        /// Steps that completed before the failure.
        completed: usize,
        /// Steps the batch consisted of.
        total: usize,
        /// The failure that stopped the batch.
        #[source]
        source: Box<StorageError>,
    },

    // Configuration errors
    /// The configuration artifact or a configuration value is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Backend selection named something that is not a known backend.
    #[error("unknown backend: {name} (expected `local` or `cloud`)")]
    UnknownBackend {
        /// The value that was given.
        name: String,
    },

    // Backend errors
    /// Underlying transport or disk failure.
    #[error("{operation} failed for {target}: {message}")]
    BackendIo {
        /// The operation that failed.
        operation: &'static str,
        /// The path or id involved.
        target: String,
        /// Backend-specific diagnostic.
        message: String,
    },
}

impl StorageError {
    /// Map an I/O error to the closest storage error, keeping context.
    pub fn io(operation: &'static str, target: impl Into<String>, error: std::io::Error) -> Self {
        let target = target.into();
        match error.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound { name: target },
            std::io::ErrorKind::AlreadyExists => StorageError::AlreadyExists {
                name: target,
                operation,
            },
            _ => StorageError::BackendIo {
                operation,
                target,
                message: error.to_string(),
            },
        }
    }

    /// Returns `true` for errors raised by configuration policy checks.
    pub fn is_policy_violation(&self) -> bool {
        matches!(
            self,
            StorageError::FileCountLimitExceeded { .. }
                | StorageError::FileCountLimitBatchExceeded { .. }
                | StorageError::ForbiddenExtensionRejected { .. }
                | StorageError::MaxSizeLimitExceeded { .. }
        )
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(error: serde_json::Error) -> Self {
        StorageError::InvalidConfig(error.to_string())
    }
}

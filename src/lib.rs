//! # anystorage
//!
//! A storage abstraction that lets one application navigate, create, delete,
//! move, rename, upload, download and search files on interchangeable
//! backends, with one configuration policy enforced the same way everywhere.
//!
//! ---
//!
//! ## Quick Start
//!
//! Open a [`StorageSession`] on a backend and drive it:
//!
//! ```rust,no_run
//! use anystorage::{FilterKey, LocalDiskBackend, SortKey, SortOrder, StorageSession};
//!
//! fn tidy() -> Result<(), anystorage::StorageError> {
//!     let mut session = StorageSession::open(Box::new(LocalDiskBackend::new()), "/srv/storage")?;
//!     session.create_directory_with_limit("inbox", 10)?;
//!     session.create_directory_prefixed_range("week", 1, 4)?;
//!
//!     let tokens = session.search_all()?;
//!     for path in session.sort_results(&tokens, SortKey::ModifyDate, SortOrder::Descending) {
//!         println!("{path}");
//!     }
//!     for row in session.filter_results(&tokens, &[FilterKey::Name, FilterKey::CreationDate]) {
//!         println!("{row}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`StorageBackend`] | The capability contract every backend implements |
//! | [`StorageSession`] | One backend, one configuration, the current directory |
//! | [`Configuration`] | Size budget, forbidden extensions, file-count limits |
//! | [`ConfigurationEnforcer`] | Policy checks run before every mutation |
//! | [`ResultProcessor`] | Sorting and filtering of search results |
//! | [`FileRecord`] | Backend-independent descriptor of a stored item |
//! | [`StorageError`] | Error type with context |
//!
//! ---
//!
//! ## Trait Hierarchy
//!
//! ```text
//! StorageNav + StorageWrite + StorageSearch + StorageConfigStore = StorageBackend
//! ```
//!
//! [`StorageBackend`] has a **blanket implementation**: implement the four
//! component traits and you get it for free.
//!
//! ---
//!
//! ## Backends
//!
//! | Backend | Storage |
//! |---------|---------|
//! | [`LocalDiskBackend`] | the local filesystem via `std::fs` |
//! | [`CloudDriveBackend`] | a cloud drive reached through a [`DriveClient`] |
//! | [`MemoryDrive`] | an in-process [`DriveClient`] with JSON snapshots |
//!
//! Pick one at runtime with [`BackendKind`]; wrap any of them with
//! [`LoggingLayer`] through [`LayerExt::layer`].
//!
//! ---
//!
//! ## Error Handling
//!
//! All operations return `Result<T, StorageError>`. Policy violations are
//! raised before the backend is touched:
//!
//! ```rust
//! use anystorage::StorageError;
//!
//! let err = StorageError::ForbiddenExtensionRejected {
//!     name: "setup.EXE".into(),
//!     extension: "exe".into(),
//! };
//! assert!(err.is_policy_violation());
//! assert_eq!(err.to_string(), "forbidden extension: exe (setup.EXE)");
//! ```
//!
//! ---
//!
//! ## Logging
//!
//! The library logs through the `log` facade: mutations at `info`, checks and
//! navigation at `debug`, skipped search results at `warn`. The `anystorage`
//! binary installs `env_logger`, so `RUST_LOG=debug` shows everything.

// Private modules
mod backends;
mod config;
mod enforcer;
mod error;
mod layer;
mod processor;
mod session;
mod traits;
mod types;

pub mod console;

// Public re-exports - error types
pub use error::StorageError;

// Public re-exports - core types
pub use config::{Configuration, CONFIG_FILE_NAME, DEFAULT_MAX_SIZE_LIMIT};
pub use types::{
    format_token, normalize_extension, split_display_name, split_token, ConfigItem, ConfigValue,
    FileRecord, FilterKey, ItemKind, ItemMetadata, SortKey, SortOrder, DATE_FORMAT,
};

// Public re-exports - traits
pub use traits::{StorageBackend, StorageConfigStore, StorageNav, StorageSearch, StorageWrite};

// Public re-exports - policy and results
pub use enforcer::ConfigurationEnforcer;
pub use processor::{filter_records, sort_records, ResultProcessor};
pub use session::StorageSession;

// Public re-exports - backends
pub use backends::{
    BackendKind, CloudDriveBackend, DriveClient, DriveEntry, DriveItem, DriveQuery,
    LocalDiskBackend, MemoryDrive,
};

// Public re-exports - infrastructure
pub use layer::{Layer, LayerExt, Logged, LoggingLayer};

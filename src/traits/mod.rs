//! # Storage Traits
//!
//! The capability contract every backend implements.
//!
//! ## Components
//!
//! | Trait | Covers |
//! |-------|--------|
//! | [`StorageNav`] | root checks, root creation, entering and leaving directories |
//! | [`StorageWrite`] | create, upload, delete, move, download, rename |
//! | [`StorageSearch`] | searches, token hydration, child counts, usage |
//! | [`StorageConfigStore`] | the persisted configuration artifact |
//!
//! [`StorageBackend`] is the composite of all four and has a blanket
//! implementation: implement the components and you get it for free.
//!
//! ```text
//! StorageNav + StorageWrite + StorageSearch + StorageConfigStore = StorageBackend
//! ```
//!
//! ## Roots
//!
//! Backends hold no session state. Every method receives the root id it acts
//! on; the [`StorageSession`](crate::StorageSession) owns the current root and
//! the configuration. A root id is whatever the backend uses to address a
//! directory: a path for [`LocalDiskBackend`](crate::LocalDiskBackend), an
//! opaque id for [`CloudDriveBackend`](crate::CloudDriveBackend).
//!
//! ## Object Safety
//!
//! All traits are object-safe, so a backend chosen at runtime can be used as
//! `Box<dyn StorageBackend>`:
//!
//! ```rust
//! use anystorage::{StorageBackend, StorageError};
//!
//! fn children(backend: &dyn StorageBackend, root: &str) -> Result<usize, StorageError> {
//!     backend.count_children(root)
//! }
//! ```

mod storage_config;
mod storage_nav;
mod storage_search;
mod storage_write;

pub use storage_config::StorageConfigStore;
pub use storage_nav::StorageNav;
pub use storage_search::StorageSearch;
pub use storage_write::StorageWrite;

pub(crate) use storage_write::validate_item_name;

/// The full storage capability set.
///
/// Automatically implemented for any type implementing all four component
/// traits. Policy enforcement happens above this seam, in the session, so
/// implementations stay plain I/O executors.
///
/// # Available Methods
///
/// From [`StorageNav`]:
/// - `check_root`, `create_root`, `resolve_root`, `enter_directory`, `parent_directory`
///
/// From [`StorageWrite`]:
/// - `create_directory`, `add_file`, `delete_file_or_folder`
/// - `move_file_or_directory`, `download_file_or_directory`, `rename_file_or_directory`
///
/// From [`StorageSearch`]:
/// - `search_by_name`, `search_by_extension`, `search_by_modified_after`, `search_by_part_of_name`
/// - `search_all`, `search_all_from_root`, `search_all_from_root_without_root`
/// - `describe`, `return_file_list`, `count_children`, `total_usage`
///
/// From [`StorageConfigStore`]:
/// - `check_config`, `read_config_artifact`, `write_config_artifact`, `read_config`
pub trait StorageBackend: StorageNav + StorageWrite + StorageSearch + StorageConfigStore {}

impl<T: StorageNav + StorageWrite + StorageSearch + StorageConfigStore> StorageBackend for T {}

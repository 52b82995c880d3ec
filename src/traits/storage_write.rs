//! Mutating operations for storage backends.

use std::path::{Path, PathBuf};

use crate::StorageError;

/// Create, transfer, move, rename and delete items.
///
/// Backends are plain I/O executors: policy checks (file-count, extension,
/// size) have already run when these methods are called. Backends are still
/// responsible for name collisions and missing items.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self`.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn StorageWrite`.
pub trait StorageWrite: Send + Sync {
    /// Create directory `name` inside `root` and return its id.
    ///
    /// # Errors
    ///
    /// - [`StorageError::AlreadyExists`] if `name` is taken
    /// - [`StorageError::InvalidName`] if `name` is not a single component
    fn create_directory(&self, root: &str, name: &str) -> Result<String, StorageError>;

    /// Copy or upload the local file at `local_path` into `root`.
    ///
    /// Returns the id of the stored item.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotFound`] if `local_path` does not exist
    /// - [`StorageError::AlreadyExists`] if an item with the same name exists
    fn add_file(&self, root: &str, local_path: &Path) -> Result<String, StorageError>;

    /// Delete the file or directory tree `name` inside `root`.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotFound`] if `name` does not exist
    fn delete_file_or_folder(&self, root: &str, name: &str) -> Result<(), StorageError>;

    /// Move `name` from `root` into directory `dest_root`.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotFound`] if `name` does not exist
    /// - [`StorageError::AlreadyExists`] if `dest_root` already holds `name`
    fn move_file_or_directory(
        &self,
        root: &str,
        name: &str,
        dest_root: &str,
    ) -> Result<(), StorageError>;

    /// Copy `name` out of the backend into the local directory `dest`.
    ///
    /// Returns the local path written.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotFound`] if `name` does not exist
    /// - [`StorageError::AlreadyExists`] if `dest` already holds `name`
    fn download_file_or_directory(
        &self,
        root: &str,
        name: &str,
        dest: &Path,
    ) -> Result<PathBuf, StorageError>;

    /// Rename `name` inside `root` to `new_name`.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotFound`] if `name` does not exist
    /// - [`StorageError::AlreadyExists`] if `new_name` is taken
    fn rename_file_or_directory(
        &self,
        root: &str,
        name: &str,
        new_name: &str,
    ) -> Result<(), StorageError>;
}

/// Reject names that are not a single path component.
pub(crate) fn validate_item_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(StorageError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

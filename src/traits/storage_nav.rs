//! Directory navigation for storage backends.

use crate::StorageError;

/// Navigation between directories of a backend.
///
/// Backends do not track a current directory. Every method receives the root
/// it acts on and returns the id of the directory it resolved, leaving the
/// session to decide what becomes current.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self`.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn StorageNav`.
pub trait StorageNav: Send + Sync {
    /// Check whether `root` addresses an existing directory.
    ///
    /// # Errors
    ///
    /// - [`StorageError::BackendIo`] if the backend could not be queried
    fn check_root(&self, root: &str) -> Result<bool, StorageError>;

    /// Create a directory at `root`.
    ///
    /// Returns the id of the new directory, or `Ok(None)` when something
    /// already exists there. For path-addressed backends the id is the path;
    /// for id-addressed backends `root` is the folder name.
    ///
    /// # Errors
    ///
    /// - [`StorageError::BackendIo`] if the directory could not be created
    fn create_root(&self, root: &str) -> Result<Option<String>, StorageError>;

    /// Resolve the user-facing `root` to the id of an existing directory.
    ///
    /// The default accepts `root` as-is when [`check_root`](Self::check_root)
    /// does. Backends whose ids differ from what users type (canonical paths,
    /// opaque drive ids) override this.
    fn resolve_root(&self, root: &str) -> Result<Option<String>, StorageError> {
        Ok(self.check_root(root)?.then(|| root.to_string()))
    }

    /// Resolve `name` inside `root` to a child directory.
    ///
    /// Returns `Ok(None)` if there is no such child or it is not a directory.
    ///
    /// # Errors
    ///
    /// - [`StorageError::BackendIo`] if the backend could not be queried
    fn enter_directory(&self, root: &str, name: &str) -> Result<Option<String>, StorageError>;

    /// Resolve the parent of `root`.
    ///
    /// Returns `Ok(None)` at the backend's top boundary.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotFound`] if `root` does not exist
    fn parent_directory(&self, root: &str) -> Result<Option<String>, StorageError>;
}

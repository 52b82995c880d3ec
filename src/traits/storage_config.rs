//! Persistence of the configuration artifact.

use crate::{ConfigItem, ConfigValue, Configuration, StorageError};

/// Store and load the configuration artifact of a storage root.
///
/// Backends treat the artifact as an opaque JSON blob; parsing lives in
/// [`Configuration`].
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self`.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn StorageConfigStore`.
pub trait StorageConfigStore: Send + Sync {
    /// Check whether a configuration artifact exists under `root`.
    fn check_config(&self, root: &str) -> Result<bool, StorageError>;

    /// Read the raw artifact stored under `root`.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotFound`] if there is no artifact
    fn read_config_artifact(&self, root: &str) -> Result<String, StorageError>;

    /// Replace the artifact under `root` with `json`.
    ///
    /// A concurrent reader must never observe a half-written artifact.
    fn write_config_artifact(&self, root: &str, json: &str) -> Result<(), StorageError>;

    /// Load and parse the artifact under `root`.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotFound`] if there is no artifact
    /// - [`StorageError::InvalidConfig`] if it cannot be parsed
    fn load_config(&self, root: &str) -> Result<Configuration, StorageError> {
        Configuration::from_json(&self.read_config_artifact(root)?)
    }

    /// Read one item of the persisted configuration under `root`.
    fn read_config(&self, root: &str, item: ConfigItem) -> Result<ConfigValue, StorageError> {
        Ok(self.load_config(root)?.item(item))
    }
}

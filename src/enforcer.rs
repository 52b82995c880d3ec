//! # Configuration Enforcer
//!
//! Policy checks that run before any mutating backend call.
//!
//! Each check reads the [`Configuration`] and, where needed, queries the
//! backend (child counts, usage). None of them mutate anything, so a failed
//! check leaves the backend untouched.

use log::debug;

use crate::{Configuration, StorageConfigStore, StorageError, StorageSearch};

/// Validates operations against the active configuration.
///
/// Borrowed for the duration of one operation; see
/// [`StorageSession`](crate::StorageSession) for how it is wired in.
///
/// # Example
///
/// ```rust
/// use anystorage::{
///     Configuration, ConfigurationEnforcer, StorageConfigStore, StorageError, StorageSearch,
/// };
///
/// fn may_upload<B: StorageSearch + StorageConfigStore + ?Sized>(
///     backend: &B,
///     config: &Configuration,
///     storage_root: &str,
///     extension: &str,
///     size: u64,
/// ) -> Result<(), StorageError> {
///     let enforcer = ConfigurationEnforcer::new(backend, config, storage_root);
///     enforcer.check_forbidden_extension(extension)?;
///     enforcer.check_max_size_limit(size)
/// }
/// ```
pub struct ConfigurationEnforcer<'a, B: ?Sized> {
    backend: &'a B,
    config: &'a Configuration,
    storage_root: &'a str,
}

impl<'a, B: StorageSearch + StorageConfigStore + ?Sized> ConfigurationEnforcer<'a, B> {
    /// Create an enforcer for the storage rooted at `storage_root`.
    pub fn new(backend: &'a B, config: &'a Configuration, storage_root: &'a str) -> Self {
        Self {
            backend,
            config,
            storage_root,
        }
    }

    /// Items in `directory` that count against its limit.
    ///
    /// The configuration artifact only lives in the storage root and is not
    /// counted there.
    fn item_count(&self, directory: &str) -> Result<usize, StorageError> {
        let children = self.backend.count_children(directory)?;
        if directory == self.storage_root && self.backend.check_config(directory)? {
            return Ok(children.saturating_sub(1));
        }
        Ok(children)
    }

    /// Fail if `directory` already holds as many items as its limit.
    ///
    /// # Errors
    ///
    /// - [`StorageError::FileCountLimitExceeded`] if the directory is full
    pub fn check_file_count_limit(&self, directory: &str) -> Result<(), StorageError> {
        let Some(limit) = self.config.limit_for(directory) else {
            return Ok(());
        };
        let current = self.item_count(directory)?;
        debug!("file count check for {directory}: {current}/{limit}");
        if current >= limit {
            return Err(StorageError::FileCountLimitExceeded {
                directory: directory.to_string(),
                limit,
                current,
            });
        }
        Ok(())
    }

    /// Fail if adding `count` items to `directory` would exceed its limit.
    ///
    /// # Errors
    ///
    /// - [`StorageError::FileCountLimitBatchExceeded`] if the batch would overflow
    pub fn check_multiple_file_count_limit(
        &self,
        directory: &str,
        count: usize,
    ) -> Result<(), StorageError> {
        let Some(limit) = self.config.limit_for(directory) else {
            return Ok(());
        };
        let current = self.item_count(directory)?;
        debug!("batch file count check for {directory}: {current} + {count} vs {limit}");
        if current.saturating_add(count) > limit {
            return Err(StorageError::FileCountLimitBatchExceeded {
                directory: directory.to_string(),
                limit,
                current,
                requested: count,
            });
        }
        Ok(())
    }

    /// Fail if `name` (an extension or a file name) is forbidden.
    ///
    /// # Errors
    ///
    /// - [`StorageError::ForbiddenExtensionRejected`] on a match
    pub fn check_forbidden_extension(&self, name: &str) -> Result<(), StorageError> {
        match self.config.forbidden_match(name) {
            Some(extension) => Err(StorageError::ForbiddenExtensionRejected {
                name: name.to_string(),
                extension,
            }),
            None => Ok(()),
        }
    }

    /// Fail if storing `size` more bytes would exceed the total budget.
    ///
    /// # Errors
    ///
    /// - [`StorageError::MaxSizeLimitExceeded`] if the budget would be exceeded
    pub fn check_max_size_limit(&self, size: u64) -> Result<(), StorageError> {
        let usage = self.backend.total_usage(self.storage_root)?;
        let limit = self.config.max_size_limit();
        debug!("size check for {}: {usage} + {size} vs {limit}", self.storage_root);
        if usage as f64 + size as f64 > limit {
            return Err(StorageError::MaxSizeLimitExceeded {
                limit,
                usage,
                requested: size,
            });
        }
        Ok(())
    }
}

//! Per-storage-root policy and its persisted artifact.
//!
//! The artifact is a JSON document named [`CONFIG_FILE_NAME`] stored as a
//! child of the storage root:
//!
//! ```json
//! {
//!   "max_size_limit": 16106127360.0,
//!   "forbidden_extensions": ["exe"],
//!   "file_count_limits": { "/srv/storage/inbox": 10 }
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::{normalize_extension, split_display_name, ConfigItem, ConfigValue};
use crate::StorageError;

/// Reserved name of the configuration artifact.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Default total size budget (15 GiB).
pub const DEFAULT_MAX_SIZE_LIMIT: f64 = 16_106_127_360.0;

/// Storage policy for one root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    max_size_limit: f64,
    #[serde(default)]
    forbidden_extensions: BTreeSet<String>,
    #[serde(default)]
    file_count_limits: BTreeMap<String, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_file_count_limit: Option<usize>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            max_size_limit: DEFAULT_MAX_SIZE_LIMIT,
            forbidden_extensions: BTreeSet::new(),
            file_count_limits: BTreeMap::new(),
            default_file_count_limit: None,
        }
    }
}

impl Configuration {
    /// Create a configuration with a size budget and forbidden extensions.
    ///
    /// # Errors
    ///
    /// - [`StorageError::InvalidConfig`] if `max_size_limit` is negative or NaN
    pub fn new<I, S>(max_size_limit: f64, forbidden_extensions: I) -> Result<Self, StorageError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config = Self::default();
        config.set_max_size_limit(max_size_limit)?;
        config.set_forbidden_extensions(forbidden_extensions);
        Ok(config)
    }

    /// Total size budget in bytes.
    pub fn max_size_limit(&self) -> f64 {
        self.max_size_limit
    }

    /// Replace the size budget.
    ///
    /// # Errors
    ///
    /// - [`StorageError::InvalidConfig`] if `limit` is negative or NaN
    pub fn set_max_size_limit(&mut self, limit: f64) -> Result<(), StorageError> {
        if limit.is_nan() || limit < 0.0 {
            return Err(StorageError::InvalidConfig(format!(
                "max_size_limit must be >= 0, got {limit}"
            )));
        }
        self.max_size_limit = limit;
        Ok(())
    }

    /// Forbidden extensions, normalized.
    pub fn forbidden_extensions(&self) -> &BTreeSet<String> {
        &self.forbidden_extensions
    }

    /// Replace the forbidden extensions. Entries are normalized and blanks dropped.
    pub fn set_forbidden_extensions<I, S>(&mut self, extensions: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.forbidden_extensions = extensions
            .into_iter()
            .map(|ext| normalize_extension(ext.as_ref()))
            .filter(|ext| !ext.is_empty())
            .collect();
    }

    /// Add one forbidden extension.
    pub fn forbid_extension(&mut self, extension: &str) {
        let ext = normalize_extension(extension);
        if !ext.is_empty() {
            self.forbidden_extensions.insert(ext);
        }
    }

    /// Returns the matching forbidden extension for `name`, if any.
    ///
    /// `name` may be a bare extension (`" EXE "`) or a file name
    /// (`"setup.EXE"`); both readings are checked.
    pub fn forbidden_match(&self, name: &str) -> Option<String> {
        let whole = normalize_extension(name);
        if self.forbidden_extensions.contains(&whole) {
            return Some(whole);
        }
        let (_, ext) = split_display_name(name.trim());
        let ext = normalize_extension(ext);
        if !ext.is_empty() && self.forbidden_extensions.contains(&ext) {
            return Some(ext);
        }
        None
    }

    /// Per-directory file-count limits.
    pub fn file_count_limits(&self) -> &BTreeMap<String, usize> {
        &self.file_count_limits
    }

    /// Replace all per-directory file-count limits.
    pub fn set_file_count_limits(&mut self, limits: BTreeMap<String, usize>) {
        self.file_count_limits = limits;
    }

    /// Set the limit for one directory.
    pub fn set_file_count_limit(&mut self, directory: impl Into<String>, limit: usize) {
        self.file_count_limits.insert(directory.into(), limit);
    }

    /// Limit applied to directories without their own entry.
    pub fn default_file_count_limit(&self) -> Option<usize> {
        self.default_file_count_limit
    }

    /// Set or clear the default limit.
    pub fn set_default_file_count_limit(&mut self, limit: Option<usize>) {
        self.default_file_count_limit = limit;
    }

    /// Effective limit for `directory`: its own entry, else the default.
    pub fn limit_for(&self, directory: &str) -> Option<usize> {
        self.file_count_limits
            .get(directory)
            .copied()
            .or(self.default_file_count_limit)
    }

    /// Project one item out of the configuration.
    pub fn item(&self, item: ConfigItem) -> ConfigValue {
        match item {
            ConfigItem::MaxSizeLimit => ConfigValue::MaxSizeLimit(self.max_size_limit),
            ConfigItem::ForbiddenExtensions => ConfigValue::ForbiddenExtensions(
                self.forbidden_extensions.iter().cloned().collect(),
            ),
            ConfigItem::FileCountLimits => {
                ConfigValue::FileCountLimits(self.file_count_limits.clone())
            }
        }
    }

    /// Serialize to the artifact format.
    ///
    /// # Errors
    ///
    /// - [`StorageError::InvalidConfig`] if serialization fails
    pub fn to_json(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse an artifact, re-applying normalization and validation.
    ///
    /// # Errors
    ///
    /// - [`StorageError::InvalidConfig`] for malformed JSON or invalid values
    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        let raw: Configuration = serde_json::from_str(json)?;
        let mut config = Configuration::new(raw.max_size_limit, raw.forbidden_extensions)?;
        config.file_count_limits = raw.file_count_limits;
        config.default_file_count_limit = raw.default_file_count_limit;
        Ok(config)
    }
}

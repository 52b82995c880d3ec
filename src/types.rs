//! Core types shared by backends, the session and the result processor.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// Format used when rendering dates in filtered rows.
pub const DATE_FORMAT: &str = "%Y.%m.%d";

/// Kind of a stored item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ItemKind {
    /// Regular file.
    File,
    /// Directory (or folder, on a cloud drive).
    Directory,
}

/// Full metadata for a single item, as returned by
/// [`StorageSearch::describe`](crate::StorageSearch::describe).
#[derive(Debug, Clone)]
pub struct ItemMetadata {
    /// Backend-specific addressable location of the item.
    pub path: String,
    /// Display name (the last path component, or the drive title).
    pub display_name: String,
    /// File or directory.
    pub kind: ItemKind,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Creation time.
    pub created: DateTime<Utc>,
    /// Last modification time.
    pub modified: DateTime<Utc>,
}

/// Backend-independent descriptor of a stored item.
///
/// Immutable once built. `name` and `extension` are always derived from the
/// display name by [`split_display_name`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    path: String,
    name: String,
    extension: String,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl FileRecord {
    /// Build a record from a display name and timestamps.
    pub fn new(
        path: impl Into<String>,
        display_name: &str,
        created_at: DateTime<Utc>,
        modified_at: DateTime<Utc>,
    ) -> Self {
        let (name, extension) = split_display_name(display_name);
        Self {
            path: path.into(),
            name: name.to_string(),
            extension: extension.to_string(),
            created_at,
            modified_at,
        }
    }

    /// Addressable location of the item.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Name without extension.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Extension without the dot; empty when the item has none.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last modification time.
    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }
}

impl From<ItemMetadata> for FileRecord {
    fn from(meta: ItemMetadata) -> Self {
        FileRecord::new(meta.path, &meta.display_name, meta.created, meta.modified)
    }
}

/// Split a display name into `(name, extension)`.
///
/// The extension is whatever follows the last `.`, unless that dot starts the
/// name (dotfiles have no extension).
///
/// ```rust
/// use anystorage::split_display_name;
///
/// assert_eq!(split_display_name("report.final.pdf"), ("report.final", "pdf"));
/// assert_eq!(split_display_name(".bashrc"), (".bashrc", ""));
/// assert_eq!(split_display_name("Makefile"), ("Makefile", ""));
/// ```
pub fn split_display_name(display_name: &str) -> (&str, &str) {
    match display_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext),
        _ => (display_name, ""),
    }
}

/// Normalize an extension for comparison: trimmed, lowercase, no leading dot.
pub fn normalize_extension(extension: &str) -> String {
    let trimmed = extension.trim();
    trimmed
        .strip_prefix('.')
        .unwrap_or(trimmed)
        .trim()
        .to_lowercase()
}

/// Build a result token (`"<name> <opaque-id>"`).
pub fn format_token(name: &str, id: &str) -> String {
    format!("{name} {id}")
}

/// Split a token at its last space into `(name, id)`.
///
/// Returns `None` for tokens without a space or with an empty half.
pub fn split_token(token: &str) -> Option<(&str, &str)> {
    let (name, id) = token.rsplit_once(' ')?;
    if name.is_empty() || id.is_empty() {
        return None;
    }
    Some((name, id))
}

/// Key used by [`ResultProcessor::sort_results`](crate::ResultProcessor::sort_results).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    /// Lexicographic by name.
    Name,
    /// Lexicographic by extension.
    Extension,
    /// Chronological by creation time.
    CreationDate,
    /// Chronological by modification time.
    ModifyDate,
}

/// Direction of a sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

/// Field rendered by [`ResultProcessor::filter_results`](crate::ResultProcessor::filter_results).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKey {
    /// Name without extension.
    Name,
    /// Extension.
    Extension,
    /// Creation date (`yyyy.MM.dd`).
    CreationDate,
    /// Modification date (`yyyy.MM.dd`).
    ModifyDate,
}

/// Selects one part of the persisted configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigItem {
    /// Total size budget in bytes.
    MaxSizeLimit,
    /// Forbidden extensions.
    ForbiddenExtensions,
    /// Per-directory file-count limits.
    FileCountLimits,
}

/// Value of one configuration item.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    /// Total size budget in bytes.
    MaxSizeLimit(f64),
    /// Forbidden extensions, sorted.
    ForbiddenExtensions(Vec<String>),
    /// Per-directory file-count limits.
    FileCountLimits(BTreeMap<String, usize>),
}

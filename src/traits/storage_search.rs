//! Search primitives and token hydration.
//!
//! Searches return compact tokens (`"<name> <opaque-id>"`). Turning a token
//! into a [`FileRecord`] is a second step, [`StorageSearch::return_file_list`],
//! because listing queries on some backends return less metadata than
//! single-item queries.

use chrono::{DateTime, Utc};
use log::warn;

use crate::config::CONFIG_FILE_NAME;
use crate::types::split_token;
use crate::{FileRecord, ItemMetadata, StorageError};

/// Search and metadata operations.
///
/// Unless stated otherwise a search covers the direct children of `root`.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self`.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn StorageSearch`.
pub trait StorageSearch: Send + Sync {
    /// Children whose display name equals `name`.
    fn search_by_name(&self, root: &str, name: &str) -> Result<Vec<String>, StorageError>;

    /// Children whose extension matches `extension`.
    ///
    /// Matching ignores case, surrounding whitespace and a leading dot.
    fn search_by_extension(&self, root: &str, extension: &str)
    -> Result<Vec<String>, StorageError>;

    /// Children modified strictly after `date`.
    fn search_by_modified_after(
        &self,
        root: &str,
        date: DateTime<Utc>,
    ) -> Result<Vec<String>, StorageError>;

    /// Children whose display name contains `substring`.
    fn search_by_part_of_name(
        &self,
        root: &str,
        substring: &str,
    ) -> Result<Vec<String>, StorageError>;

    /// Every direct child of `root`.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotFound`] if `root` does not exist
    fn search_all_from_root(&self, root: &str) -> Result<Vec<String>, StorageError>;

    /// Ids of the direct child directories of `root`.
    fn subdirectories(&self, root: &str) -> Result<Vec<String>, StorageError>;

    /// Every item inside the subdirectories of `root`, at any depth.
    ///
    /// The direct children of `root` are not included.
    fn search_all_from_root_without_root(&self, root: &str) -> Result<Vec<String>, StorageError> {
        let mut tokens = Vec::new();
        for dir in self.subdirectories(root)? {
            tokens.extend(self.search_all(&dir)?);
        }
        Ok(tokens)
    }

    /// Every item below `root`, at any depth.
    ///
    /// Direct children come first, then the contents of each subdirectory.
    fn search_all(&self, root: &str) -> Result<Vec<String>, StorageError> {
        let mut tokens = self.search_all_from_root(root)?;
        tokens.extend(self.search_all_from_root_without_root(root)?);
        Ok(tokens)
    }

    /// Full metadata for the item with opaque id `id`.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotFound`] if the id does not resolve
    fn describe(&self, id: &str) -> Result<ItemMetadata, StorageError>;

    /// Split a token into `(name, id)`.
    ///
    /// The default splits at the last space, which is correct whenever ids
    /// contain no spaces.
    fn parse_token(&self, token: &str) -> Option<(String, String)> {
        split_token(token).map(|(name, id)| (name.to_string(), id.to_string()))
    }

    /// Hydrate tokens into records, keeping their order.
    ///
    /// Malformed tokens and ids that no longer resolve are skipped, so one
    /// stale entry never hides the rest of a listing.
    fn return_file_list(&self, tokens: &[String]) -> Vec<FileRecord> {
        tokens
            .iter()
            .filter_map(|token| {
                let Some((_, id)) = self.parse_token(token) else {
                    warn!("skipping malformed result token {token:?}");
                    return None;
                };
                match self.describe(&id) {
                    Ok(meta) => Some(FileRecord::from(meta)),
                    Err(e) => {
                        warn!("skipping result token {token:?}: {e}");
                        None
                    }
                }
            })
            .collect()
    }

    /// Number of items directly inside `root`, the config artifact included.
    fn count_children(&self, root: &str) -> Result<usize, StorageError>;

    /// Total bytes stored below `root`, at any depth.
    fn total_usage(&self, root: &str) -> Result<u64, StorageError>;

    /// Path a [`FileRecord`] for the config artifact of `root` would carry.
    fn config_path(&self, root: &str) -> String {
        format!("{root}/{CONFIG_FILE_NAME}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ItemKind;
    use chrono::TimeZone;

    /// Search backend with one describable item, `good`.
    struct OneItem;

    impl StorageSearch for OneItem {
        fn search_by_name(&self, _: &str, _: &str) -> Result<Vec<String>, StorageError> {
            Ok(vec![])
        }
        fn search_by_extension(&self, _: &str, _: &str) -> Result<Vec<String>, StorageError> {
            Ok(vec![])
        }
        fn search_by_modified_after(
            &self,
            _: &str,
            _: DateTime<Utc>,
        ) -> Result<Vec<String>, StorageError> {
            Ok(vec![])
        }
        fn search_by_part_of_name(&self, _: &str, _: &str) -> Result<Vec<String>, StorageError> {
            Ok(vec![])
        }
        fn search_all_from_root(&self, root: &str) -> Result<Vec<String>, StorageError> {
            Ok(match root {
                "top" => vec!["a top/a".into(), "sub top/sub".into()],
                "top/sub" => vec!["b top/sub/b".into()],
                _ => vec![],
            })
        }
        fn subdirectories(&self, root: &str) -> Result<Vec<String>, StorageError> {
            Ok(match root {
                "top" => vec!["top/sub".into()],
                _ => vec![],
            })
        }
        fn describe(&self, id: &str) -> Result<ItemMetadata, StorageError> {
            if id != "good" {
                return Err(StorageError::NotFound { name: id.into() });
            }
            let when = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
            Ok(ItemMetadata {
                path: "root/good.txt".into(),
                display_name: "good.txt".into(),
                kind: ItemKind::File,
                size: 1,
                created: when,
                modified: when,
            })
        }
        fn count_children(&self, _: &str) -> Result<usize, StorageError> {
            Ok(0)
        }
        fn total_usage(&self, _: &str) -> Result<u64, StorageError> {
            Ok(0)
        }
    }

    #[test]
    fn storage_search_is_object_safe() {
        fn _check(_: &dyn StorageSearch) {}
    }

    #[test]
    fn return_file_list_skips_malformed_and_stale() {
        let tokens = vec![
            "garbage".to_string(),
            "good.txt good".to_string(),
            "gone.txt missing".to_string(),
        ];
        let records = OneItem.return_file_list(&tokens);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name(), "good");
    }

    #[test]
    fn search_all_is_children_then_nested() {
        let all = OneItem.search_all("top").unwrap();
        assert_eq!(all, vec!["a top/a", "sub top/sub", "b top/sub/b"]);
        let nested = OneItem.search_all_from_root_without_root("top").unwrap();
        assert_eq!(nested, vec!["b top/sub/b"]);
    }

    #[test]
    fn default_config_path() {
        assert_eq!(OneItem.config_path("abc"), "abc/config.json");
    }
}

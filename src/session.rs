//! # Storage Session
//!
//! The façade applications drive: one backend, one configuration and the
//! current-root state.
//!
//! Every mutating operation runs the [`ConfigurationEnforcer`] checks first
//! and only then calls into the backend, so a policy failure never reaches it.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::processor::{filter_records, sort_records};
use crate::{
    ConfigItem, ConfigValue, Configuration, ConfigurationEnforcer, FileRecord, FilterKey,
    ResultProcessor, SortKey, SortOrder, StorageBackend, StorageConfigStore, StorageError,
    StorageNav, StorageSearch, StorageWrite,
};

/// A storage opened on one root of one backend.
///
/// `B` may be unsized, so a backend picked at runtime works as
/// `StorageSession<dyn StorageBackend>`.
///
/// # Example
///
/// ```rust,no_run
/// use anystorage::{LocalDiskBackend, StorageSession};
///
/// let mut session = StorageSession::open(Box::new(LocalDiskBackend::new()), "/srv/storage")?;
/// session.create_directory("inbox")?;
/// session.enter_directory("inbox")?;
/// # Ok::<(), anystorage::StorageError>(())
/// ```
pub struct StorageSession<B: ?Sized + StorageBackend> {
    backend: Box<B>,
    storage_root: String,
    current_root: String,
    config: Configuration,
}

impl<B: ?Sized + StorageBackend> StorageSession<B> {
    /// Open the storage at `root`, creating the directory if it is missing.
    ///
    /// A persisted configuration is loaded when present; otherwise the
    /// session starts from [`Configuration::default`] until
    /// [`create_config`](Self::create_config) is called.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotADirectory`] if something other than a directory is at `root`
    /// - [`StorageError::InvalidConfig`] if the persisted configuration cannot be parsed
    pub fn open(backend: Box<B>, root: &str) -> Result<Self, StorageError> {
        let storage_root = match backend.resolve_root(root)? {
            Some(id) => id,
            None => {
                let id = backend
                    .create_root(root)?
                    .ok_or_else(|| StorageError::NotADirectory {
                        name: root.to_string(),
                    })?;
                info!("created storage root {root} ({id})");
                id
            }
        };

        let config = if backend.check_config(&storage_root)? {
            backend.load_config(&storage_root)?
        } else {
            debug!("no configuration under {storage_root}, using defaults");
            Configuration::default()
        };

        Ok(Self {
            backend,
            current_root: storage_root.clone(),
            storage_root,
            config,
        })
    }

    /// The backend this session drives.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Id of the root the session was opened on.
    pub fn storage_root(&self) -> &str {
        &self.storage_root
    }

    /// Id of the directory operations currently act in.
    pub fn current_root(&self) -> &str {
        &self.current_root
    }

    /// The active configuration.
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Mutable access to the active configuration.
    ///
    /// Changes are in-memory until [`update_config`](Self::update_config).
    pub fn config_mut(&mut self) -> &mut Configuration {
        &mut self.config
    }

    fn enforcer(&self) -> ConfigurationEnforcer<'_, B> {
        ConfigurationEnforcer::new(&*self.backend, &self.config, &self.storage_root)
    }

    /// Move the file-count limits of directory `old` and everything below it
    /// onto `new`, or drop them when `new` is `None`.
    ///
    /// Backends whose ids are paths change a directory's id on rename or
    /// move; the limit has to follow the directory, not the old path.
    fn rekey_limits(&mut self, old: &str, new: Option<&str>) -> Result<(), StorageError> {
        if new == Some(old) {
            return Ok(());
        }
        let nested = format!("{old}/");
        let affected: Vec<String> = self
            .config
            .file_count_limits()
            .keys()
            .filter(|key| key.as_str() == old || key.starts_with(&nested))
            .cloned()
            .collect();
        if affected.is_empty() {
            return Ok(());
        }

        let mut limits = self.config.file_count_limits().clone();
        for key in affected {
            if let Some(limit) = limits.remove(&key) {
                if let Some(new) = new {
                    let moved = format!("{new}{}", &key[old.len()..]);
                    debug!("file count limit {key} -> {moved}");
                    limits.insert(moved, limit);
                } else {
                    debug!("dropped file count limit of {key}");
                }
            }
        }
        self.config.set_file_count_limits(limits);
        self.update_config()
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Whether the storage root holds a persisted configuration.
    pub fn has_persisted_config(&self) -> Result<bool, StorageError> {
        self.backend.check_config(&self.storage_root)
    }

    /// Replace the active configuration and persist it.
    pub fn create_config(&mut self, config: Configuration) -> Result<(), StorageError> {
        self.config = config;
        self.update_config()
    }

    /// Persist the active configuration as the storage root's artifact.
    pub fn update_config(&self) -> Result<(), StorageError> {
        let json = self.config.to_json()?;
        self.backend
            .write_config_artifact(&self.storage_root, &json)?;
        info!("configuration saved under {}", self.storage_root);
        Ok(())
    }

    /// Read one item of the persisted configuration.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotFound`] if no configuration was persisted yet
    pub fn read_config(&self, item: ConfigItem) -> Result<ConfigValue, StorageError> {
        self.backend.read_config(&self.storage_root, item)
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Make child directory `name` current.
    ///
    /// Returns `false`, leaving the current root unchanged, when there is no
    /// such directory.
    pub fn enter_directory(&mut self, name: &str) -> Result<bool, StorageError> {
        match self.backend.enter_directory(&self.current_root, name)? {
            Some(id) => {
                debug!("entered {id}");
                self.current_root = id;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Make the parent of the current directory current.
    ///
    /// Returns `false` at the storage root.
    pub fn return_back_from_directory(&mut self) -> Result<bool, StorageError> {
        if self.current_root == self.storage_root {
            return Ok(false);
        }
        match self.backend.parent_directory(&self.current_root)? {
            Some(parent) => {
                debug!("returned to {parent}");
                self.current_root = parent;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Resolve a `/`-separated directory path to a directory id.
    ///
    /// A leading `/` starts at the storage root, anything else at the current
    /// root. `..` never climbs above the storage root.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotFound`] if a component does not name a directory
    pub fn resolve_path(&self, path: &str) -> Result<String, StorageError> {
        let mut dir = if path.starts_with('/') {
            self.storage_root.clone()
        } else {
            self.current_root.clone()
        };
        for component in path.split('/').filter(|c| !c.is_empty() && *c != ".") {
            let next = if component == ".." {
                if dir == self.storage_root {
                    None
                } else {
                    self.backend.parent_directory(&dir)?
                }
            } else {
                self.backend.enter_directory(&dir, component)?
            };
            dir = next.ok_or_else(|| StorageError::NotFound {
                name: path.to_string(),
            })?;
        }
        Ok(dir)
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    /// Create directory `name` in the current root and return its id.
    ///
    /// # Errors
    ///
    /// - [`StorageError::FileCountLimitExceeded`] if the current root is full
    /// - [`StorageError::AlreadyExists`] if `name` is taken
    pub fn create_directory(&mut self, name: &str) -> Result<String, StorageError> {
        self.enforcer().check_file_count_limit(&self.current_root)?;
        let id = self.backend.create_directory(&self.current_root, name)?;
        info!("created directory {name} in {}", self.current_root);
        Ok(id)
    }

    /// Create directory `name` and cap it at `limit` items.
    ///
    /// The limit is keyed by the new directory's id and the configuration is
    /// persisted immediately.
    pub fn create_directory_with_limit(
        &mut self,
        name: &str,
        limit: usize,
    ) -> Result<String, StorageError> {
        let id = self.create_directory(name)?;
        self.config.set_file_count_limit(id.clone(), limit);
        self.update_config()?;
        Ok(id)
    }

    /// Create directories named `start..=end`.
    ///
    /// See [`create_directory_prefixed_range`](Self::create_directory_prefixed_range)
    /// for the batch semantics.
    pub fn create_directory_range(
        &mut self,
        start: u32,
        end: u32,
    ) -> Result<Vec<String>, StorageError> {
        self.create_directory_prefixed_range("", start, end)
    }

    /// Create directories named `prefix` followed by each number in `start..=end`.
    ///
    /// The whole batch is checked against the file-count limit before the
    /// first directory is created. The batch stops at the first failure;
    /// directories created before it are kept.
    ///
    /// # Errors
    ///
    /// - [`StorageError::FileCountLimitBatchExceeded`] if the batch cannot fit
    /// - [`StorageError::BatchIncomplete`] wrapping the first failure
    pub fn create_directory_prefixed_range(
        &mut self,
        prefix: &str,
        start: u32,
        end: u32,
    ) -> Result<Vec<String>, StorageError> {
        let total = if start > end {
            0
        } else {
            usize::try_from(u64::from(end - start) + 1).unwrap_or(usize::MAX)
        };
        self.enforcer()
            .check_multiple_file_count_limit(&self.current_root, total)?;

        let mut created = Vec::new();
        for i in start..=end {
            match self.create_directory(&format!("{prefix}{i}")) {
                Ok(id) => created.push(id),
                Err(source) => {
                    return Err(StorageError::BatchIncomplete {
                        completed: created.len(),
                        total,
                        source: Box::new(source),
                    });
                }
            }
        }
        Ok(created)
    }

    // ------------------------------------------------------------------
    // Transfer and mutation
    // ------------------------------------------------------------------

    /// Upload the local file at `local_path` into the current root.
    ///
    /// # Errors
    ///
    /// - [`StorageError::ForbiddenExtensionRejected`] for a forbidden extension
    /// - [`StorageError::FileCountLimitExceeded`] if the current root is full
    /// - [`StorageError::MaxSizeLimitExceeded`] if the storage would outgrow its budget
    /// - [`StorageError::NotFound`] if `local_path` does not exist
    pub fn add_file(&mut self, local_path: &Path) -> Result<String, StorageError> {
        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| StorageError::InvalidName {
                name: local_path.display().to_string(),
            })?;
        let size = std::fs::metadata(local_path)
            .map_err(|e| StorageError::io("add_file", local_path.display().to_string(), e))?
            .len();

        let enforcer = self.enforcer();
        let (_, extension) = crate::split_display_name(&file_name);
        if !extension.is_empty() {
            enforcer.check_forbidden_extension(extension)?;
        }
        enforcer.check_file_count_limit(&self.current_root)?;
        enforcer.check_max_size_limit(size)?;

        let id = self.backend.add_file(&self.current_root, local_path)?;
        info!("uploaded {file_name} ({size} bytes) to {}", self.current_root);
        Ok(id)
    }

    /// Delete `name` from the current root.
    ///
    /// File-count limits registered for a deleted directory tree are dropped.
    pub fn delete_file_or_folder(&mut self, name: &str) -> Result<(), StorageError> {
        let directory = self.backend.enter_directory(&self.current_root, name)?;
        self.backend
            .delete_file_or_folder(&self.current_root, name)?;
        info!("deleted {name} from {}", self.current_root);
        match directory {
            Some(old) => self.rekey_limits(&old, None),
            None => Ok(()),
        }
    }

    /// Move `name` from the current root into the directory at `dest_path`.
    ///
    /// `dest_path` is resolved by [`resolve_path`](Self::resolve_path) and the
    /// destination must have room under its file-count limit.
    pub fn move_file_or_directory(&mut self, name: &str, dest_path: &str) -> Result<(), StorageError> {
        let dest = self.resolve_path(dest_path)?;
        self.enforcer().check_file_count_limit(&dest)?;
        let directory = self.backend.enter_directory(&self.current_root, name)?;
        self.backend
            .move_file_or_directory(&self.current_root, name, &dest)?;
        info!("moved {name} from {} to {dest}", self.current_root);
        match directory {
            Some(old) => {
                let new = self.backend.enter_directory(&dest, name)?;
                self.rekey_limits(&old, new.as_deref())
            }
            None => Ok(()),
        }
    }

    /// Copy `name` out of the current root into the local directory `dest`.
    pub fn download_file_or_directory(
        &self,
        name: &str,
        dest: &Path,
    ) -> Result<PathBuf, StorageError> {
        let written = self
            .backend
            .download_file_or_directory(&self.current_root, name, dest)?;
        info!("downloaded {name} to {}", written.display());
        Ok(written)
    }

    /// Rename `name` in the current root to `new_name`.
    ///
    /// # Errors
    ///
    /// - [`StorageError::ForbiddenExtensionRejected`] if `new_name` carries a forbidden extension
    pub fn rename_file_or_directory(&mut self, name: &str, new_name: &str) -> Result<(), StorageError> {
        let (_, extension) = crate::split_display_name(new_name);
        if !extension.is_empty() {
            self.enforcer().check_forbidden_extension(extension)?;
        }
        let directory = self.backend.enter_directory(&self.current_root, name)?;
        self.backend
            .rename_file_or_directory(&self.current_root, name, new_name)?;
        info!("renamed {name} to {new_name} in {}", self.current_root);
        match directory {
            Some(old) => {
                let new = self.backend.enter_directory(&self.current_root, new_name)?;
                self.rekey_limits(&old, new.as_deref())
            }
            None => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    /// Children of the current root named exactly `name`.
    pub fn search_by_name(&self, name: &str) -> Result<Vec<String>, StorageError> {
        self.backend.search_by_name(&self.current_root, name)
    }

    /// Children of the current root with extension `extension`.
    pub fn search_by_extension(&self, extension: &str) -> Result<Vec<String>, StorageError> {
        self.backend.search_by_extension(&self.current_root, extension)
    }

    /// Children of the current root modified after `date`.
    pub fn search_by_modified_after(&self, date: DateTime<Utc>) -> Result<Vec<String>, StorageError> {
        self.backend.search_by_modified_after(&self.current_root, date)
    }

    /// Children of the current root whose name contains `substring`.
    pub fn search_by_part_of_name(&self, substring: &str) -> Result<Vec<String>, StorageError> {
        self.backend.search_by_part_of_name(&self.current_root, substring)
    }

    /// Every item below the current root.
    pub fn search_all(&self) -> Result<Vec<String>, StorageError> {
        self.backend.search_all(&self.current_root)
    }

    /// Direct children of the current root.
    pub fn search_all_from_root(&self) -> Result<Vec<String>, StorageError> {
        self.backend.search_all_from_root(&self.current_root)
    }

    /// Items inside the subdirectories of the current root.
    pub fn search_all_from_root_without_root(&self) -> Result<Vec<String>, StorageError> {
        self.backend
            .search_all_from_root_without_root(&self.current_root)
    }

    /// Hydrate search tokens into records.
    pub fn return_file_list(&self, tokens: &[String]) -> Vec<FileRecord> {
        self.backend.return_file_list(tokens)
    }

    // ------------------------------------------------------------------
    // Result processing
    // ------------------------------------------------------------------

    /// Sort search tokens; returns the records' paths.
    pub fn sort_results(&self, tokens: &[String], key: SortKey, order: SortOrder) -> Vec<String> {
        ResultProcessor::new(&*self.backend).sort_results(tokens, key, order)
    }

    /// Render search tokens as rows, skipping the configuration artifact.
    pub fn filter_results(&self, tokens: &[String], keys: &[FilterKey]) -> Vec<String> {
        ResultProcessor::new(&*self.backend).filter_results(tokens, keys, &self.storage_root)
    }

    /// Sort already hydrated records.
    pub fn sort_records(&self, records: Vec<FileRecord>, key: SortKey, order: SortOrder) -> Vec<FileRecord> {
        sort_records(records, key, order)
    }

    /// Render already hydrated records as rows, skipping the configuration artifact.
    pub fn filter_records(&self, records: &[FileRecord], keys: &[FilterKey]) -> Vec<String> {
        filter_records(records, keys, &self.backend.config_path(&self.storage_root))
    }
}

impl<B: ?Sized + StorageBackend> std::fmt::Debug for StorageSession<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageSession")
            .field("storage_root", &self.storage_root)
            .field("current_root", &self.current_root)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CloudDriveBackend, MemoryDrive};

    fn session() -> StorageSession<CloudDriveBackend<MemoryDrive>> {
        StorageSession::open(Box::new(CloudDriveBackend::new(MemoryDrive::new())), "storage")
            .unwrap()
    }

    #[test]
    fn open_creates_missing_root() {
        let s = session();
        assert_eq!(s.storage_root(), s.current_root());
        assert!(!s.has_persisted_config().unwrap());
        assert_eq!(s.config(), &Configuration::default());
    }

    #[test]
    fn navigation_stops_at_storage_root() {
        let mut s = session();
        assert!(!s.return_back_from_directory().unwrap());
        s.create_directory("docs").unwrap();
        assert!(s.enter_directory("docs").unwrap());
        assert_ne!(s.current_root(), s.storage_root());
        assert!(s.return_back_from_directory().unwrap());
        assert_eq!(s.current_root(), s.storage_root());
        assert!(!s.enter_directory("missing").unwrap());
    }

    #[test]
    fn create_with_limit_persists_limit_for_new_directory() {
        let mut s = session();
        let id = s.create_directory_with_limit("inbox", 1).unwrap();
        assert!(s.has_persisted_config().unwrap());
        match s.read_config(ConfigItem::FileCountLimits).unwrap() {
            ConfigValue::FileCountLimits(limits) => assert_eq!(limits.get(&id), Some(&1)),
            other => panic!("unexpected: {other:?}"),
        }

        assert!(s.enter_directory("inbox").unwrap());
        s.create_directory("one").unwrap();
        assert!(matches!(
            s.create_directory("two"),
            Err(StorageError::FileCountLimitExceeded { limit: 1, .. })
        ));
    }

    #[test]
    fn batch_larger_than_limit_creates_nothing() {
        let mut s = session();
        let root = s.current_root().to_string();
        s.config_mut().set_file_count_limit(root, 2);
        assert!(matches!(
            s.create_directory_range(1, 3),
            Err(StorageError::FileCountLimitBatchExceeded { requested: 3, .. })
        ));
        assert!(s.search_all_from_root().unwrap().is_empty());
    }

    #[test]
    fn huge_range_rejected_by_limit_before_any_work() {
        let mut s = session();
        let root = s.current_root().to_string();
        s.config_mut().set_file_count_limit(root, 3);
        assert!(matches!(
            s.create_directory_prefixed_range("d", 0, 4_000_000_000),
            Err(StorageError::FileCountLimitBatchExceeded {
                requested: 4_000_000_001,
                ..
            })
        ));
        assert!(s.search_all_from_root().unwrap().is_empty());
    }

    #[test]
    fn deleting_a_directory_drops_its_limit() {
        let mut s = session();
        let id = s.create_directory_with_limit("inbox", 0).unwrap();
        s.delete_file_or_folder("inbox").unwrap();
        assert!(!s.config().file_count_limits().contains_key(&id));
    }

    #[test]
    fn empty_range_is_a_no_op() {
        let mut s = session();
        assert!(s.create_directory_range(5, 1).unwrap().is_empty());
    }

    #[test]
    fn resolve_path_walks_from_current_or_storage_root() {
        let mut s = session();
        s.create_directory("a").unwrap();
        s.enter_directory("a").unwrap();
        let a = s.current_root().to_string();
        s.create_directory("b").unwrap();

        assert_eq!(s.resolve_path("/a").unwrap(), a);
        let b = s.resolve_path("b").unwrap();
        assert_eq!(s.resolve_path("/a/b/..").unwrap(), a);
        assert_eq!(s.resolve_path("..").unwrap(), s.storage_root());
        assert!(matches!(s.resolve_path("/.."), Err(StorageError::NotFound { .. })));
        assert!(matches!(s.resolve_path("nope"), Err(StorageError::NotFound { .. })));
        assert_ne!(b, a);
    }

    #[test]
    fn rename_to_forbidden_extension_rejected() {
        let mut s = session();
        s.config_mut().forbid_extension("exe");
        s.create_directory("tool").unwrap();
        assert!(matches!(
            s.rename_file_or_directory("tool", "tool.EXE"),
            Err(StorageError::ForbiddenExtensionRejected { .. })
        ));
        s.rename_file_or_directory("tool", "tools").unwrap();
        assert_eq!(s.search_by_name("tools").unwrap().len(), 1);
    }
}

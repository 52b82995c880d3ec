//! # Layer Trait
//!
//! Tower-style middleware composition for storage backends.
//!
//! ## How It Works
//!
//! ```text
//! Backend ──▶ Layer::layer() ──▶ Wrapped Backend
//! ```
//!
//! Each middleware provides:
//! 1. A wrapper struct that implements the storage traits
//! 2. A `Layer` implementation that creates the wrapper
//!
//! [`LoggingLayer`] is the middleware shipped with this crate:
//!
//! ```rust
//! use anystorage::{LayerExt, LocalDiskBackend, LoggingLayer, StorageBackend};
//!
//! fn takes_backend(_: &dyn StorageBackend) {}
//!
//! let backend = LocalDiskBackend::new().layer(LoggingLayer::new("disk"));
//! takes_backend(&backend);
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, Level};

use crate::{
    ItemMetadata, StorageBackend, StorageConfigStore, StorageError, StorageNav, StorageSearch,
    StorageWrite,
};

/// A layer that wraps a backend to add functionality.
///
/// # Design Notes
///
/// - `layer(self, backend)` consumes both the layer and backend
/// - The resulting `Backend` type should implement [`StorageBackend`] again
pub trait Layer<B> {
    /// The resulting backend type after applying this layer.
    type Backend;

    /// Wrap the given backend with this layer's functionality.
    fn layer(self, backend: B) -> Self::Backend;
}

/// Extension trait for fluent layer composition.
///
/// ```rust
/// use anystorage::{Layer, LayerExt, StorageBackend};
///
/// fn compose_backend<B: StorageBackend, L: Layer<B>>(backend: B, layer: L) -> L::Backend {
///     backend.layer(layer)
/// }
/// ```
pub trait LayerExt: StorageBackend + Sized {
    /// Apply a layer to this backend.
    fn layer<L: Layer<Self>>(self, layer: L) -> L::Backend {
        layer.layer(self)
    }
}

impl<B: StorageBackend> LayerExt for B {}

/// Logs every backend call under a name, at a configurable level.
#[derive(Debug, Clone)]
pub struct LoggingLayer {
    name: String,
    level: Level,
}

impl LoggingLayer {
    /// Log calls at `debug` level, tagged with `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: Level::Debug,
        }
    }

    /// Use `level` instead of `debug`.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }
}

impl<B: StorageBackend> Layer<B> for LoggingLayer {
    type Backend = Logged<B>;

    fn layer(self, backend: B) -> Self::Backend {
        Logged {
            inner: backend,
            name: self.name,
            level: self.level,
        }
    }
}

/// Backend wrapper produced by [`LoggingLayer`].
#[derive(Debug)]
pub struct Logged<B> {
    inner: B,
    name: String,
    level: Level,
}

impl<B> Logged<B> {
    /// The wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Unwrap the layer.
    pub fn into_inner(self) -> B {
        self.inner
    }

    fn trace<T>(&self, call: &str, result: Result<T, StorageError>) -> Result<T, StorageError> {
        match &result {
            Ok(_) => log::log!(self.level, "[{}] {call}: ok", self.name),
            Err(e) => log::log!(self.level, "[{}] {call}: {e}", self.name),
        }
        result
    }
}

impl<B: StorageNav> StorageNav for Logged<B> {
    fn check_root(&self, root: &str) -> Result<bool, StorageError> {
        self.trace(&format!("check_root({root})"), self.inner.check_root(root))
    }

    fn create_root(&self, root: &str) -> Result<Option<String>, StorageError> {
        self.trace(&format!("create_root({root})"), self.inner.create_root(root))
    }

    fn resolve_root(&self, root: &str) -> Result<Option<String>, StorageError> {
        self.trace(&format!("resolve_root({root})"), self.inner.resolve_root(root))
    }

    fn enter_directory(&self, root: &str, name: &str) -> Result<Option<String>, StorageError> {
        self.trace(
            &format!("enter_directory({root}, {name})"),
            self.inner.enter_directory(root, name),
        )
    }

    fn parent_directory(&self, root: &str) -> Result<Option<String>, StorageError> {
        self.trace(
            &format!("parent_directory({root})"),
            self.inner.parent_directory(root),
        )
    }
}

impl<B: StorageWrite> StorageWrite for Logged<B> {
    fn create_directory(&self, root: &str, name: &str) -> Result<String, StorageError> {
        self.trace(
            &format!("create_directory({root}, {name})"),
            self.inner.create_directory(root, name),
        )
    }

    fn add_file(&self, root: &str, local_path: &Path) -> Result<String, StorageError> {
        self.trace(
            &format!("add_file({root}, {})", local_path.display()),
            self.inner.add_file(root, local_path),
        )
    }

    fn delete_file_or_folder(&self, root: &str, name: &str) -> Result<(), StorageError> {
        self.trace(
            &format!("delete_file_or_folder({root}, {name})"),
            self.inner.delete_file_or_folder(root, name),
        )
    }

    fn move_file_or_directory(
        &self,
        root: &str,
        name: &str,
        dest_root: &str,
    ) -> Result<(), StorageError> {
        self.trace(
            &format!("move_file_or_directory({root}, {name}, {dest_root})"),
            self.inner.move_file_or_directory(root, name, dest_root),
        )
    }

    fn download_file_or_directory(
        &self,
        root: &str,
        name: &str,
        dest: &Path,
    ) -> Result<PathBuf, StorageError> {
        self.trace(
            &format!("download_file_or_directory({root}, {name}, {})", dest.display()),
            self.inner.download_file_or_directory(root, name, dest),
        )
    }

    fn rename_file_or_directory(
        &self,
        root: &str,
        name: &str,
        new_name: &str,
    ) -> Result<(), StorageError> {
        self.trace(
            &format!("rename_file_or_directory({root}, {name}, {new_name})"),
            self.inner.rename_file_or_directory(root, name, new_name),
        )
    }
}

impl<B: StorageSearch> StorageSearch for Logged<B> {
    fn search_by_name(&self, root: &str, name: &str) -> Result<Vec<String>, StorageError> {
        self.trace(
            &format!("search_by_name({root}, {name})"),
            self.inner.search_by_name(root, name),
        )
    }

    fn search_by_extension(
        &self,
        root: &str,
        extension: &str,
    ) -> Result<Vec<String>, StorageError> {
        self.trace(
            &format!("search_by_extension({root}, {extension})"),
            self.inner.search_by_extension(root, extension),
        )
    }

    fn search_by_modified_after(
        &self,
        root: &str,
        date: DateTime<Utc>,
    ) -> Result<Vec<String>, StorageError> {
        self.trace(
            &format!("search_by_modified_after({root}, {date})"),
            self.inner.search_by_modified_after(root, date),
        )
    }

    fn search_by_part_of_name(
        &self,
        root: &str,
        substring: &str,
    ) -> Result<Vec<String>, StorageError> {
        self.trace(
            &format!("search_by_part_of_name({root}, {substring})"),
            self.inner.search_by_part_of_name(root, substring),
        )
    }

    fn search_all_from_root(&self, root: &str) -> Result<Vec<String>, StorageError> {
        self.trace(
            &format!("search_all_from_root({root})"),
            self.inner.search_all_from_root(root),
        )
    }

    fn subdirectories(&self, root: &str) -> Result<Vec<String>, StorageError> {
        self.trace(
            &format!("subdirectories({root})"),
            self.inner.subdirectories(root),
        )
    }

    fn describe(&self, id: &str) -> Result<ItemMetadata, StorageError> {
        self.trace(&format!("describe({id})"), self.inner.describe(id))
    }

    fn parse_token(&self, token: &str) -> Option<(String, String)> {
        self.inner.parse_token(token)
    }

    fn count_children(&self, root: &str) -> Result<usize, StorageError> {
        self.trace(
            &format!("count_children({root})"),
            self.inner.count_children(root),
        )
    }

    fn total_usage(&self, root: &str) -> Result<u64, StorageError> {
        self.trace(&format!("total_usage({root})"), self.inner.total_usage(root))
    }

    fn config_path(&self, root: &str) -> String {
        self.inner.config_path(root)
    }
}

impl<B: StorageConfigStore> StorageConfigStore for Logged<B> {
    fn check_config(&self, root: &str) -> Result<bool, StorageError> {
        self.trace(&format!("check_config({root})"), self.inner.check_config(root))
    }

    fn read_config_artifact(&self, root: &str) -> Result<String, StorageError> {
        self.trace(
            &format!("read_config_artifact({root})"),
            self.inner.read_config_artifact(root),
        )
    }

    fn write_config_artifact(&self, root: &str, json: &str) -> Result<(), StorageError> {
        debug!("[{}] writing {} bytes of configuration", self.name, json.len());
        self.trace(
            &format!("write_config_artifact({root})"),
            self.inner.write_config_artifact(root, json),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CloudDriveBackend, MemoryDrive, StorageSession};

    #[test]
    fn layer_ext_is_auto_implemented() {
        fn _check<B: StorageBackend + LayerExt>() {}
    }

    #[test]
    fn logged_backend_is_a_backend() {
        let backend = CloudDriveBackend::new(MemoryDrive::new()).layer(LoggingLayer::new("drive"));
        fn _takes<T: StorageBackend>(_: &T) {}
        _takes(&backend);
    }

    #[test]
    fn logged_backend_forwards_calls() {
        let backend = CloudDriveBackend::new(MemoryDrive::new())
            .layer(LoggingLayer::new("drive").with_level(Level::Trace));
        let mut session = StorageSession::open(Box::new(backend), "root").unwrap();
        session.create_directory("docs").unwrap();
        assert_eq!(session.search_by_name("docs").unwrap().len(), 1);
        assert_eq!(
            session.backend().config_path("x"),
            session.backend().inner().config_path("x")
        );
    }

    #[test]
    fn layers_nest() {
        let backend = CloudDriveBackend::new(MemoryDrive::new())
            .layer(LoggingLayer::new("inner"))
            .layer(LoggingLayer::new("outer"));
        let _: &MemoryDrive = backend.inner().inner().client();
    }
}

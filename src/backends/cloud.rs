//! Cloud drive backend.
//!
//! A cloud drive is a flat object store: every file or folder has an opaque
//! id, a display name and at most one parent. Names are not unique on the
//! service side, so the backend enforces uniqueness within a folder itself.
//!
//! The service is reached through [`DriveClient`]. Listing queries return
//! [`DriveEntry`] values (id, name, kind); size and timestamps need a
//! per-item [`DriveClient::get`].

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::CONFIG_FILE_NAME;
use crate::traits::validate_item_name;
use crate::types::{format_token, normalize_extension, split_display_name};
use crate::{
    ItemKind, ItemMetadata, StorageConfigStore, StorageError, StorageNav, StorageSearch,
    StorageWrite,
};

/// Filter applied by [`DriveClient::list_children`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveQuery {
    /// Every child.
    All,
    /// Children named exactly this.
    NameEquals(String),
    /// Children whose name contains this.
    NameContains(String),
    /// Children modified strictly after this instant.
    ModifiedAfter(DateTime<Utc>),
}

/// One row of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveEntry {
    /// Opaque id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Whether the entry is a folder.
    pub folder: bool,
}

/// Full description of one drive object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveItem {
    /// Opaque id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Whether the object is a folder.
    pub folder: bool,
    /// Parent folder id, `None` at the top of the drive.
    pub parent: Option<String>,
    /// Content size in bytes (0 for folders).
    pub size: u64,
    /// Creation time.
    pub created_time: DateTime<Utc>,
    /// Last modification time.
    pub modified_time: DateTime<Utc>,
}

/// Client for a cloud drive service.
///
/// A `parent` of `None` addresses the top level of the drive.
pub trait DriveClient: Send + Sync {
    /// List the children of `parent` matching `query`.
    fn list_children(
        &self,
        parent: Option<&str>,
        query: &DriveQuery,
    ) -> Result<Vec<DriveEntry>, StorageError>;

    /// Fetch one object.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotFound`] if `id` does not exist
    fn get(&self, id: &str) -> Result<DriveItem, StorageError>;

    /// Create a folder and return its id.
    fn create_folder(&self, name: &str, parent: Option<&str>) -> Result<String, StorageError>;

    /// Upload a file and return its id.
    fn upload(&self, name: &str, parent: &str, content: Vec<u8>) -> Result<String, StorageError>;

    /// Download a file's content.
    fn download(&self, id: &str) -> Result<Vec<u8>, StorageError>;

    /// Replace a file's content in one request.
    fn update_content(&self, id: &str, content: Vec<u8>) -> Result<(), StorageError>;

    /// Delete an object; folders are deleted with their contents.
    fn delete(&self, id: &str) -> Result<(), StorageError>;

    /// Re-parent an object.
    fn update_parent(&self, id: &str, new_parent: &str) -> Result<(), StorageError>;

    /// Change an object's display name.
    fn rename(&self, id: &str, new_name: &str) -> Result<(), StorageError>;
}

/// Storage on a cloud drive reached through `C`.
///
/// Roots are folder ids. The storage root is a top-level folder, resolved by
/// id or by name.
#[derive(Debug)]
pub struct CloudDriveBackend<C> {
    client: C,
}

impl<C: DriveClient> CloudDriveBackend<C> {
    /// Wrap a drive client.
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// The underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Consume the backend and return the client.
    pub fn into_client(self) -> C {
        self.client
    }

    fn find_child(&self, parent: Option<&str>, name: &str) -> Result<Option<DriveEntry>, StorageError> {
        Ok(self
            .client
            .list_children(parent, &DriveQuery::NameEquals(name.to_string()))?
            .into_iter()
            .next())
    }

    fn require_child(&self, root: &str, name: &str) -> Result<DriveEntry, StorageError> {
        self.find_child(Some(root), name)?
            .ok_or_else(|| StorageError::NotFound {
                name: name.to_string(),
            })
    }

    fn ensure_absent(&self, root: &str, name: &str, operation: &'static str) -> Result<(), StorageError> {
        if self.find_child(Some(root), name)?.is_some() {
            return Err(StorageError::AlreadyExists {
                name: name.to_string(),
                operation,
            });
        }
        Ok(())
    }

    fn tokens(&self, root: &str, query: DriveQuery) -> Result<Vec<String>, StorageError> {
        Ok(self
            .client
            .list_children(Some(root), &query)?
            .into_iter()
            .map(|e| format_token(&e.name, &e.id))
            .collect())
    }

    fn config_entry(&self, root: &str) -> Result<Option<DriveEntry>, StorageError> {
        Ok(self
            .client
            .list_children(Some(root), &DriveQuery::NameEquals(CONFIG_FILE_NAME.to_string()))?
            .into_iter()
            .find(|e| !e.folder))
    }

    fn download_into(&self, entry: &DriveEntry, target: &Path) -> Result<(), StorageError> {
        if entry.folder {
            fs::create_dir(target)
                .map_err(|e| StorageError::io("download", target.display().to_string(), e))?;
            for child in self.client.list_children(Some(&entry.id), &DriveQuery::All)? {
                self.download_into(&child, &target.join(&child.name))?;
            }
        } else {
            let bytes = self.client.download(&entry.id)?;
            fs::write(target, bytes)
                .map_err(|e| StorageError::io("download", target.display().to_string(), e))?;
        }
        Ok(())
    }
}

impl<C: DriveClient> StorageNav for CloudDriveBackend<C> {
    fn check_root(&self, root: &str) -> Result<bool, StorageError> {
        match self.client.get(root) {
            Ok(item) => Ok(item.folder),
            Err(StorageError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Creates a top-level folder named `root`.
    fn create_root(&self, root: &str) -> Result<Option<String>, StorageError> {
        validate_item_name(root)?;
        if self.find_child(None, root)?.is_some() {
            return Ok(None);
        }
        let id = self.client.create_folder(root, None)?;
        debug!("created drive folder {root} ({id})");
        Ok(Some(id))
    }

    fn resolve_root(&self, root: &str) -> Result<Option<String>, StorageError> {
        if self.check_root(root)? {
            return Ok(Some(root.to_string()));
        }
        Ok(self
            .client
            .list_children(None, &DriveQuery::NameEquals(root.to_string()))?
            .into_iter()
            .find(|e| e.folder)
            .map(|e| e.id))
    }

    fn enter_directory(&self, root: &str, name: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .find_child(Some(root), name)?
            .filter(|e| e.folder)
            .map(|e| e.id))
    }

    fn parent_directory(&self, root: &str) -> Result<Option<String>, StorageError> {
        Ok(self.client.get(root)?.parent)
    }
}

impl<C: DriveClient> StorageWrite for CloudDriveBackend<C> {
    fn create_directory(&self, root: &str, name: &str) -> Result<String, StorageError> {
        validate_item_name(name)?;
        self.ensure_absent(root, name, "create_directory")?;
        self.client.create_folder(name, Some(root))
    }

    fn add_file(&self, root: &str, local_path: &Path) -> Result<String, StorageError> {
        let name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| StorageError::InvalidName {
                name: local_path.display().to_string(),
            })?;
        self.ensure_absent(root, &name, "add_file")?;
        let content = fs::read(local_path)
            .map_err(|e| StorageError::io("add_file", local_path.display().to_string(), e))?;
        self.client.upload(&name, root, content)
    }

    fn delete_file_or_folder(&self, root: &str, name: &str) -> Result<(), StorageError> {
        let entry = self.require_child(root, name)?;
        self.client.delete(&entry.id)
    }

    fn move_file_or_directory(
        &self,
        root: &str,
        name: &str,
        dest_root: &str,
    ) -> Result<(), StorageError> {
        let entry = self.require_child(root, name)?;
        if !self.client.get(dest_root)?.folder {
            return Err(StorageError::NotADirectory {
                name: dest_root.to_string(),
            });
        }
        if entry.id == dest_root {
            return Err(StorageError::InvalidName {
                name: name.to_string(),
            });
        }
        self.ensure_absent(dest_root, name, "move")?;
        self.client.update_parent(&entry.id, dest_root)
    }

    fn download_file_or_directory(
        &self,
        root: &str,
        name: &str,
        dest: &Path,
    ) -> Result<PathBuf, StorageError> {
        let entry = self.require_child(root, name)?;
        if !dest.is_dir() {
            return Err(StorageError::NotADirectory {
                name: dest.display().to_string(),
            });
        }
        let target = dest.join(&entry.name);
        if target.exists() {
            return Err(StorageError::AlreadyExists {
                name: target.display().to_string(),
                operation: "download",
            });
        }
        self.download_into(&entry, &target)?;
        Ok(target)
    }

    fn rename_file_or_directory(
        &self,
        root: &str,
        name: &str,
        new_name: &str,
    ) -> Result<(), StorageError> {
        validate_item_name(new_name)?;
        let entry = self.require_child(root, name)?;
        self.ensure_absent(root, new_name, "rename")?;
        self.client.rename(&entry.id, new_name)
    }
}

impl<C: DriveClient> StorageSearch for CloudDriveBackend<C> {
    fn search_by_name(&self, root: &str, name: &str) -> Result<Vec<String>, StorageError> {
        self.tokens(root, DriveQuery::NameEquals(name.to_string()))
    }

    fn search_by_extension(
        &self,
        root: &str,
        extension: &str,
    ) -> Result<Vec<String>, StorageError> {
        let wanted = normalize_extension(extension);
        Ok(self
            .client
            .list_children(Some(root), &DriveQuery::All)?
            .into_iter()
            .filter(|e| {
                let (_, ext) = split_display_name(&e.name);
                !ext.is_empty() && normalize_extension(ext) == wanted
            })
            .map(|e| format_token(&e.name, &e.id))
            .collect())
    }

    fn search_by_modified_after(
        &self,
        root: &str,
        date: DateTime<Utc>,
    ) -> Result<Vec<String>, StorageError> {
        self.tokens(root, DriveQuery::ModifiedAfter(date))
    }

    fn search_by_part_of_name(
        &self,
        root: &str,
        substring: &str,
    ) -> Result<Vec<String>, StorageError> {
        self.tokens(root, DriveQuery::NameContains(substring.to_string()))
    }

    fn search_all_from_root(&self, root: &str) -> Result<Vec<String>, StorageError> {
        if !self.check_root(root)? {
            return Err(StorageError::NotFound {
                name: root.to_string(),
            });
        }
        self.tokens(root, DriveQuery::All)
    }

    fn subdirectories(&self, root: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .client
            .list_children(Some(root), &DriveQuery::All)?
            .into_iter()
            .filter(|e| e.folder)
            .map(|e| e.id)
            .collect())
    }

    fn describe(&self, id: &str) -> Result<ItemMetadata, StorageError> {
        let item = self.client.get(id)?;
        Ok(ItemMetadata {
            path: format!("{}/{}", item.parent.as_deref().unwrap_or(""), item.name),
            display_name: item.name,
            kind: if item.folder {
                ItemKind::Directory
            } else {
                ItemKind::File
            },
            size: item.size,
            created: item.created_time,
            modified: item.modified_time,
        })
    }

    fn count_children(&self, root: &str) -> Result<usize, StorageError> {
        Ok(self
            .client
            .list_children(Some(root), &DriveQuery::All)?
            .len())
    }

    fn total_usage(&self, root: &str) -> Result<u64, StorageError> {
        let mut total = 0;
        for entry in self.client.list_children(Some(root), &DriveQuery::All)? {
            total += if entry.folder {
                self.total_usage(&entry.id)?
            } else {
                self.client.get(&entry.id)?.size
            };
        }
        Ok(total)
    }
}

impl<C: DriveClient> StorageConfigStore for CloudDriveBackend<C> {
    fn check_config(&self, root: &str) -> Result<bool, StorageError> {
        Ok(self.config_entry(root)?.is_some())
    }

    fn read_config_artifact(&self, root: &str) -> Result<String, StorageError> {
        let entry = self
            .config_entry(root)?
            .ok_or_else(|| StorageError::NotFound {
                name: format!("{root}/{CONFIG_FILE_NAME}"),
            })?;
        let bytes = self.client.download(&entry.id)?;
        String::from_utf8(bytes).map_err(|e| StorageError::InvalidConfig(e.to_string()))
    }

    /// Content replacement is a single request, so readers see either version.
    fn write_config_artifact(&self, root: &str, json: &str) -> Result<(), StorageError> {
        match self.config_entry(root)? {
            Some(entry) => self.client.update_content(&entry.id, json.as_bytes().to_vec()),
            None => self
                .client
                .upload(CONFIG_FILE_NAME, root, json.as_bytes().to_vec())
                .map(|_| ()),
        }
    }
}

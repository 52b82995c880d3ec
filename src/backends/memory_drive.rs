//! In-process [`DriveClient`].
//!
//! Behaves like a cloud drive service (opaque uuid ids, parent links, listing
//! queries) without a network. The whole drive serializes to a JSON snapshot,
//! which is how the console keeps a simulated drive between runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cloud::{DriveClient, DriveEntry, DriveItem, DriveQuery};
use crate::StorageError;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredObject {
    name: String,
    folder: bool,
    parent: Option<String>,
    #[serde(default)]
    content: Vec<u8>,
    created_time: DateTime<Utc>,
    modified_time: DateTime<Utc>,
}

/// A drive held in memory.
#[derive(Debug, Default)]
pub struct MemoryDrive {
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryDrive {
    /// An empty drive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot written by [`save`](Self::save).
    ///
    /// A missing file yields an empty drive.
    pub fn load(path: &Path) -> Result<Self, StorageError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let json = fs::read_to_string(path)
            .map_err(|e| StorageError::io("load_drive", path.display().to_string(), e))?;
        let objects: BTreeMap<String, StoredObject> = serde_json::from_str(&json)?;
        Ok(Self {
            objects: RwLock::new(objects),
        })
    }

    /// Write the whole drive to `path` as JSON.
    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        let json = serde_json::to_string(&*self.read())?;
        fs::write(path, json)
            .map_err(|e| StorageError::io("save_drive", path.display().to_string(), e))
    }

    /// Overwrite the timestamps of an object.
    ///
    /// Used to seed drives with historical data.
    pub fn set_times(
        &self,
        id: &str,
        created: DateTime<Utc>,
        modified: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut objects = self.write();
        let object = objects.get_mut(id).ok_or_else(|| not_found(id))?;
        object.created_time = created;
        object.modified_time = modified;
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, StoredObject>> {
        self.objects.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, StoredObject>> {
        self.objects.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(&self, name: &str, folder: bool, parent: Option<&str>, content: Vec<u8>) -> Result<String, StorageError> {
        let mut objects = self.write();
        if let Some(parent) = parent {
            require_folder(&objects, parent)?;
        }
        let id = Uuid::new_v4().simple().to_string();
        let now = Utc::now();
        objects.insert(
            id.clone(),
            StoredObject {
                name: name.to_string(),
                folder,
                parent: parent.map(str::to_string),
                content,
                created_time: now,
                modified_time: now,
            },
        );
        Ok(id)
    }
}

fn not_found(id: &str) -> StorageError {
    StorageError::NotFound {
        name: id.to_string(),
    }
}

fn require_folder(objects: &BTreeMap<String, StoredObject>, id: &str) -> Result<(), StorageError> {
    match objects.get(id) {
        Some(object) if object.folder => Ok(()),
        Some(_) => Err(StorageError::NotADirectory {
            name: id.to_string(),
        }),
        None => Err(not_found(id)),
    }
}

fn matches(object: &StoredObject, query: &DriveQuery) -> bool {
    match query {
        DriveQuery::All => true,
        DriveQuery::NameEquals(name) => &object.name == name,
        DriveQuery::NameContains(part) => object.name.contains(part.as_str()),
        DriveQuery::ModifiedAfter(date) => object.modified_time > *date,
    }
}

impl DriveClient for MemoryDrive {
    fn list_children(
        &self,
        parent: Option<&str>,
        query: &DriveQuery,
    ) -> Result<Vec<DriveEntry>, StorageError> {
        let objects = self.read();
        if let Some(parent) = parent {
            require_folder(&objects, parent)?;
        }
        let mut entries: Vec<DriveEntry> = objects
            .iter()
            .filter(|(_, o)| o.parent.as_deref() == parent && matches(o, query))
            .map(|(id, o)| DriveEntry {
                id: id.clone(),
                name: o.name.clone(),
                folder: o.folder,
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(entries)
    }

    fn get(&self, id: &str) -> Result<DriveItem, StorageError> {
        let objects = self.read();
        let o = objects.get(id).ok_or_else(|| not_found(id))?;
        Ok(DriveItem {
            id: id.to_string(),
            name: o.name.clone(),
            folder: o.folder,
            parent: o.parent.clone(),
            size: o.content.len() as u64,
            created_time: o.created_time,
            modified_time: o.modified_time,
        })
    }

    fn create_folder(&self, name: &str, parent: Option<&str>) -> Result<String, StorageError> {
        self.insert(name, true, parent, Vec::new())
    }

    fn upload(&self, name: &str, parent: &str, content: Vec<u8>) -> Result<String, StorageError> {
        self.insert(name, false, Some(parent), content)
    }

    fn download(&self, id: &str) -> Result<Vec<u8>, StorageError> {
        let objects = self.read();
        let o = objects.get(id).ok_or_else(|| not_found(id))?;
        if o.folder {
            return Err(StorageError::BackendIo {
                operation: "download",
                target: id.to_string(),
                message: "folders have no content".into(),
            });
        }
        Ok(o.content.clone())
    }

    fn update_content(&self, id: &str, content: Vec<u8>) -> Result<(), StorageError> {
        let mut objects = self.write();
        let o = objects.get_mut(id).ok_or_else(|| not_found(id))?;
        o.content = content;
        o.modified_time = Utc::now();
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), StorageError> {
        let mut objects = self.write();
        if !objects.contains_key(id) {
            return Err(not_found(id));
        }
        let mut doomed = vec![id.to_string()];
        let mut i = 0;
        while i < doomed.len() {
            let current = doomed[i].clone();
            doomed.extend(
                objects
                    .iter()
                    .filter(|(_, o)| o.parent.as_deref() == Some(current.as_str()))
                    .map(|(child, _)| child.clone()),
            );
            i += 1;
        }
        for id in doomed {
            objects.remove(&id);
        }
        Ok(())
    }

    fn update_parent(&self, id: &str, new_parent: &str) -> Result<(), StorageError> {
        let mut objects = self.write();
        if !objects.contains_key(id) {
            return Err(not_found(id));
        }
        require_folder(&objects, new_parent)?;
        let mut cursor = Some(new_parent.to_string());
        while let Some(ancestor) = cursor {
            if ancestor == id {
                return Err(StorageError::BackendIo {
                    operation: "update_parent",
                    target: id.to_string(),
                    message: "cannot move a folder into itself".into(),
                });
            }
            cursor = objects.get(&ancestor).and_then(|o| o.parent.clone());
        }
        if let Some(o) = objects.get_mut(id) {
            o.parent = Some(new_parent.to_string());
        }
        Ok(())
    }

    fn rename(&self, id: &str, new_name: &str) -> Result<(), StorageError> {
        let mut objects = self.write();
        let o = objects.get_mut(id).ok_or_else(|| not_found(id))?;
        o.name = new_name.to_string();
        o.modified_time = Utc::now();
        Ok(())
    }
}

//! Local disk backend over `std::fs`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use log::debug;

use crate::config::CONFIG_FILE_NAME;
use crate::traits::validate_item_name;
use crate::types::{format_token, normalize_extension, split_display_name, split_token};
use crate::{
    ItemKind, ItemMetadata, StorageConfigStore, StorageError, StorageNav, StorageSearch,
    StorageWrite,
};

const CONFIG_TEMP_NAME: &str = ".config.json.tmp";

/// Storage on the local filesystem.
///
/// Item ids are canonical paths rendered as strings, so they may contain
/// spaces; [`parse_token`](StorageSearch::parse_token) accounts for that.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDiskBackend;

impl LocalDiskBackend {
    /// Create a backend.
    pub fn new() -> Self {
        Self
    }
}

fn path_id(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn child(root: &str, name: &str) -> Result<PathBuf, StorageError> {
    validate_item_name(name)?;
    Ok(Path::new(root).join(name))
}

fn canonical(path: &Path) -> Result<String, StorageError> {
    fs::canonicalize(path)
        .map(|p| path_id(&p))
        .map_err(|e| StorageError::io("canonicalize", path_id(path), e))
}

fn ensure_absent(path: &Path, operation: &'static str) -> Result<(), StorageError> {
    if fs::symlink_metadata(path).is_ok() {
        return Err(StorageError::AlreadyExists {
            name: path_id(path),
            operation,
        });
    }
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<(), StorageError> {
    let meta = fs::metadata(path).map_err(|e| StorageError::io("stat", path_id(path), e))?;
    if !meta.is_dir() {
        return Err(StorageError::NotADirectory {
            name: path_id(path),
        });
    }
    Ok(())
}

fn timestamp(time: std::io::Result<SystemTime>) -> Option<DateTime<Utc>> {
    time.ok().map(DateTime::<Utc>::from)
}

/// Entries of `root` as `(display name, path)`, sorted by name.
fn children(root: &str) -> Result<Vec<(String, PathBuf)>, StorageError> {
    let entries = fs::read_dir(root).map_err(|e| StorageError::io("read_dir", root, e))?;
    let mut out = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StorageError::io("read_dir", root, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == CONFIG_TEMP_NAME {
            continue;
        }
        out.push((name, entry.path()));
    }
    out.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(out)
}

fn tokens_where(
    root: &str,
    mut keep: impl FnMut(&str, &Path) -> bool,
) -> Result<Vec<String>, StorageError> {
    Ok(children(root)?
        .into_iter()
        .filter(|(name, path)| keep(name.as_str(), path.as_path()))
        .map(|(name, path)| format_token(&name, &path_id(&path)))
        .collect())
}

fn copy_recursive(src: &Path, dest: &Path) -> Result<(), StorageError> {
    let meta = fs::metadata(src).map_err(|e| StorageError::io("download", path_id(src), e))?;
    if meta.is_dir() {
        fs::create_dir(dest).map_err(|e| StorageError::io("download", path_id(dest), e))?;
        let entries = fs::read_dir(src).map_err(|e| StorageError::io("read_dir", path_id(src), e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io("read_dir", path_id(src), e))?;
            copy_recursive(&entry.path(), &dest.join(entry.file_name()))?;
        }
    } else {
        fs::copy(src, dest).map_err(|e| StorageError::io("download", path_id(dest), e))?;
    }
    Ok(())
}

fn usage(path: &Path) -> Result<u64, StorageError> {
    let meta = fs::symlink_metadata(path).map_err(|e| StorageError::io("stat", path_id(path), e))?;
    if !meta.is_dir() {
        return Ok(meta.len());
    }
    let entries = fs::read_dir(path).map_err(|e| StorageError::io("read_dir", path_id(path), e))?;
    let mut total = 0u64;
    for entry in entries {
        let entry = entry.map_err(|e| StorageError::io("read_dir", path_id(path), e))?;
        total += usage(&entry.path())?;
    }
    Ok(total)
}

impl StorageNav for LocalDiskBackend {
    fn check_root(&self, root: &str) -> Result<bool, StorageError> {
        Ok(Path::new(root).is_dir())
    }

    fn create_root(&self, root: &str) -> Result<Option<String>, StorageError> {
        let path = Path::new(root);
        if fs::symlink_metadata(path).is_ok() {
            return Ok(None);
        }
        fs::create_dir_all(path).map_err(|e| StorageError::io("create_root", root, e))?;
        canonical(path).map(Some)
    }

    fn resolve_root(&self, root: &str) -> Result<Option<String>, StorageError> {
        if !self.check_root(root)? {
            return Ok(None);
        }
        canonical(Path::new(root)).map(Some)
    }

    fn enter_directory(&self, root: &str, name: &str) -> Result<Option<String>, StorageError> {
        let Ok(path) = child(root, name) else {
            return Ok(None);
        };
        Ok(path.is_dir().then(|| path_id(&path)))
    }

    fn parent_directory(&self, root: &str) -> Result<Option<String>, StorageError> {
        let path = Path::new(root);
        if !path.exists() {
            return Err(StorageError::NotFound {
                name: root.to_string(),
            });
        }
        Ok(path.parent().map(path_id))
    }
}

impl StorageWrite for LocalDiskBackend {
    fn create_directory(&self, root: &str, name: &str) -> Result<String, StorageError> {
        let path = child(root, name)?;
        fs::create_dir(&path).map_err(|e| StorageError::io("create_directory", path_id(&path), e))?;
        Ok(path_id(&path))
    }

    fn add_file(&self, root: &str, local_path: &Path) -> Result<String, StorageError> {
        let name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| StorageError::InvalidName {
                name: path_id(local_path),
            })?;
        let target = child(root, &name)?;
        ensure_absent(&target, "add_file")?;
        fs::copy(local_path, &target)
            .map_err(|e| StorageError::io("add_file", path_id(local_path), e))?;
        debug!("copied {} to {}", local_path.display(), target.display());
        Ok(path_id(&target))
    }

    fn delete_file_or_folder(&self, root: &str, name: &str) -> Result<(), StorageError> {
        let path = child(root, name)?;
        let meta = fs::symlink_metadata(&path)
            .map_err(|e| StorageError::io("delete", path_id(&path), e))?;
        let result = if meta.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        result.map_err(|e| StorageError::io("delete", path_id(&path), e))
    }

    fn move_file_or_directory(
        &self,
        root: &str,
        name: &str,
        dest_root: &str,
    ) -> Result<(), StorageError> {
        let src = child(root, name)?;
        fs::symlink_metadata(&src).map_err(|e| StorageError::io("move", path_id(&src), e))?;
        let dest_dir = Path::new(dest_root);
        ensure_dir(dest_dir)?;
        let target = dest_dir.join(name);
        ensure_absent(&target, "move")?;
        fs::rename(&src, &target).map_err(|e| StorageError::io("move", path_id(&src), e))
    }

    fn download_file_or_directory(
        &self,
        root: &str,
        name: &str,
        dest: &Path,
    ) -> Result<PathBuf, StorageError> {
        let src = child(root, name)?;
        fs::symlink_metadata(&src).map_err(|e| StorageError::io("download", path_id(&src), e))?;
        ensure_dir(dest)?;
        let target = dest.join(name);
        ensure_absent(&target, "download")?;
        copy_recursive(&src, &target)?;
        Ok(target)
    }

    fn rename_file_or_directory(
        &self,
        root: &str,
        name: &str,
        new_name: &str,
    ) -> Result<(), StorageError> {
        let src = child(root, name)?;
        let target = child(root, new_name)?;
        fs::symlink_metadata(&src).map_err(|e| StorageError::io("rename", path_id(&src), e))?;
        ensure_absent(&target, "rename")?;
        fs::rename(&src, &target).map_err(|e| StorageError::io("rename", path_id(&src), e))
    }
}

impl StorageSearch for LocalDiskBackend {
    fn search_by_name(&self, root: &str, name: &str) -> Result<Vec<String>, StorageError> {
        tokens_where(root, |n, _| n == name)
    }

    fn search_by_extension(
        &self,
        root: &str,
        extension: &str,
    ) -> Result<Vec<String>, StorageError> {
        let wanted = normalize_extension(extension);
        tokens_where(root, |n, _| {
            let (_, ext) = split_display_name(n);
            !ext.is_empty() && normalize_extension(ext) == wanted
        })
    }

    fn search_by_modified_after(
        &self,
        root: &str,
        date: DateTime<Utc>,
    ) -> Result<Vec<String>, StorageError> {
        tokens_where(root, |_, path| {
            fs::metadata(path)
                .ok()
                .and_then(|m| timestamp(m.modified()))
                .is_some_and(|modified| modified > date)
        })
    }

    fn search_by_part_of_name(
        &self,
        root: &str,
        substring: &str,
    ) -> Result<Vec<String>, StorageError> {
        tokens_where(root, |n, _| n.contains(substring))
    }

    fn search_all_from_root(&self, root: &str) -> Result<Vec<String>, StorageError> {
        tokens_where(root, |_, _| true)
    }

    fn subdirectories(&self, root: &str) -> Result<Vec<String>, StorageError> {
        Ok(children(root)?
            .into_iter()
            .filter(|(_, path)| path.is_dir())
            .map(|(_, path)| path_id(&path))
            .collect())
    }

    fn describe(&self, id: &str) -> Result<ItemMetadata, StorageError> {
        let path = Path::new(id);
        let meta = fs::metadata(path).map_err(|e| StorageError::io("describe", id, e))?;
        let modified = timestamp(meta.modified()).unwrap_or_else(Utc::now);
        // Not every filesystem records a birth time.
        let created = timestamp(meta.created()).unwrap_or(modified);
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| id.to_string());
        Ok(ItemMetadata {
            path: id.to_string(),
            display_name,
            kind: if meta.is_dir() {
                ItemKind::Directory
            } else {
                ItemKind::File
            },
            size: if meta.is_dir() { 0 } else { meta.len() },
            created,
            modified,
        })
    }

    /// Split where the id is a path whose last component is the name.
    ///
    /// Falls back to the last space when no split matches.
    fn parse_token(&self, token: &str) -> Option<(String, String)> {
        let matched = token.match_indices(' ').find_map(|(i, _)| {
            let (name, id) = (&token[..i], &token[i + 1..]);
            let file_name = Path::new(id).file_name()?;
            (!name.is_empty() && file_name.to_string_lossy() == name)
                .then(|| (name.to_string(), id.to_string()))
        });
        matched.or_else(|| split_token(token).map(|(n, i)| (n.to_string(), i.to_string())))
    }

    fn count_children(&self, root: &str) -> Result<usize, StorageError> {
        Ok(children(root)?.len())
    }

    fn total_usage(&self, root: &str) -> Result<u64, StorageError> {
        usage(Path::new(root))
    }

    fn config_path(&self, root: &str) -> String {
        path_id(&Path::new(root).join(CONFIG_FILE_NAME))
    }
}

impl StorageConfigStore for LocalDiskBackend {
    fn check_config(&self, root: &str) -> Result<bool, StorageError> {
        Ok(Path::new(root).join(CONFIG_FILE_NAME).is_file())
    }

    fn read_config_artifact(&self, root: &str) -> Result<String, StorageError> {
        let path = Path::new(root).join(CONFIG_FILE_NAME);
        fs::read_to_string(&path).map_err(|e| StorageError::io("read_config", path_id(&path), e))
    }

    fn write_config_artifact(&self, root: &str, json: &str) -> Result<(), StorageError> {
        let target = Path::new(root).join(CONFIG_FILE_NAME);
        let temp = Path::new(root).join(CONFIG_TEMP_NAME);
        fs::write(&temp, json).map_err(|e| StorageError::io("write_config", path_id(&temp), e))?;
        fs::rename(&temp, &target)
            .map_err(|e| StorageError::io("write_config", path_id(&target), e))
    }
}

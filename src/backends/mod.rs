//! # Backends
//!
//! Concrete implementations of the storage contract.
//!
//! | Backend | Addresses items by |
//! |---------|--------------------|
//! | [`LocalDiskBackend`] | canonical filesystem paths |
//! | [`CloudDriveBackend`] | opaque ids handed out by a [`DriveClient`] |

mod cloud;
mod local;
mod memory_drive;

pub use cloud::{CloudDriveBackend, DriveClient, DriveEntry, DriveItem, DriveQuery};
pub use local::LocalDiskBackend;
pub use memory_drive::MemoryDrive;

use std::fmt;
use std::str::FromStr;

use crate::StorageError;

/// Which backend a session is opened with.
///
/// Parsed case-insensitively from `local` or `cloud` (aliases `google` and
/// `gdrive`).
///
/// ```rust
/// use anystorage::BackendKind;
///
/// assert_eq!("Local".parse::<BackendKind>().unwrap(), BackendKind::Local);
/// assert_eq!("gdrive".parse::<BackendKind>().unwrap(), BackendKind::Cloud);
/// assert!("ftp".parse::<BackendKind>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// [`LocalDiskBackend`].
    Local,
    /// [`CloudDriveBackend`].
    Cloud,
}

impl FromStr for BackendKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(BackendKind::Local),
            "cloud" | "google" | "gdrive" => Ok(BackendKind::Cloud),
            _ => Err(StorageError::UnknownBackend { name: s.to_string() }),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Local => f.write_str("local"),
            BackendKind::Cloud => f.write_str("cloud"),
        }
    }
}

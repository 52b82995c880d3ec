//! CLI argument definitions using clap
//!
//! - anystorage local <dir>
//! - anystorage cloud <folder> [--drive-state <path>]

use std::path::PathBuf;

use clap::Parser;

use crate::BackendKind;

/// anystorage - one console over local and cloud storage
#[derive(Parser, Debug)]
#[command(name = "anystorage")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Backend to open: `local`, or `cloud` (aliases `google`, `gdrive`)
    pub backend: BackendKind,

    /// Storage root: a directory path, or a top-level drive folder name or id
    pub root: String,

    /// Snapshot file backing the simulated cloud drive
    #[arg(long, env = "ANYSTORAGE_DRIVE_STATE", default_value = "./drive-state.json")]
    pub drive_state: PathBuf,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

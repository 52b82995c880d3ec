//! Parsing of console input.

use chrono::{DateTime, NaiveDate, Utc};

use crate::{FilterKey, SortKey, SortOrder};

/// Input format for dates typed at the console.
pub const INPUT_DATE_FORMAT: &str = "%d/%m/%Y";

/// A console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `cd <dir>`
    Cd(String),
    /// `cd ..`
    Back,
    /// `create`, followed by a menu.
    Create,
    /// `delete <name>`
    Delete(String),
    /// `upload <local path>`
    Upload(String),
    /// `download <name> <local dir>`
    Download {
        /// Item in the current directory.
        name: String,
        /// Local destination directory.
        dest: String,
    },
    /// `move <name> <dest path>`
    Move {
        /// Item in the current directory.
        name: String,
        /// Destination directory path.
        dest: String,
    },
    /// `rename <old> <new>`
    Rename {
        /// Current name.
        old: String,
        /// New name.
        new: String,
    },
    /// `search`, followed by a menu.
    Search,
    /// `help`
    Help,
    /// `exit`
    Exit,
    /// A known command with the wrong arguments; carries its usage line.
    Usage(&'static str),
    /// Anything else.
    Unknown(String),
}

/// Parse one line of console input.
pub fn parse_command(raw: &str) -> Command {
    let trimmed = raw.trim();
    let mut parts = trimmed.split_whitespace();
    let cmd = parts.next().unwrap_or("").to_ascii_lowercase();
    let args: Vec<&str> = parts.collect();

    match (cmd.as_str(), args.as_slice()) {
        ("cd", [".."]) => Command::Back,
        ("cd", [dir]) => Command::Cd(dir.to_string()),
        ("cd", _) => Command::Usage("cd <dir> | cd .."),
        ("create", []) => Command::Create,
        ("delete", [name]) => Command::Delete(name.to_string()),
        ("delete", _) => Command::Usage("delete <name>"),
        ("upload", [path]) => Command::Upload(path.to_string()),
        ("upload", _) => Command::Usage("upload <local path>"),
        ("download", [name, dest]) => Command::Download {
            name: name.to_string(),
            dest: dest.to_string(),
        },
        ("download", _) => Command::Usage("download <name> <local dir>"),
        ("move", [name, dest]) => Command::Move {
            name: name.to_string(),
            dest: dest.to_string(),
        },
        ("move", _) => Command::Usage("move <name> <dest path>"),
        ("rename", [old, new]) => Command::Rename {
            old: old.to_string(),
            new: new.to_string(),
        },
        ("rename", _) => Command::Usage("rename <old> <new>"),
        ("search", []) => Command::Search,
        ("help", _) => Command::Help,
        ("exit" | "quit", _) => Command::Exit,
        _ => Command::Unknown(trimmed.to_string()),
    }
}

/// Parse a sort key (`name`, `extension`, `created`, `modified`).
pub fn parse_sort_key(input: &str) -> Option<SortKey> {
    match input.trim().to_ascii_lowercase().as_str() {
        "name" => Some(SortKey::Name),
        "extension" | "ext" => Some(SortKey::Extension),
        "created" | "creation" | "creationdate" => Some(SortKey::CreationDate),
        "modified" | "modify" | "modifydate" => Some(SortKey::ModifyDate),
        _ => None,
    }
}

/// Parse a sort order; empty input means ascending.
pub fn parse_sort_order(input: &str) -> Option<SortOrder> {
    match input.trim().to_ascii_lowercase().as_str() {
        "" | "asc" | "ascending" => Some(SortOrder::Ascending),
        "desc" | "descending" => Some(SortOrder::Descending),
        _ => None,
    }
}

/// Parse filter fields separated by spaces or commas.
///
/// Unknown words are ignored and repeats collapse onto their first position.
pub fn parse_filter_keys(input: &str) -> Vec<FilterKey> {
    let mut keys = Vec::new();
    for word in input.split([' ', ',']).filter(|w| !w.is_empty()) {
        let key = match word.to_ascii_lowercase().as_str() {
            "name" => FilterKey::Name,
            "extension" | "ext" => FilterKey::Extension,
            "created" | "creation" | "creationdate" => FilterKey::CreationDate,
            "modified" | "modify" | "modifydate" => FilterKey::ModifyDate,
            _ => continue,
        };
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// Split a list of extensions separated by commas or whitespace.
pub fn parse_extension_list(input: &str) -> Vec<&str> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Parse a `dd/mm/yyyy` date as midnight UTC.
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(input.trim(), INPUT_DATE_FORMAT)
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
}

//! # Console
//!
//! Interactive front end over a [`StorageSession`].
//!
//! The console reads commands line by line from any [`BufRead`] and writes to
//! any [`Write`], so it runs against stdin/stdout in the binary and against
//! in-memory buffers in tests. Storage errors are printed and the loop
//! continues; only I/O errors on the console streams end it.

mod args;
mod command;

pub use args::Cli;
pub use command::{
    parse_command, parse_date, parse_extension_list, parse_filter_keys, parse_sort_key,
    parse_sort_order, Command, INPUT_DATE_FORMAT,
};

use std::io::{self, BufRead, Write};
use std::path::Path;

use log::warn;

use crate::{Configuration, StorageBackend, StorageError, StorageSession};

const HELP: &str = "\
commands:
  cd <dir>                    enter a directory
  cd ..                       go back to the parent directory
  create                      create directories (menu)
  delete <name>               delete a file or directory
  upload <local path>         upload a local file
  download <name> <dir>       download into a local directory
  move <name> <dest path>     move into another directory (/ starts at the storage root)
  rename <old> <new>          rename a file or directory
  search                      search, then sort and filter (menu)
  help                        show this help
  exit                        leave";

const CREATE_MENU: &str = "\
  1) single directory
  2) directory with a file limit
  3) numbered range
  4) prefixed numbered range";

const SEARCH_MENU: &str = "\
  1) by name
  2) by extension
  3) modified after date (dd/mm/yyyy)
  4) all in current directory
  5) all in subdirectories
  6) everything
  7) by part of name";

/// Line-oriented console over a session.
pub struct Console<'s, B: ?Sized + StorageBackend, R, W> {
    session: &'s mut StorageSession<B>,
    input: R,
    output: W,
}

impl<'s, B: ?Sized + StorageBackend, R: BufRead, W: Write> Console<'s, B, R, W> {
    /// Bind a console to a session and its streams.
    pub fn new(session: &'s mut StorageSession<B>, input: R, output: W) -> Self {
        Self {
            session,
            input,
            output,
        }
    }

    /// Run until `exit` or end of input.
    ///
    /// When the storage has no persisted configuration the user is asked for
    /// one first.
    pub fn run(&mut self) -> io::Result<()> {
        match self.session.has_persisted_config() {
            Ok(false) => self.configure()?,
            Ok(true) => {}
            Err(e) => self.report(&e)?,
        }
        writeln!(self.output, "type `help` for commands")?;

        while let Some(line) = self.prompt("> ")? {
            match parse_command(&line) {
                Command::Exit => break,
                Command::Help => writeln!(self.output, "{HELP}")?,
                Command::Usage(usage) => writeln!(self.output, "usage: {usage}")?,
                Command::Unknown(raw) if raw.is_empty() => {}
                Command::Unknown(raw) => {
                    writeln!(self.output, "unknown command: {raw} (type `help`)")?
                }
                Command::Create => self.create_menu()?,
                Command::Search => self.search_menu()?,
                command => self.execute(command)?,
            }
        }
        Ok(())
    }

    fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        write!(self.output, "{text}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn report(&mut self, error: &StorageError) -> io::Result<()> {
        warn!("{error}");
        writeln!(self.output, "error: {error}")
    }

    fn outcome<T>(&mut self, result: Result<T, StorageError>, done: &str) -> io::Result<()> {
        match result {
            Ok(_) => writeln!(self.output, "{done}"),
            Err(e) => self.report(&e),
        }
    }

    fn configure(&mut self) -> io::Result<()> {
        writeln!(self.output, "storage has no configuration yet")?;
        let mut config = Configuration::default();
        loop {
            let Some(limit) = self.prompt("max size in bytes (empty for default): ")? else {
                return Ok(());
            };
            if limit.is_empty() {
                break;
            }
            match limit.parse::<f64>().map_err(|e| e.to_string()).and_then(|l| {
                config.set_max_size_limit(l).map_err(|e| e.to_string())
            }) {
                Ok(()) => break,
                Err(e) => writeln!(self.output, "invalid size: {e}")?,
            }
        }
        let Some(extensions) = self.prompt("forbidden extensions (comma or space separated): ")? else {
            return Ok(());
        };
        config.set_forbidden_extensions(parse_extension_list(&extensions));
        let result = self.session.create_config(config);
        self.outcome(result, "configuration saved")
    }

    fn execute(&mut self, command: Command) -> io::Result<()> {
        match command {
            Command::Cd(dir) => match self.session.enter_directory(&dir) {
                Ok(true) => Ok(()),
                Ok(false) => writeln!(self.output, "no such directory: {dir}"),
                Err(e) => self.report(&e),
            },
            Command::Back => match self.session.return_back_from_directory() {
                Ok(true) => Ok(()),
                Ok(false) => writeln!(self.output, "already at the storage root"),
                Err(e) => self.report(&e),
            },
            Command::Delete(name) => {
                let result = self.session.delete_file_or_folder(&name);
                self.outcome(result, "deleted")
            }
            Command::Upload(path) => {
                let result = self.session.add_file(Path::new(&path));
                self.outcome(result, "uploaded")
            }
            Command::Download { name, dest } => {
                let result = self.session.download_file_or_directory(&name, Path::new(&dest));
                self.outcome(result, "downloaded")
            }
            Command::Move { name, dest } => {
                let result = self.session.move_file_or_directory(&name, &dest);
                self.outcome(result, "moved")
            }
            Command::Rename { old, new } => {
                let result = self.session.rename_file_or_directory(&old, &new);
                self.outcome(result, "renamed")
            }
            other => writeln!(self.output, "unexpected command: {other:?}"),
        }
    }

    fn ask_number<T: std::str::FromStr>(&mut self, text: &str) -> io::Result<Option<T>> {
        loop {
            let Some(answer) = self.prompt(text)? else {
                return Ok(None);
            };
            match answer.parse() {
                Ok(n) => return Ok(Some(n)),
                Err(_) => writeln!(self.output, "not a number: {answer}")?,
            }
        }
    }

    fn create_menu(&mut self) -> io::Result<()> {
        writeln!(self.output, "{CREATE_MENU}")?;
        let Some(choice) = self.prompt("choice: ")? else {
            return Ok(());
        };
        match choice.as_str() {
            "1" => {
                let Some(name) = self.prompt("name: ")? else {
                    return Ok(());
                };
                let result = self.session.create_directory(&name);
                self.outcome(result, "created")
            }
            "2" => {
                let Some(name) = self.prompt("name: ")? else {
                    return Ok(());
                };
                let Some(limit) = self.ask_number::<usize>("file limit: ")? else {
                    return Ok(());
                };
                let result = self.session.create_directory_with_limit(&name, limit);
                self.outcome(result, "created")
            }
            "3" | "4" => {
                let prefix = if choice == "4" {
                    match self.prompt("prefix: ")? {
                        Some(prefix) => prefix,
                        None => return Ok(()),
                    }
                } else {
                    String::new()
                };
                let Some(start) = self.ask_number::<u32>("from: ")? else {
                    return Ok(());
                };
                let Some(end) = self.ask_number::<u32>("to: ")? else {
                    return Ok(());
                };
                let result = self.session.create_directory_prefixed_range(&prefix, start, end);
                match result {
                    Ok(created) => writeln!(self.output, "created {} directories", created.len()),
                    Err(e) => self.report(&e),
                }
            }
            other => writeln!(self.output, "no such option: {other}"),
        }
    }

    fn search_menu(&mut self) -> io::Result<()> {
        writeln!(self.output, "{SEARCH_MENU}")?;
        let Some(choice) = self.prompt("choice: ")? else {
            return Ok(());
        };
        let result = match choice.as_str() {
            "1" | "2" | "7" => {
                let Some(term) = self.prompt("search for: ")? else {
                    return Ok(());
                };
                match choice.as_str() {
                    "1" => self.session.search_by_name(&term),
                    "2" => self.session.search_by_extension(&term),
                    _ => self.session.search_by_part_of_name(&term),
                }
            }
            "3" => {
                let Some(input) = self.prompt("date (dd/mm/yyyy): ")? else {
                    return Ok(());
                };
                match parse_date(&input) {
                    Some(date) => self.session.search_by_modified_after(date),
                    None => return writeln!(self.output, "invalid date: {input}"),
                }
            }
            "4" => self.session.search_all_from_root(),
            "5" => self.session.search_all_from_root_without_root(),
            "6" => self.session.search_all(),
            other => return writeln!(self.output, "no such option: {other}"),
        };
        let tokens = match result {
            Ok(tokens) => tokens,
            Err(e) => return self.report(&e),
        };
        self.present(&tokens)
    }

    /// Hydrate once, optionally sort, then print paths or filtered rows.
    fn present(&mut self, tokens: &[String]) -> io::Result<()> {
        let mut records = self.session.return_file_list(tokens);

        let Some(sort) = self.prompt("sort by (name, extension, created, modified; empty to skip): ")?
        else {
            return Ok(());
        };
        if !sort.is_empty() {
            match parse_sort_key(&sort) {
                Some(key) => {
                    let Some(order) = self.prompt("order (asc/desc): ")? else {
                        return Ok(());
                    };
                    let order = parse_sort_order(&order).unwrap_or_default();
                    records = self.session.sort_records(records, key, order);
                }
                None => writeln!(self.output, "unknown sort key: {sort}")?,
            }
        }

        let Some(fields) =
            self.prompt("filter fields (name extension created modified; empty for paths): ")?
        else {
            return Ok(());
        };
        let keys = parse_filter_keys(&fields);
        let rows = if keys.is_empty() {
            records.iter().map(|r| r.path().to_string()).collect()
        } else {
            self.session.filter_records(&records, &keys)
        };
        if rows.is_empty() {
            return writeln!(self.output, "no results");
        }
        for row in rows {
            writeln!(self.output, "{row}")?;
        }
        Ok(())
    }
}

//! # Result Processor
//!
//! Sorting and filtering of search results.
//!
//! The token forms ([`ResultProcessor::sort_results`],
//! [`ResultProcessor::filter_results`]) hydrate through the backend first. The
//! record forms ([`sort_records`], [`filter_records`]) are the pure core and
//! let a caller hydrate once and then sort and filter the same records.

use std::cmp::Ordering;

use crate::types::DATE_FORMAT;
use crate::{FileRecord, FilterKey, SortKey, SortOrder, StorageSearch};

/// Sorts and filters tokens returned by a backend search.
///
/// Holds no state besides the backend reference; calling it twice with the
/// same input yields the same output.
pub struct ResultProcessor<'a, B: ?Sized> {
    backend: &'a B,
}

impl<'a, B: StorageSearch + ?Sized> ResultProcessor<'a, B> {
    /// Create a processor hydrating through `backend`.
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Sort `tokens` by `key` and return the records' paths in order.
    ///
    /// Tokens that fail to hydrate are dropped.
    pub fn sort_results(&self, tokens: &[String], key: SortKey, order: SortOrder) -> Vec<String> {
        sort_records(self.backend.return_file_list(tokens), key, order)
            .into_iter()
            .map(|record| record.path().to_string())
            .collect()
    }

    /// Render one row per token with the requested fields.
    ///
    /// The config artifact of `root` never produces a row.
    pub fn filter_results(&self, tokens: &[String], keys: &[FilterKey], root: &str) -> Vec<String> {
        let records = self.backend.return_file_list(tokens);
        filter_records(&records, keys, &self.backend.config_path(root))
    }
}

/// Stable sort of `records` by `key`.
///
/// Names and extensions compare lexicographically, dates chronologically.
/// [`SortOrder::Descending`] reverses the comparator, so equal keys keep their
/// input order in both directions.
pub fn sort_records(mut records: Vec<FileRecord>, key: SortKey, order: SortOrder) -> Vec<FileRecord> {
    records.sort_by(|a, b| {
        let ordering = compare_by(a, b, key);
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
    records
}

fn compare_by(a: &FileRecord, b: &FileRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a.name().cmp(b.name()),
        SortKey::Extension => a.extension().cmp(b.extension()),
        SortKey::CreationDate => a.created_at().cmp(&b.created_at()),
        SortKey::ModifyDate => a.modified_at().cmp(&b.modified_at()),
    }
}

/// Render `records` as rows of the requested fields, space-joined in `keys` order.
///
/// The record whose path equals `excluded_path` is skipped.
pub fn filter_records(records: &[FileRecord], keys: &[FilterKey], excluded_path: &str) -> Vec<String> {
    records
        .iter()
        .filter(|record| record.path() != excluded_path)
        .map(|record| render_row(record, keys))
        .collect()
}

fn render_row(record: &FileRecord, keys: &[FilterKey]) -> String {
    keys.iter()
        .map(|key| match key {
            FilterKey::Name => record.name().to_string(),
            FilterKey::Extension => record.extension().to_string(),
            FilterKey::CreationDate => record.created_at().format(DATE_FORMAT).to_string(),
            FilterKey::ModifyDate => record.modified_at().format(DATE_FORMAT).to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(path: &str, display: &str, created: (i32, u32, u32), modified: (i32, u32, u32)) -> FileRecord {
        FileRecord::new(
            path,
            display,
            Utc.with_ymd_and_hms(created.0, created.1, created.2, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(modified.0, modified.1, modified.2, 0, 0, 0).unwrap(),
        )
    }

    fn sample() -> Vec<FileRecord> {
        vec![
            record("r/c.md", "c.md", (2023, 3, 1), (2024, 1, 1)),
            record("r/a.txt", "a.txt", (2023, 1, 1), (2023, 2, 1)),
            record("r/b.rs", "b.rs", (2023, 6, 1), (2023, 7, 1)),
        ]
    }

    fn paths(records: &[FileRecord]) -> Vec<&str> {
        records.iter().map(|r| r.path()).collect()
    }

    #[test]
    fn sort_by_name_ascending() {
        let sorted = sort_records(sample(), SortKey::Name, SortOrder::Ascending);
        assert_eq!(paths(&sorted), vec!["r/a.txt", "r/b.rs", "r/c.md"]);
    }

    #[test]
    fn descending_is_reverse_of_ascending_without_ties() {
        let mut asc = sort_records(sample(), SortKey::Name, SortOrder::Ascending);
        asc.reverse();
        let desc = sort_records(sample(), SortKey::Name, SortOrder::Descending);
        assert_eq!(asc, desc);
    }

    #[test]
    fn sort_by_extension_and_dates() {
        let by_ext = sort_records(sample(), SortKey::Extension, SortOrder::Ascending);
        assert_eq!(paths(&by_ext), vec!["r/c.md", "r/b.rs", "r/a.txt"]);

        let by_created = sort_records(sample(), SortKey::CreationDate, SortOrder::Ascending);
        assert_eq!(paths(&by_created), vec!["r/a.txt", "r/c.md", "r/b.rs"]);

        let by_modified = sort_records(sample(), SortKey::ModifyDate, SortOrder::Descending);
        assert_eq!(paths(&by_modified), vec!["r/c.md", "r/b.rs", "r/a.txt"]);
    }

    #[test]
    fn ties_keep_input_order_in_both_directions() {
        let records = vec![
            record("r/x1.txt", "same.txt", (2023, 1, 1), (2023, 1, 1)),
            record("r/x2.txt", "same.txt", (2023, 1, 1), (2023, 1, 1)),
        ];
        let asc = sort_records(records.clone(), SortKey::Name, SortOrder::Ascending);
        let desc = sort_records(records, SortKey::Name, SortOrder::Descending);
        assert_eq!(paths(&asc), vec!["r/x1.txt", "r/x2.txt"]);
        assert_eq!(paths(&desc), vec!["r/x1.txt", "r/x2.txt"]);
    }

    #[test]
    fn filter_renders_fields_in_requested_order() {
        let rows = filter_records(
            &sample(),
            &[FilterKey::Extension, FilterKey::Name, FilterKey::CreationDate],
            "r/config.json",
        );
        assert_eq!(
            rows,
            vec!["md c 2023.03.01", "txt a 2023.01.01", "rs b 2023.06.01"]
        );
    }

    #[test]
    fn filter_skips_config_artifact() {
        let mut records = sample();
        records.push(record("r/config.json", "config.json", (2023, 1, 1), (2023, 1, 1)));
        let rows = filter_records(&records, &[FilterKey::Name], "r/config.json");
        assert_eq!(rows, vec!["c", "a", "b"]);
    }

    #[test]
    fn filter_is_idempotent() {
        let records = sample();
        let keys = [FilterKey::Name, FilterKey::ModifyDate];
        let first = filter_records(&records, &keys, "r/config.json");
        let second = filter_records(&records, &keys, "r/config.json");
        assert_eq!(first, second);
    }

    #[test]
    fn empty_extension_does_not_leave_padding() {
        let records = vec![record("r/Makefile", "Makefile", (2023, 1, 1), (2023, 1, 1))];
        let rows = filter_records(&records, &[FilterKey::Extension, FilterKey::Name], "");
        assert_eq!(rows, vec!["Makefile"]);
    }
}

//! Integration tests driving whole sessions against both backends.
//!
//! These tests verify that:
//! 1. Policy checks run before the backend is touched
//! 2. Batches stop at the first failure and keep earlier work
//! 3. Sorting and filtering behave identically on every backend
//! 4. Configuration survives a reopen

use anystorage::*;
use chrono::{DateTime, TimeZone, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

// =============================================================================
// Helpers
// =============================================================================

fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn local_session(dir: &TempDir) -> StorageSession<LocalDiskBackend> {
    let root = dir.path().join("storage");
    StorageSession::open(Box::new(LocalDiskBackend::new()), root.to_str().unwrap()).unwrap()
}

fn cloud_session() -> StorageSession<CloudDriveBackend<MemoryDrive>> {
    StorageSession::open(Box::new(CloudDriveBackend::new(MemoryDrive::new())), "storage").unwrap()
}

fn local_file(dir: &Path, name: &str, bytes: usize) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, vec![b'x'; bytes]).unwrap();
    path
}

fn names<B: StorageBackend + ?Sized>(session: &StorageSession<B>) -> Vec<String> {
    let tokens = session.search_all_from_root().unwrap();
    let mut names: Vec<String> = session
        .return_file_list(&tokens)
        .into_iter()
        .map(|r| r.name().to_string())
        .collect();
    names.sort();
    names
}

/// Drive client that counts uploads and forwards everything to a [`MemoryDrive`].
#[derive(Default)]
struct CountingDrive {
    inner: MemoryDrive,
    uploads: AtomicUsize,
}

impl DriveClient for CountingDrive {
    fn list_children(
        &self,
        parent: Option<&str>,
        query: &DriveQuery,
    ) -> Result<Vec<DriveEntry>, StorageError> {
        self.inner.list_children(parent, query)
    }
    fn get(&self, id: &str) -> Result<DriveItem, StorageError> {
        self.inner.get(id)
    }
    fn create_folder(&self, name: &str, parent: Option<&str>) -> Result<String, StorageError> {
        self.inner.create_folder(name, parent)
    }
    fn upload(&self, name: &str, parent: &str, content: Vec<u8>) -> Result<String, StorageError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.inner.upload(name, parent, content)
    }
    fn download(&self, id: &str) -> Result<Vec<u8>, StorageError> {
        self.inner.download(id)
    }
    fn update_content(&self, id: &str, content: Vec<u8>) -> Result<(), StorageError> {
        self.inner.update_content(id, content)
    }
    fn delete(&self, id: &str) -> Result<(), StorageError> {
        self.inner.delete(id)
    }
    fn update_parent(&self, id: &str, new_parent: &str) -> Result<(), StorageError> {
        self.inner.update_parent(id, new_parent)
    }
    fn rename(&self, id: &str, new_name: &str) -> Result<(), StorageError> {
        self.inner.rename(id, new_name)
    }
}

// =============================================================================
// Policy enforcement
// =============================================================================

#[test]
fn forbidden_extension_blocks_upload_in_any_case() {
    let dir = TempDir::new().unwrap();
    let mut session = local_session(&dir);
    session
        .create_config(Configuration::new(DEFAULT_MAX_SIZE_LIMIT, ["exe"]).unwrap())
        .unwrap();

    let upper = local_file(dir.path(), "FILE.EXE", 4);
    let err = session.add_file(&upper).unwrap_err();
    assert!(matches!(
        err,
        StorageError::ForbiddenExtensionRejected { ref extension, .. } if extension == "exe"
    ));
    assert!(session.search_by_name("FILE.EXE").unwrap().is_empty());

    let ok = local_file(dir.path(), "notes.txt", 4);
    session.add_file(&ok).unwrap();
    assert_eq!(session.search_by_name("notes.txt").unwrap().len(), 1);
}

#[test]
fn size_overflow_never_reaches_the_drive() {
    let local = TempDir::new().unwrap();
    let backend = CloudDriveBackend::new(CountingDrive::default());
    let mut session = StorageSession::open(Box::new(backend), "storage").unwrap();
    session
        .create_config(Configuration::new(1_000.0, Vec::<String>::new()).unwrap())
        .unwrap();
    let baseline = session.backend().client().uploads.load(Ordering::SeqCst);

    let big = local_file(local.path(), "big.bin", 2_000);
    assert!(matches!(
        session.add_file(&big),
        Err(StorageError::MaxSizeLimitExceeded { requested: 2_000, .. })
    ));
    assert_eq!(session.backend().client().uploads.load(Ordering::SeqCst), baseline);

    let small = local_file(local.path(), "small.bin", 10);
    session.add_file(&small).unwrap();
    assert_eq!(session.backend().client().uploads.load(Ordering::SeqCst), baseline + 1);
}

#[test]
fn limited_directory_refuses_extra_items() {
    let dir = TempDir::new().unwrap();
    let mut session = local_session(&dir);
    session.create_directory_with_limit("inbox", 2).unwrap();
    assert!(session.enter_directory("inbox").unwrap());

    session.add_file(&local_file(dir.path(), "a.txt", 1)).unwrap();
    session.create_directory("sub").unwrap();
    assert!(matches!(
        session.add_file(&local_file(dir.path(), "c.txt", 1)),
        Err(StorageError::FileCountLimitExceeded { limit: 2, current: 2, .. })
    ));
}

#[test]
fn move_respects_destination_limit() {
    let mut session = cloud_session();
    session.create_directory_with_limit("full", 0).unwrap();
    session.create_directory("loose").unwrap();
    assert!(matches!(
        session.move_file_or_directory("loose", "/full"),
        Err(StorageError::FileCountLimitExceeded { .. })
    ));
    assert_eq!(session.search_by_name("loose").unwrap().len(), 1);
}

fn limit_follows_renamed_and_moved_directory<B: StorageBackend + ?Sized>(
    session: &mut StorageSession<B>,
) {
    session.create_directory_with_limit("inbox", 1).unwrap();
    session.rename_file_or_directory("inbox", "box").unwrap();
    assert!(session.enter_directory("box").unwrap());
    session.create_directory("one").unwrap();
    assert!(matches!(
        session.create_directory("two"),
        Err(StorageError::FileCountLimitExceeded { limit: 1, .. })
    ));
    assert!(session.return_back_from_directory().unwrap());

    session.create_directory("archive").unwrap();
    session.move_file_or_directory("box", "/archive").unwrap();
    assert!(session.enter_directory("archive").unwrap());
    assert!(session.enter_directory("box").unwrap());
    assert!(matches!(
        session.create_directory("two"),
        Err(StorageError::FileCountLimitExceeded { limit: 1, .. })
    ));
    assert!(session.return_back_from_directory().unwrap());
    assert!(session.return_back_from_directory().unwrap());

    // a fresh directory at a freed path starts without a limit
    session.create_directory("inbox").unwrap();
    assert!(session.enter_directory("inbox").unwrap());
    session.create_directory("x").unwrap();
    session.create_directory("y").unwrap();
    assert!(session.return_back_from_directory().unwrap());

    session.create_directory_with_limit("gone", 0).unwrap();
    session.delete_file_or_folder("gone").unwrap();
    session.create_directory("gone").unwrap();
    assert!(session.enter_directory("gone").unwrap());
    session.create_directory("x").unwrap();

    match session.read_config(ConfigItem::FileCountLimits).unwrap() {
        ConfigValue::FileCountLimits(limits) => assert_eq!(limits.len(), 1),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn limit_follows_directory_local() {
    let dir = TempDir::new().unwrap();
    limit_follows_renamed_and_moved_directory(&mut local_session(&dir));
}

#[test]
fn limit_follows_directory_cloud() {
    limit_follows_renamed_and_moved_directory(&mut cloud_session());
}

#[test]
fn config_json_in_subdirectory_counts_against_limit() {
    let dir = TempDir::new().unwrap();
    let mut session = local_session(&dir);
    session.create_directory_with_limit("inbox", 1).unwrap();
    assert!(session.enter_directory("inbox").unwrap());
    session.add_file(&local_file(dir.path(), CONFIG_FILE_NAME, 2)).unwrap();
    assert!(matches!(
        session.create_directory("extra"),
        Err(StorageError::FileCountLimitExceeded { limit: 1, current: 1, .. })
    ));
}

#[test]
fn storage_root_limit_ignores_config_artifact() {
    let mut session = cloud_session();
    let root = session.storage_root().to_string();
    session.config_mut().set_file_count_limit(root, 1);
    session.update_config().unwrap();
    session.create_directory("only").unwrap();
    assert!(matches!(
        session.create_directory("second"),
        Err(StorageError::FileCountLimitExceeded { current: 1, .. })
    ));
}

// =============================================================================
// Batches
// =============================================================================

fn prefixed_batch_stops_at_collision<B: StorageBackend + ?Sized>(session: &mut StorageSession<B>) {
    session.create_directory("52").unwrap();

    let err = session.create_directory_prefixed_range("5", 1, 3).unwrap_err();
    match err {
        StorageError::BatchIncomplete {
            completed,
            total,
            source,
        } => {
            assert_eq!((completed, total), (1, 3));
            assert!(matches!(*source, StorageError::AlreadyExists { .. }));
        }
        other => panic!("unexpected: {other:?}"),
    }

    assert!(session.enter_directory("51").unwrap());
    assert!(session.return_back_from_directory().unwrap());
    assert!(!session.enter_directory("53").unwrap());
}

#[test]
fn prefixed_batch_keeps_earlier_directories_local() {
    let dir = TempDir::new().unwrap();
    prefixed_batch_stops_at_collision(&mut local_session(&dir));
}

#[test]
fn prefixed_batch_keeps_earlier_directories_cloud() {
    prefixed_batch_stops_at_collision(&mut cloud_session());
}

#[test]
fn numbered_range_creates_all() {
    let mut session = cloud_session();
    let ids = session.create_directory_range(1, 4).unwrap();
    assert_eq!(ids.len(), 4);
    assert_eq!(names(&session), vec!["1", "2", "3", "4"]);
}

// =============================================================================
// Sorting and filtering
// =============================================================================

#[test]
fn creation_date_sort_orders_chronologically() {
    let local = TempDir::new().unwrap();
    let mut session = cloud_session();
    let b = session.add_file(&local_file(local.path(), "b.txt", 1)).unwrap();
    let a = session.add_file(&local_file(local.path(), "a.txt", 1)).unwrap();
    let drive = session.backend().client();
    drive.set_times(&a, date(2023, 1, 1), date(2023, 1, 1)).unwrap();
    drive.set_times(&b, date(2023, 6, 1), date(2023, 6, 1)).unwrap();

    let tokens = session.search_all_from_root().unwrap();
    let root = session.storage_root().to_string();
    assert_eq!(
        session.sort_results(&tokens, SortKey::CreationDate, SortOrder::Ascending),
        vec![format!("{root}/a.txt"), format!("{root}/b.txt")]
    );
    assert_eq!(
        session.sort_results(&tokens, SortKey::CreationDate, SortOrder::Descending),
        vec![format!("{root}/b.txt"), format!("{root}/a.txt")]
    );
}

#[test]
fn descending_name_sort_is_reverse_of_ascending() {
    let dir = TempDir::new().unwrap();
    let mut session = local_session(&dir);
    for name in ["delta.md", "alpha.txt", "charlie.rs", "bravo.txt"] {
        session.add_file(&local_file(dir.path(), name, 1)).unwrap();
    }
    let tokens = session.search_all_from_root().unwrap();

    let mut ascending = session.sort_results(&tokens, SortKey::Name, SortOrder::Ascending);
    let descending = session.sort_results(&tokens, SortKey::Name, SortOrder::Descending);
    ascending.reverse();
    assert_eq!(ascending, descending);
}

#[test]
fn filter_never_renders_the_config_artifact() {
    let dir = TempDir::new().unwrap();
    let mut session = local_session(&dir);
    session.create_config(Configuration::default()).unwrap();
    session.add_file(&local_file(dir.path(), "report.pdf", 3)).unwrap();

    let tokens = session.search_all().unwrap();
    assert_eq!(session.return_file_list(&tokens).len(), 2);

    let rows = session.filter_results(&tokens, &[FilterKey::Name, FilterKey::Extension]);
    assert_eq!(rows, vec!["report pdf"]);
}

#[test]
fn filter_is_idempotent_and_ordered() {
    let local = TempDir::new().unwrap();
    let mut session = cloud_session();
    let id = session.add_file(&local_file(local.path(), "x.csv", 1)).unwrap();
    session
        .backend()
        .client()
        .set_times(&id, date(2022, 3, 4), date(2024, 5, 6))
        .unwrap();

    let tokens = session.search_all().unwrap();
    let keys = [FilterKey::ModifyDate, FilterKey::Name, FilterKey::CreationDate];
    let first = session.filter_results(&tokens, &keys);
    let second = session.filter_results(&tokens, &keys);
    assert_eq!(first, vec!["2024.05.06 x 2022.03.04"]);
    assert_eq!(first, second);
}

// =============================================================================
// Search
// =============================================================================

#[test]
fn searches_cover_children_and_nested_items() {
    let local = TempDir::new().unwrap();
    let mut session = cloud_session();
    session.add_file(&local_file(local.path(), "top.TXT", 1)).unwrap();
    session.create_directory("docs").unwrap();
    session.enter_directory("docs").unwrap();
    session.add_file(&local_file(local.path(), "inner.txt", 1)).unwrap();
    session.return_back_from_directory().unwrap();

    assert_eq!(session.search_by_extension(".txt").unwrap().len(), 1);
    assert_eq!(session.search_by_part_of_name("oc").unwrap().len(), 1);
    assert_eq!(session.search_all_from_root().unwrap().len(), 2);
    assert_eq!(session.search_all_from_root_without_root().unwrap().len(), 1);
    assert_eq!(session.search_all().unwrap().len(), 3);
}

#[test]
fn modified_after_is_strict() {
    let local = TempDir::new().unwrap();
    let mut session = cloud_session();
    let old = session.add_file(&local_file(local.path(), "old.txt", 1)).unwrap();
    let edge = session.add_file(&local_file(local.path(), "edge.txt", 1)).unwrap();
    let drive = session.backend().client();
    drive.set_times(&old, date(2020, 1, 1), date(2020, 1, 1)).unwrap();
    drive.set_times(&edge, date(2021, 1, 1), date(2021, 1, 1)).unwrap();
    session.add_file(&local_file(local.path(), "new.txt", 1)).unwrap();

    let hits = session.search_by_modified_after(date(2021, 1, 1)).unwrap();
    let records = session.return_file_list(&hits);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name(), "new");
}

// =============================================================================
// Configuration and navigation
// =============================================================================

#[test]
fn configuration_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let mut config = Configuration::new(5_000.0, [" BAT ", "exe"]).unwrap();
    config.set_default_file_count_limit(Some(7));
    {
        let mut session = local_session(&dir);
        assert!(!session.has_persisted_config().unwrap());
        session.create_config(config.clone()).unwrap();
    }

    let session = local_session(&dir);
    assert!(session.has_persisted_config().unwrap());
    assert_eq!(session.config(), &config);
    assert_eq!(
        session.read_config(ConfigItem::ForbiddenExtensions).unwrap(),
        ConfigValue::ForbiddenExtensions(vec!["bat".into(), "exe".into()])
    );
    assert_eq!(
        session.read_config(ConfigItem::MaxSizeLimit).unwrap(),
        ConfigValue::MaxSizeLimit(5_000.0)
    );
}

#[test]
fn config_read_before_persist_is_not_found() {
    let session = cloud_session();
    assert!(matches!(
        session.read_config(ConfigItem::FileCountLimits),
        Err(StorageError::NotFound { .. })
    ));
}

#[test]
fn navigation_never_leaves_storage_root() {
    let dir = TempDir::new().unwrap();
    let mut session = local_session(&dir);
    assert!(!session.return_back_from_directory().unwrap());

    session.create_directory("a").unwrap();
    session.enter_directory("a").unwrap();
    session.create_directory("b").unwrap();
    session.enter_directory("b").unwrap();
    assert!(session.return_back_from_directory().unwrap());
    assert!(session.return_back_from_directory().unwrap());
    assert_eq!(session.current_root(), session.storage_root());
    assert!(!session.return_back_from_directory().unwrap());
}

#[test]
fn move_rename_download_delete_round() {
    let dir = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let mut session = local_session(&dir);
    session.create_directory("archive").unwrap();
    session.create_directory("work").unwrap();
    session.enter_directory("work").unwrap();
    session.add_file(&local_file(dir.path(), "draft.txt", 5)).unwrap();

    session.rename_file_or_directory("draft.txt", "final.txt").unwrap();
    session.move_file_or_directory("final.txt", "/archive").unwrap();
    assert!(session.search_all_from_root().unwrap().is_empty());

    session.return_back_from_directory().unwrap();
    let written = session.download_file_or_directory("archive", out.path()).unwrap();
    assert_eq!(fs::read(written.join("final.txt")).unwrap().len(), 5);

    session.delete_file_or_folder("archive").unwrap();
    assert_eq!(names(&session), vec!["work"]);
}

// =============================================================================
// Runtime backend selection and layering
// =============================================================================

fn open_dyn(kind: BackendKind, root: &str) -> StorageSession<dyn StorageBackend> {
    let backend: Box<dyn StorageBackend> = match kind {
        BackendKind::Local => Box::new(LocalDiskBackend::new().layer(LoggingLayer::new("local"))),
        BackendKind::Cloud => Box::new(
            CloudDriveBackend::new(MemoryDrive::new()).layer(LoggingLayer::new("cloud")),
        ),
    };
    StorageSession::open(backend, root).unwrap()
}

#[test]
fn same_operations_on_both_backends_through_dyn() {
    let dir = TempDir::new().unwrap();
    let local_root = dir.path().join("dyn");
    for (kind, root) in [
        ("LOCAL", local_root.to_str().unwrap()),
        ("gdrive", "dyn"),
    ] {
        let kind: BackendKind = kind.parse().unwrap();
        let mut session = open_dyn(kind, root);
        session.create_directory_range(1, 2).unwrap();
        session.add_file(&local_file(dir.path(), "n.txt", 2)).unwrap();
        assert_eq!(names(&session), vec!["1", "2", "n"], "{kind}");
        assert_eq!(session.search_by_extension("TXT").unwrap().len(), 1, "{kind}");
    }
}

#[test]
fn counting_drive_is_a_client() {
    fn _takes(_: &dyn DriveClient) {}
    _takes(&CountingDrive::default());
}

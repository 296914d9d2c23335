//! Tests for IndexService: shard discovery, build, snapshot save/load

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use ngtrie::application::services::{BuildOptions, IndexService, Opened};
use ngtrie::infrastructure::di::ServiceContainer;
use ngtrie::infrastructure::traits::RealFileSystem;
use ngtrie::util::testing;
use ngtrie::{ApplicationError, DomainError, Settings};

/// Helper to create a shard file for testing
fn create_shard(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write shard");
    path
}

fn settings_for(temp: &TempDir) -> Settings {
    Settings {
        input_dir: temp.path().join("shards"),
        snapshot: temp.path().join("out").join("trigram_tree.bin"),
        min_score: 100,
        ..Settings::default()
    }
}

fn service_for(settings: Settings) -> IndexService {
    IndexService::new(Arc::new(RealFileSystem), Arc::new(settings))
}

fn shard_dir(temp: &TempDir) -> PathBuf {
    let dir = temp.path().join("shards");
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn given_mixed_files_when_discovering_then_returns_sorted_shards_only() {
    // Arrange
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let dir = shard_dir(&temp);
    create_shard(&dir, "output_002.txt", "");
    create_shard(&dir, "output_000.txt", "");
    create_shard(&dir, "output_001.csv", "");
    create_shard(&dir, "notes.txt", "");
    std::fs::create_dir(dir.join("output_999.txt")).unwrap();
    let service = service_for(settings_for(&temp));

    // Act
    let shards = service.discover_shards(&dir).unwrap();

    // Assert
    assert_eq!(
        shards,
        vec![dir.join("output_000.txt"), dir.join("output_002.txt")]
    );
}

#[test]
fn given_missing_directory_when_discovering_then_errors() {
    let temp = TempDir::new().unwrap();
    let service = service_for(settings_for(&temp));

    let result = service.discover_shards(&temp.path().join("nope"));

    assert!(matches!(result, Err(ApplicationError::InputDirNotFound(_))));
}

#[test]
fn given_directory_without_shards_when_building_then_errors() {
    let temp = TempDir::new().unwrap();
    let dir = shard_dir(&temp);
    create_shard(&dir, "readme.md", "hello");
    let service = service_for(settings_for(&temp));

    let result = service.build(&dir, 100);

    assert!(matches!(result, Err(ApplicationError::NoShards { .. })));
}

#[test]
fn given_shards_when_building_and_saving_then_snapshot_loads_identically() {
    // Arrange
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let dir = shard_dir(&temp);
    create_shard(&dir, "output_000.txt", "你好嗎\t150\n你好\t400\n天氣好\t90\n");
    create_shard(&dir, "output_001.txt", "天氣冷\t230\nbroken line\n你們好\t120\n");
    let settings = settings_for(&temp);
    let service = service_for(settings.clone());

    // Act
    let outcome = service
        .build_and_save(&BuildOptions::from_settings(&settings))
        .unwrap();
    let loaded = service.load(&settings.snapshot).unwrap();

    // Assert
    assert_eq!(outcome.report.sources, 2);
    assert_eq!(outcome.report.records, 6);
    assert_eq!(outcome.report.accepted, 4);
    assert_eq!(outcome.report.filtered, 1);
    assert_eq!(outcome.report.malformed, 1);
    assert_eq!(outcome.root_score, 150 + 400 + 230 + 120);
    assert_eq!(loaded, outcome.trie);
    assert_eq!(loaded.lookup("你").unwrap().score(), 670);
    assert_eq!(loaded.lookup("你").unwrap().ordered_children(None), vec!['好', '們']);
    assert!(loaded.lookup("天氣好").is_none());
    assert!(!settings.snapshot.with_extension("bin.tmp").exists());
}

#[test]
fn given_existing_snapshot_when_building_without_force_then_refuses() {
    let temp = TempDir::new().unwrap();
    let dir = shard_dir(&temp);
    create_shard(&dir, "output_000.txt", "AB\t150\n");
    let settings = settings_for(&temp);
    let service = service_for(settings.clone());
    let mut options = BuildOptions::from_settings(&settings);
    service.build_and_save(&options).unwrap();

    let refused = service.build_and_save(&options);
    assert!(matches!(refused, Err(ApplicationError::SnapshotExists(_))));

    create_shard(&dir, "output_001.txt", "AC\t200\n");
    options.force = true;
    let rebuilt = service.build_and_save(&options).unwrap();
    assert_eq!(rebuilt.root_score, 350);
    assert_eq!(service.load(&settings.snapshot).unwrap().root_score(), 350);
}

#[test]
fn given_no_snapshot_when_opening_then_builds_and_afterwards_loads() {
    let temp = TempDir::new().unwrap();
    let dir = shard_dir(&temp);
    create_shard(&dir, "output_000.txt", "AB\t150\nAC\t200\n");
    let container = ServiceContainer::new(settings_for(&temp));
    let service = container.index_service();

    let first = service.open_or_build().unwrap();
    assert!(matches!(first, Opened::Built(_)));
    assert_eq!(first.trie().root_score(), 350);

    let second = service.open_or_build().unwrap();
    assert!(matches!(second, Opened::Loaded(_)));
    assert_eq!(second.into_trie(), first.into_trie());
}

#[test]
fn given_missing_snapshot_when_loading_then_errors() {
    let temp = TempDir::new().unwrap();
    let service = service_for(settings_for(&temp));

    let result = service.load(&temp.path().join("missing.bin"));

    assert!(matches!(result, Err(ApplicationError::SnapshotNotFound(_))));
}

#[test]
fn given_foreign_file_when_loading_then_reports_format_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("trigram_tree.bin");
    std::fs::write(&path, b"PK\x03\x04 definitely not a trie").unwrap();
    let service = service_for(settings_for(&temp));

    let result = service.load(&path);

    match result {
        Err(ApplicationError::Domain(e)) => {
            assert!(matches!(e, DomainError::BadMagic));
            assert!(e.is_format_error());
        }
        other => panic!("expected format error, got {other:?}"),
    }
}

#[test]
fn given_truncated_snapshot_when_loading_then_reports_corruption() {
    let temp = TempDir::new().unwrap();
    let dir = shard_dir(&temp);
    create_shard(&dir, "output_000.txt", "AB\t150\nAC\t200\n");
    let settings = settings_for(&temp);
    let service = service_for(settings.clone());
    service
        .build_and_save(&BuildOptions::from_settings(&settings))
        .unwrap();

    let bytes = std::fs::read(&settings.snapshot).unwrap();
    std::fs::write(&settings.snapshot, &bytes[..bytes.len() - 2]).unwrap();

    let result = service.load(&settings.snapshot);
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::CorruptSnapshot { .. }))
    ));
}

#[test]
fn given_library_helpers_when_saving_then_loading_round_trips() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("tree.bin");
    let mut builder = ngtrie::TrieBuilder::new(0);
    builder.ingest("程式設計", 42).unwrap();
    builder.ingest("程式", 0).unwrap();
    let trie = builder.finish().aggregate();

    ngtrie::save(&trie, &path).unwrap();
    let loaded = ngtrie::load(&path).unwrap();

    assert_eq!(loaded, trie);
    assert_eq!(loaded.lookup("程式").unwrap().own_score(), Some(0));
}

#[test]
fn given_directory_at_destination_when_saving_then_errors_and_removes_tmp() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("tree.bin");
    std::fs::create_dir(&path).unwrap();
    let mut builder = ngtrie::TrieBuilder::new(0);
    builder.ingest("AB", 150).unwrap();
    let trie = builder.finish().aggregate();
    let service = service_for(settings_for(&temp));

    // Act
    let result = service.save(&trie, &path);

    // Assert
    assert!(matches!(result, Err(ApplicationError::OperationFailed { .. })));
    assert!(!temp.path().join("tree.bin.tmp").exists());
    assert!(path.is_dir());
}

#[test]
fn given_regular_file_as_parent_when_saving_then_errors() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    let path = blocker.join("tree.bin");
    let trie = ngtrie::TrieBuilder::new(0).finish().aggregate();
    let service = service_for(settings_for(&temp));

    let result = service.save(&trie, &path);

    assert!(matches!(result, Err(ApplicationError::OperationFailed { .. })));
    assert!(!path.exists());
    assert_eq!(std::fs::read_to_string(&blocker).unwrap(), "not a directory");
}

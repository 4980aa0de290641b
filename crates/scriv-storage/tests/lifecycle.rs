//! File manager lifecycle scenarios on a real temporary directory

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{Timelike, Utc};
use tempfile::TempDir;

use scriv_storage::{
    ConfigError, FileManager, FileManagerConfig, ManagerState, NamingPattern, extract_chunk,
};

fn files(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    paths.sort();
    paths
}

fn set_age(path: &Path, age: Duration) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(SystemTime::now() - age)
        .unwrap();
}

/// Place a file named by the default pattern into `dir`
fn seed(dir: &Path, chunk: u32, contents: &[u8], age: Duration) -> PathBuf {
    let name = NamingPattern::default().expand(Utc::now(), chunk, "seed-file");
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    set_age(&path, age);
    path
}

fn chunk_of(path: &Path) -> u32 {
    extract_chunk(path.file_name().unwrap().to_str().unwrap())
}

#[tokio::test]
async fn test_size_bound_rotates_before_overflowing_write() {
    let dir = TempDir::new().unwrap();
    let config = FileManagerConfig::testing(dir.path()).with_max_file_size(100);
    let handle = FileManager::spawn(config).unwrap();

    let first = vec![b'a'; 60];
    let second = vec![b'b'; 60];
    handle.write(first.clone());
    handle.write(second.clone());
    handle.flush().await.unwrap();

    let status = handle.status().await.unwrap();
    assert_eq!(status.rotations, 1);
    assert_eq!(status.file_bytes, 60);

    let current = status.current_path.unwrap();
    assert_eq!(chunk_of(&current), 2);
    assert_eq!(std::fs::read(&current).unwrap(), second);

    let all = files(dir.path());
    assert_eq!(all.len(), 2);
    let previous = all.iter().find(|p| **p != current).unwrap();
    assert_eq!(std::fs::read(previous).unwrap(), first);
}

#[tokio::test]
async fn test_resumes_todays_live_file() {
    let dir = TempDir::new().unwrap();
    // Five minutes ago, unless that would fall on yesterday
    let since_midnight = Duration::from_secs(u64::from(Utc::now().num_seconds_from_midnight()));
    let age = Duration::from_secs(300).min(since_midnight / 2);
    let existing = seed(dir.path(), 3, &[b'x'; 37], age);

    let config = FileManagerConfig::testing(dir.path()).with_max_file_size(1_000);
    let handle = FileManager::spawn(config).unwrap();

    let status = handle.status().await.unwrap();
    assert_eq!(status.state, ManagerState::Ready);
    assert_eq!(status.current_path.as_deref(), Some(existing.as_path()));
    assert_eq!(status.file_bytes, 37);
    assert_eq!(files(dir.path()).len(), 1);

    handle.write(&b"more\n"[..]);
    handle.flush().await.unwrap();
    assert_eq!(std::fs::metadata(&existing).unwrap().len(), 42);

    handle.rotate().await.unwrap();
    let rotated = handle.status().await.unwrap().current_path.unwrap();
    assert_eq!(chunk_of(&rotated), 4);
}

#[tokio::test]
async fn test_files_from_other_days_are_not_resumed() {
    let dir = TempDir::new().unwrap();
    let old = seed(dir.path(), 1, b"old", Duration::from_secs(2 * 86_400));

    let handle = FileManager::spawn(FileManagerConfig::testing(dir.path())).unwrap();
    let status = handle.status().await.unwrap();

    assert_ne!(status.current_path.as_deref(), Some(old.as_path()));
    assert_eq!(chunk_of(&status.current_path.unwrap()), 1);
    assert_eq!(files(dir.path()).len(), 2);
}

#[tokio::test]
async fn test_archives_aged_files() {
    let dir = TempDir::new().unwrap();
    let config = FileManagerConfig::testing(dir.path())
        .with_archive_after("1h")
        .with_retention("1D");
    let handle = FileManager::spawn(config).unwrap();
    let current = handle.status().await.unwrap().current_path.unwrap();

    let aged = seed(dir.path(), 7, b"archive me\n", Duration::from_secs(2 * 3600));
    let fresh = seed(dir.path(), 8, b"keep me\n", Duration::from_secs(60));

    assert_eq!(handle.archive().await.unwrap(), 1);

    let mut gz = aged.clone().into_os_string();
    gz.push(".gz");
    assert!(PathBuf::from(gz).exists());
    assert!(!aged.exists());
    assert!(fresh.exists());
    assert!(current.exists());
}

#[tokio::test]
async fn test_cleanup_deletes_expired_files_including_archives() {
    let dir = TempDir::new().unwrap();
    let config = FileManagerConfig::testing(dir.path())
        .with_archive_after("1D")
        .with_retention("2D");
    let handle = FileManager::spawn(config).unwrap();
    // Seed only after the startup cleanup pass
    handle.status().await.unwrap();

    let expired = seed(dir.path(), 1, b"old", Duration::from_secs(3 * 86_400));
    let mut archived = expired.clone().into_os_string();
    archived.push(".gz");
    let archived = PathBuf::from(archived);
    std::fs::write(&archived, b"gz").unwrap();
    set_age(&archived, Duration::from_secs(3 * 86_400));

    let unrelated = dir.path().join("notes.txt");
    std::fs::write(&unrelated, b"not a log").unwrap();
    set_age(&unrelated, Duration::from_secs(3 * 86_400));

    assert_eq!(handle.cleanup().await.unwrap(), 2);
    assert!(!expired.exists());
    assert!(!archived.exists());
    assert!(unrelated.exists());
}

#[tokio::test]
async fn test_initialization_cleans_expired_files() {
    let dir = TempDir::new().unwrap();
    let expired = seed(dir.path(), 1, b"old", Duration::from_secs(20 * 86_400));

    let handle = FileManager::spawn(FileManagerConfig::testing(dir.path())).unwrap();
    handle.flush().await.unwrap();

    assert!(!expired.exists());
}

#[tokio::test]
async fn test_creates_missing_output_directory() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a").join("b");

    let handle = FileManager::spawn(FileManagerConfig::testing(&nested)).unwrap();
    handle.write(&b"hi\n"[..]);
    handle.flush().await.unwrap();

    assert_eq!(files(&nested).len(), 1);
}

#[tokio::test]
async fn test_writes_keep_call_order() {
    let dir = TempDir::new().unwrap();
    let handle = FileManager::spawn(FileManagerConfig::testing(dir.path())).unwrap();

    for i in 0..200 {
        handle.write(format!("{i}\n"));
    }
    handle.flush().await.unwrap();

    let current = handle.status().await.unwrap().current_path.unwrap();
    let lines: Vec<u32> = std::fs::read_to_string(current)
        .unwrap()
        .lines()
        .map(|l| l.parse().unwrap())
        .collect();
    assert_eq!(lines, (0..200).collect::<Vec<u32>>());
}

#[test]
fn test_retention_boundary() {
    let equal = FileManagerConfig::default()
        .with_retention("1h")
        .with_archive_after("3600000ms");
    assert!(matches!(
        equal.validate(),
        Err(ConfigError::RetentionNotAfterArchive { .. })
    ));

    let one_more = FileManagerConfig::default()
        .with_retention("3600001ms")
        .with_archive_after("1h");
    assert!(one_more.validate().is_ok());
}

#[test]
fn test_zero_lifetime_means_one_month() {
    let settings = FileManagerConfig::default()
        .with_retention("0D")
        .validate()
        .unwrap();
    assert_eq!(settings.retention, Duration::from_secs(30 * 86_400));
}

#[test]
fn test_malformed_lifetime_fails() {
    let config = FileManagerConfig::default().with_retention("two weeks");
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidLifetime(_))
    ));
}

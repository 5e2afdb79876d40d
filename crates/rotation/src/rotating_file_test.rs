//! Tests for the rotating file

use std::fs::{self, File};
use std::time::{Duration, SystemTime};

use bandlog_core::Sink;
use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use crate::error::RotationError;
use crate::rotating_file::{Clock, RotatingFile, RotationOptions, truncate};

fn minute_pattern(dir: &TempDir) -> String {
    format!("{}/access.log.%Y%m%d%H%M", dir.path().display())
}

fn minute_options() -> RotationOptions {
    RotationOptions::default()
        .with_rotation_period(Some(Duration::from_secs(60)))
        .with_clock(Clock::Utc)
}

#[test]
fn test_truncate_aligns_to_period() {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 13, 7, 42).unwrap();
    assert_eq!(
        truncate(now, Duration::from_secs(3600)),
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    );
    assert_eq!(
        truncate(now, Duration::from_secs(60)),
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 7, 0).unwrap()
    );
}

#[test]
fn test_static_pattern_creates_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("app.log");
    let file = RotatingFile::open(path.display().to_string(), RotationOptions::default()).unwrap();

    file.write_record(b"hello\n").unwrap();
    file.sync().unwrap();

    assert_eq!(file.current_path(), path);
    assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
}

#[test]
fn test_same_bucket_appends() {
    let dir = TempDir::new().unwrap();
    let file = RotatingFile::open(minute_pattern(&dir), minute_options()).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 13, 7, 5).unwrap();

    file.write_at(b"one\n", now).unwrap();
    file.write_at(b"two\n", now + chrono::Duration::seconds(30))
        .unwrap();

    let path = dir.path().join("access.log.202405011307");
    assert_eq!(fs::read_to_string(path).unwrap(), "one\ntwo\n");
}

#[test]
fn test_bucket_change_opens_new_file() {
    let dir = TempDir::new().unwrap();
    let file = RotatingFile::open(minute_pattern(&dir), minute_options()).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 13, 7, 5).unwrap();

    file.write_at(b"first\n", now).unwrap();
    file.write_at(b"second\n", now + chrono::Duration::minutes(1))
        .unwrap();

    assert_eq!(
        fs::read_to_string(dir.path().join("access.log.202405011307")).unwrap(),
        "first\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("access.log.202405011308")).unwrap(),
        "second\n"
    );
    assert_eq!(
        file.current_path(),
        dir.path().join("access.log.202405011308")
    );

    let snapshot = file.metrics().snapshot();
    assert_eq!(snapshot.records_written, 2);
    assert_eq!(snapshot.bytes_written, 13);
    // open at real time, then two distinct buckets
    assert!(snapshot.files_opened >= 2);
}

#[cfg(unix)]
#[test]
fn test_symlink_follows_rotation() {
    let dir = TempDir::new().unwrap();
    let link = dir.path().join("access.log");
    let options = minute_options().with_link_name(Some(link.clone()));
    let file = RotatingFile::open(minute_pattern(&dir), options).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 13, 7, 5).unwrap();

    file.write_at(b"first\n", now).unwrap();
    assert_eq!(
        fs::read_link(&link).unwrap(),
        dir.path().join("access.log.202405011307")
    );

    file.write_at(b"second\n", now + chrono::Duration::minutes(5))
        .unwrap();
    assert_eq!(
        fs::read_link(&link).unwrap(),
        dir.path().join("access.log.202405011312")
    );
    assert_eq!(fs::read_to_string(&link).unwrap(), "second\n");
}

#[cfg(unix)]
#[test]
fn test_link_never_replaces_regular_file() {
    let dir = TempDir::new().unwrap();
    let link = dir.path().join("access.log");
    fs::write(&link, "keep").unwrap();

    let options = minute_options().with_link_name(Some(link.clone()));
    let file = RotatingFile::open(minute_pattern(&dir), options).unwrap();
    file.write_record(b"x\n").unwrap();

    assert_eq!(fs::read_to_string(&link).unwrap(), "keep");
}

#[test]
fn test_purge_removes_expired_files() {
    let dir = TempDir::new().unwrap();
    let options = minute_options().with_max_age(Duration::from_secs(24 * 60 * 60));
    let file = RotatingFile::open(minute_pattern(&dir), options).unwrap();

    let now = Utc::now();
    let expired = dir.path().join("access.log.200001010000");
    let recent = dir.path().join("access.log.200001010001");
    let unrelated = dir.path().join("other.log");
    for path in [&expired, &recent, &unrelated] {
        File::create(path).unwrap();
    }
    let month_ago = SystemTime::now() - Duration::from_secs(30 * 24 * 60 * 60);
    File::options()
        .write(true)
        .open(&expired)
        .unwrap()
        .set_modified(month_ago)
        .unwrap();
    File::options()
        .write(true)
        .open(&unrelated)
        .unwrap()
        .set_modified(month_ago)
        .unwrap();

    file.write_at(b"rotate\n", now + chrono::Duration::hours(1))
        .unwrap();

    assert!(!expired.exists());
    assert!(recent.exists());
    assert!(unrelated.exists());
    assert!(file.current_path().exists());
    assert_eq!(file.metrics().snapshot().files_purged, 1);
}

#[test]
fn test_purge_keeps_current_file() {
    let dir = TempDir::new().unwrap();
    let options = minute_options().with_max_age(Duration::ZERO);
    let file = RotatingFile::open(minute_pattern(&dir), options).unwrap();
    let current = file.current_path();

    let removed = file.purge(Utc::now() + chrono::Duration::days(1), &current);

    assert_eq!(removed, 0);
    assert!(current.exists());
}

#[test]
fn test_write_after_close_fails() {
    let dir = TempDir::new().unwrap();
    let file = RotatingFile::open(minute_pattern(&dir), minute_options()).unwrap();
    file.close().unwrap();

    let err = file.write_at(b"late\n", Utc::now()).unwrap_err();
    assert!(matches!(err, RotationError::Closed));
    assert_eq!(
        file.write_record(b"late\n").unwrap_err().kind(),
        std::io::ErrorKind::BrokenPipe
    );
}

#[test]
fn test_invalid_pattern_fails_open() {
    let err = RotatingFile::open("app.log.%Q", RotationOptions::default()).unwrap_err();
    assert!(matches!(err, RotationError::InvalidPattern { .. }));
}

//! Tests for the rotating writer factory

use std::fs;
use std::time::Duration;

use bandlog_config::DestinationConfig;
use bandlog_core::Sink;
use tempfile::TempDir;

use crate::error::Error;
use crate::writer::open_rotating_writer;

#[test]
fn test_creates_missing_directories() {
    let dir = TempDir::new().unwrap();
    let log_dir = dir.path().join("a").join("b");
    let file = open_rotating_writer(&DestinationConfig::new(&log_dir, "app.log")).unwrap();

    assert!(log_dir.is_dir());
    assert_eq!(file.current_path(), log_dir.join("app.log"));
}

#[test]
fn test_directory_path_is_a_file() {
    let dir = TempDir::new().unwrap();
    let not_a_dir = dir.path().join("taken");
    fs::write(&not_a_dir, "x").unwrap();

    let err = open_rotating_writer(&DestinationConfig::new(&not_a_dir, "app.log")).unwrap_err();
    assert!(matches!(err, Error::InvalidPath { .. }));
}

#[test]
fn test_empty_filename() {
    let dir = TempDir::new().unwrap();
    let err = open_rotating_writer(&DestinationConfig::new(dir.path(), "")).unwrap_err();
    assert!(matches!(err, Error::InvalidPath { .. }));
}

#[test]
fn test_suffix_is_dot_extension() {
    let dir = TempDir::new().unwrap();
    let config = DestinationConfig::new(dir.path(), "access.log")
        .with_suffix("%Y")
        .with_rotate_duration(Duration::from_secs(3600));
    let file = open_rotating_writer(&config).unwrap();

    let name = file.current_path();
    let name = name.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("access.log."), "{name}");
    assert_eq!(name.len(), "access.log.".len() + 4);
    assert_eq!(file.pattern().as_str(), format!("{}.%Y", dir.path().join("access.log").display()));
}

#[test]
fn test_passes_retention_and_period() {
    let dir = TempDir::new().unwrap();
    let config = DestinationConfig::new(dir.path(), "access.log")
        .with_suffix("%Y%m%d%H")
        .with_rotate_duration(Duration::from_secs(3600))
        .with_retain_age(Duration::from_secs(86400));
    let file = open_rotating_writer(&config).unwrap();

    assert_eq!(
        file.options().rotation_period,
        Some(Duration::from_secs(3600))
    );
    assert_eq!(file.options().max_age, Duration::from_secs(86400));
    assert!(file.options().link_name.is_none());
}

#[test]
fn test_invalid_suffix() {
    let dir = TempDir::new().unwrap();
    let config = DestinationConfig::new(dir.path(), "access.log").with_suffix("%Q");
    let err = open_rotating_writer(&config).unwrap_err();
    assert!(matches!(err, Error::Rotation(_)));
}

#[cfg(unix)]
#[test]
fn test_soft_link_points_at_current_file() {
    let dir = TempDir::new().unwrap();
    let config = DestinationConfig::new(dir.path(), "error.log")
        .with_suffix("%Y%m%d")
        .with_soft_link(true);
    let file = open_rotating_writer(&config).unwrap();
    file.write_record(b"boom\n").unwrap();

    let link = dir.path().join("error.log");
    assert_eq!(fs::read_link(&link).unwrap(), file.current_path());
    assert_eq!(fs::read_to_string(&link).unwrap(), "boom\n");
}

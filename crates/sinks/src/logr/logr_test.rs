//! Logr sink tests

use super::*;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{Local, TimeZone};
use ferry_pipeline::test_utils::TestContext;
use ferry_pipeline::{PluginConfig, PluginKind};
use lz4_flex::frame::FrameDecoder;
use tempfile::tempdir;

use super::rotator::rotated_name;

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

fn plain(path: PathBuf) -> LogrConfig {
    LogrConfig::with_path(path).with_compress(false)
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn test_config_default() {
    let config = LogrConfig::default();
    assert_eq!(config.path, PathBuf::from(DEFAULT_PATH));
    assert!(config.newline);
    assert_eq!(config.max_size, DEFAULT_MAX_SIZE);
    assert_eq!(config.on_limit, OnLimit::Rotate);
    assert!(!config.rotate_daily);
    assert!(config.compress);
    assert_eq!(config.time_format, "%Y-%m");
    assert!(config.validate(NAME).is_ok());
}

#[test]
fn test_config_rejects_bad_time_format() {
    let mut config = LogrConfig::default();
    config.time_format = "%Q".into();
    assert!(config.validate(NAME).is_err());

    config.time_format = "%Y/%m".into();
    assert!(config.validate(NAME).is_err());
}

#[test]
fn test_config_decode() {
    let config: LogrConfig = PluginConfig::new(NAME)
        .with_option("path", "/var/log/dump.log")
        .with_option("on_limit", "truncate")
        .with_option("max_size", 2048)
        .with_option("newline", false)
        .decode()
        .unwrap();

    assert_eq!(config.path, PathBuf::from("/var/log/dump.log"));
    assert_eq!(config.on_limit, OnLimit::Truncate);
    assert_eq!(config.max_size, 2048);
    assert!(!config.newline);
}

// ============================================================================
// Rotated names
// ============================================================================

#[test]
fn test_rotated_name_suffix() {
    let start = Local.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap();
    let name = rotated_name(Path::new("/tmp/dump.log"), start, &LogrConfig::default()).unwrap();
    assert_eq!(name, PathBuf::from("/tmp/dump.log.2025-03"));
}

#[test]
fn test_rotated_name_prefix() {
    let start = Local.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap();
    let config = LogrConfig {
        time_format: "%Y-%m-%d".into(),
        time_format_as_prefix: true,
        ..LogrConfig::default()
    };

    let name = rotated_name(Path::new("/tmp/dump.log"), start, &config).unwrap();
    assert_eq!(name, PathBuf::from("/tmp/dump.2025-03-14.log"));

    // no extension to put the stamp in front of
    let name = rotated_name(Path::new("/tmp/dump"), start, &config).unwrap();
    assert_eq!(name, PathBuf::from("/tmp/dump.2025-03-14"));
}

// ============================================================================
// RotatingWriter
// ============================================================================

#[test]
fn test_appends_to_existing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dump.log");
    std::fs::write(&path, "old\n").unwrap();

    let mut writer = RotatingWriter::open(plain(path.clone())).unwrap();
    assert_eq!(writer.size(), 4);
    writer.write_record(b"new").unwrap();
    writer.flush().unwrap();

    assert_eq!(read(&path), "old\nnew\n");
    assert_eq!(writer.size(), 8);
}

#[test]
fn test_creates_parent_directories() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested/deeper/dump.log");

    let mut writer = RotatingWriter::open(plain(path.clone())).unwrap();
    writer.write_record(b"x").unwrap();
    writer.flush().unwrap();
    assert_eq!(read(&path), "x\n");
}

#[test]
fn test_rotates_at_size_limit_with_collision_suffix() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dump.log");
    let mut writer = RotatingWriter::open(plain(path.clone()).with_max_size(10)).unwrap();

    assert!(writer.write_record(b"12345").unwrap().is_none());
    assert!(writer.write_record(b"67890").unwrap().is_none());
    let first = writer.write_record(b"abc").unwrap().expect("first rotation");
    writer.flush().unwrap();

    assert!(first.file_name().unwrap().to_string_lossy().starts_with("dump.log."));
    assert_eq!(read(&first), "12345\n67890\n");
    assert_eq!(read(&path), "abc\n");

    writer.write_record(b"defghij").unwrap();
    let second = writer.write_record(b"z").unwrap().expect("second rotation");
    writer.flush().unwrap();

    assert_eq!(second, PathBuf::from(format!("{}.1", first.display())));
    assert_eq!(read(&second), "abc\ndefghij\n");
    assert_eq!(read(&path), "z\n");
    assert_eq!(file_count(dir.path()), 3);
}

#[test]
fn test_truncates_at_size_limit() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dump.log");
    let config = plain(path.clone())
        .with_max_size(10)
        .with_on_limit(OnLimit::Truncate);
    let mut writer = RotatingWriter::open(config).unwrap();

    writer.write_record(b"12345").unwrap();
    writer.write_record(b"67890").unwrap();
    assert!(writer.write_record(b"fresh").unwrap().is_none());
    writer.flush().unwrap();

    assert_eq!(read(&path), "fresh\n");
    assert_eq!(writer.size(), 6);
    assert_eq!(file_count(dir.path()), 1);
}

#[test]
fn test_without_newline() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dump.log");
    let config = LogrConfig {
        newline: false,
        ..plain(path.clone())
    };
    let mut writer = RotatingWriter::open(config).unwrap();

    writer.write_record(b"a").unwrap();
    writer.write_record(b"b").unwrap();
    writer.flush().unwrap();
    assert_eq!(read(&path), "ab");
}

#[test]
fn test_rotation_compresses() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dump.log");
    let config = LogrConfig::with_path(path.clone()).with_max_size(4);
    let mut writer = RotatingWriter::open(config).unwrap();

    writer.write_record(b"payload").unwrap();
    let rotated = writer.write_record(b"next").unwrap().expect("rotation");
    writer.flush().unwrap();

    assert_eq!(rotated.extension().unwrap(), COMPRESSED_EXTENSION);
    // the uncompressed copy is gone
    assert_eq!(file_count(dir.path()), 2);

    let compressed = std::fs::read(&rotated).unwrap();
    let mut decoded = String::new();
    FrameDecoder::new(&compressed[..])
        .read_to_string(&mut decoded)
        .unwrap();
    assert_eq!(decoded, "payload\n");
}

#[test]
fn test_rotates_on_new_day() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dump.log");
    let config = LogrConfig {
        rotate_daily: true,
        max_size: 0,
        ..plain(path.clone())
    };
    let mut writer = RotatingWriter::open(config).unwrap();
    let today = Local::now();
    let tomorrow = today + chrono::Duration::days(1);

    assert!(writer.write_record_at(b"today", today).unwrap().is_none());
    let rotated = writer
        .write_record_at(b"tomorrow", tomorrow)
        .unwrap()
        .expect("daily rotation");
    // the new period has started
    assert!(writer.write_record_at(b"later", tomorrow).unwrap().is_none());
    writer.flush().unwrap();

    assert_eq!(read(&rotated), "today\n");
    assert_eq!(read(&path), "tomorrow\nlater\n");
}

#[test]
fn test_reopen_after_external_move() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dump.log");
    let moved = dir.path().join("moved.log");
    let mut writer = RotatingWriter::open(plain(path.clone())).unwrap();

    writer.write_record(b"before").unwrap();
    writer.flush().unwrap();
    std::fs::rename(&path, &moved).unwrap();

    writer.reopen().unwrap();
    writer.write_record(b"after").unwrap();
    writer.flush().unwrap();

    assert_eq!(read(&moved), "before\n");
    assert_eq!(read(&path), "after\n");
}

// ============================================================================
// Output
// ============================================================================

fn bound_harness(path: &Path, extra: &[(&str, bool)]) -> TestContext {
    let mut config = PluginConfig::new(NAME)
        .with_option("path", path.to_string_lossy().into_owned())
        .with_option("compress", false);
    for (key, value) in extra {
        config = config.with_option(*key, *value);
    }
    TestContext::new(PluginKind::Output, config)
}

#[tokio::test]
async fn test_output_writes_batch() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dump.log");
    let harness = bound_harness(&path, &[]);

    let output = LogrOutput::new();
    output.bind(&harness.ctx).await.unwrap();
    output
        .write(&[Packet::from("one"), Packet::from("two")])
        .await;

    assert_eq!(read(&path), "one\ntwo\n");
}

#[tokio::test]
async fn test_output_without_newline() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dump.log");
    let harness = bound_harness(&path, &[("newline", false)]);

    let output = LogrOutput::new();
    output.bind(&harness.ctx).await.unwrap();
    output.write(&[Packet::from("a"), Packet::from("b")]).await;

    assert_eq!(read(&path), "ab");
}

#[tokio::test]
async fn test_output_refresh_reopens() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dump.log");
    let moved = dir.path().join("dump.log.old");

    let output = LogrOutput::open(plain(path.clone())).unwrap();
    output.write(&[Packet::from("before")]).await;
    std::fs::rename(&path, &moved).unwrap();

    output.refresh();
    output.write(&[Packet::from("after")]).await;

    assert_eq!(read(&moved), "before\n");
    assert_eq!(read(&path), "after\n");
}

#[tokio::test]
async fn test_output_write_before_bind_is_dropped() {
    let output = LogrOutput::new();
    output.write(&[Packet::from("lost")]).await;
    output.refresh();
}

#[tokio::test]
async fn test_bind_rejects_unknown_option() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dump.log");
    let harness = bound_harness(&path, &[("gzip", true)]);

    assert!(LogrOutput::new().bind(&harness.ctx).await.is_err());
    assert!(!path.exists());
}

//! Command sink tests

use super::*;
use ferry_pipeline::test_utils::TestContext;
use ferry_pipeline::{PluginConfig, PluginKind};
use tempfile::tempdir;

// ============================================================================
// Config
// ============================================================================

#[test]
fn test_config_default() {
    let config = CommandConfig::default();
    assert_eq!(config.shell, vec!["sh", "-c"]);
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert!(config.validate(NAME).is_ok());
}

#[test]
fn test_config_validation() {
    let empty_shell = CommandConfig {
        shell: Vec::new(),
        ..CommandConfig::default()
    };
    assert!(empty_shell.validate(NAME).is_err());

    let zero_timeout = CommandConfig::default().with_timeout(Duration::ZERO);
    assert!(zero_timeout.validate(NAME).is_err());
}

// ============================================================================
// run_script
// ============================================================================

#[cfg(unix)]
#[tokio::test]
async fn test_run_script_captures_stdout() {
    let out = run_script(&CommandConfig::default(), "echo hello").await.unwrap();
    assert_eq!(out, "hello\n");
}

#[cfg(unix)]
#[tokio::test]
async fn test_run_script_reports_failure() {
    let err = run_script(&CommandConfig::default(), "echo broken >&2; exit 3")
        .await
        .unwrap_err();

    match err {
        CommandError::Failed { status, stderr } => {
            assert_eq!(status.code(), Some(3));
            assert_eq!(stderr, "broken");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_run_script_times_out() {
    let config = CommandConfig::default().with_timeout(Duration::from_millis(100));
    let started = std::time::Instant::now();

    let err = run_script(&config, "sleep 5").await.unwrap_err();
    assert!(matches!(err, CommandError::Timeout(_)));
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_run_script_missing_shell() {
    let config = CommandConfig {
        shell: vec!["/nonexistent/shell".into()],
        ..CommandConfig::default()
    };
    let err = run_script(&config, "true").await.unwrap_err();
    assert!(matches!(err, CommandError::Spawn { .. }));
}

// ============================================================================
// Output
// ============================================================================

#[cfg(unix)]
#[tokio::test]
async fn test_write_runs_each_packet_in_order() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("ran.txt");
    let log = log.display();

    let output = CommandOutput::new();
    let harness = TestContext::new(PluginKind::Output, PluginConfig::new(NAME));
    output.bind(&harness.ctx).await.unwrap();

    let batch = vec![
        Packet::new(format!("echo first >> {log}").into()),
        Packet::from("   "),
        Packet::new(format!("echo second >> {log}").into()),
        Packet::from("exit 1"),
    ];
    output.write(&batch).await;

    let ran = std::fs::read_to_string(dir.path().join("ran.txt")).unwrap();
    assert_eq!(ran, "first\nsecond\n");
}

#[tokio::test]
async fn test_bind_rejects_bad_options() {
    let config = PluginConfig::new(NAME).with_option("timeout", "0s");
    let harness = TestContext::new(PluginKind::Output, config);
    assert!(CommandOutput::new().bind(&harness.ctx).await.is_err());

    let config = PluginConfig::new(NAME).with_option("retries", 3);
    let harness = TestContext::new(PluginKind::Output, config);
    assert!(CommandOutput::new().bind(&harness.ctx).await.is_err());
}

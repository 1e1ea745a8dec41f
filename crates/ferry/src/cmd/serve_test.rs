use std::sync::Arc;
use std::time::Duration;

use ferry_config::{LogLevel, PluginConfig, PluginConfigs};
use ferry_pipeline::PluginRegistry;
use ferry_pipeline::test_utils::{PassFilter, RecordingOutput, VecInput, wait_for};

use super::*;

// =============================================================================
// Config resolution
// =============================================================================

#[test]
fn test_explicit_config_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    let err = resolve_config(Some(&missing), &[]).unwrap_err();
    assert!(err.to_string().contains("config file not found"));
}

#[test]
fn test_explicit_config_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agent.toml");
    std::fs::write(&path, "[pipeline]\ninput = \"file\"\n").unwrap();

    let (config, source) = resolve_config(Some(&path), &[]).unwrap();
    assert_eq!(config.pipeline.input, "file");
    assert_eq!(source.as_deref(), Some(path.as_path()));
}

#[test]
fn test_first_existing_candidate_wins() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("configs").join("ferry.toml");
    let second = dir.path().join("ferry.toml");
    std::fs::write(&second, "[pipeline]\noutput = \"logr\"\n").unwrap();

    let (config, source) = resolve_config(None, &[first, second.clone()]).unwrap();
    assert_eq!(config.pipeline.output, "logr");
    assert_eq!(source, Some(second));
}

#[test]
fn test_no_candidates_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let candidates = [dir.path().join("ferry.toml")];

    let (config, source) = resolve_config(None, &candidates).unwrap();
    assert!(source.is_none());
    assert_eq!(config.pipeline.input, "stdin");
    assert_eq!(config.pipeline.output, "stdout");
}

#[test]
fn test_broken_candidate_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ferry.toml");
    std::fs::write(&path, "[agent\n").unwrap();

    let err = resolve_config(None, &[path]).unwrap_err();
    assert!(err.to_string().contains("failed to load configuration"));
}

// =============================================================================
// Overrides
// =============================================================================

#[test]
fn test_overrides_replace_config() {
    let mut config = Config::default();
    let args = ServeArgs {
        log_level: Some(LogLevel::Debug),
        input: Some("cron".into()),
        filter: Some("noop".into()),
        output: Some("command".into()),
        ..Default::default()
    };

    apply_overrides(&mut config, &args).unwrap();
    assert_eq!(config.log.level, LogLevel::Debug);
    assert_eq!(config.pipeline.input, "cron");
    assert_eq!(config.pipeline.filter, "noop");
    assert_eq!(config.pipeline.output, "command");
}

#[test]
fn test_no_overrides_keeps_config() {
    let mut config: Config = "[pipeline]\ninput = \"file\"".parse().unwrap();
    apply_overrides(&mut config, &ServeArgs::default()).unwrap();
    assert_eq!(config.pipeline.input, "file");
    assert_eq!(config.log.level, LogLevel::Info);
}

#[test]
fn test_http_address_override_enables_api() {
    let mut config: Config = "[api_server]\nenabled = false".parse().unwrap();
    let args = ServeArgs {
        http_address: Some("127.0.0.1:9000".into()),
        ..Default::default()
    };

    apply_overrides(&mut config, &args).unwrap();
    assert!(config.api_server.enabled);
    assert_eq!(config.api_server.address(), "127.0.0.1:9000");
}

#[test]
fn test_invalid_http_address() {
    let mut config = Config::default();
    let args = ServeArgs {
        http_address: Some("localhost".into()),
        ..Default::default()
    };

    let err = apply_overrides(&mut config, &args).unwrap_err();
    assert!(err.to_string().contains("--http-address"));
}

#[test]
fn test_overrides_are_validated() {
    let mut config = Config::default();
    let args = ServeArgs {
        input: Some("  ".into()),
        ..Default::default()
    };

    let err = apply_overrides(&mut config, &args).unwrap_err();
    assert!(err.to_string().contains("invalid configuration"));
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn test_shutdown_on_input_exit() {
    let mut registry = PluginRegistry::new();
    registry.register_input("vec", Arc::new(VecInput::new(["a", "b"])));
    registry.register_filter("pass", Arc::new(PassFilter));
    registry.register_output("rec", Arc::new(RecordingOutput::new()));

    let options = AgentOptions::default().with_plugins("vec", "pass", "rec");
    let agent = Agent::new(options, registry, PluginConfigs::new());
    agent.start().await.unwrap();

    let reason = tokio::time::timeout(Duration::from_secs(5), wait_for_shutdown(&agent, true))
        .await
        .unwrap();
    assert_eq!(reason, "input finished");

    agent.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_input_exit_ignored_by_default() {
    let mut registry = PluginRegistry::new();
    registry.register_input("vec", Arc::new(VecInput::new(["a"])));
    registry.register_filter("pass", Arc::new(PassFilter));
    registry.register_output("rec", Arc::new(RecordingOutput::new()));

    let options = AgentOptions::default().with_plugins("vec", "pass", "rec");
    let agent = Agent::new(options, registry, PluginConfigs::new());
    agent.start().await.unwrap();

    let waited =
        tokio::time::timeout(Duration::from_millis(300), wait_for_shutdown(&agent, false)).await;
    assert!(waited.is_err());

    agent.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unknown_plugin_fails_start() {
    let mut config = Config::default();
    config.pipeline.input = "bogus".into();
    config.api_server.enabled = false;

    let err = run_agent(config).await.unwrap_err();
    assert!(err.to_string().contains("failed to start pipeline"));
}

#[tokio::test]
async fn test_file_to_logr_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("in.log");
    let sink = dir.path().join("out.log");
    std::fs::write(&source, "alpha\n\nbeta\n").unwrap();

    let mut plugin_configs = PluginConfigs::new();
    plugin_configs.insert(
        PluginConfig::new("file")
            .with_option("path", source.display().to_string())
            .with_option("start_position", "beginning")
            .with_option("sincedb_path", "")
            .with_option("poll_interval", "10ms"),
    );
    plugin_configs.insert(
        PluginConfig::new("logr")
            .with_option("path", sink.display().to_string())
            .with_option("compress", false),
    );

    let options = AgentOptions::default().with_plugins("file", "valid", "logr");
    let agent = Agent::new(options, default_registry(), plugin_configs);
    agent.start().await.unwrap();

    // The empty line is rejected by the valid filter
    let delivered = wait_for(Duration::from_secs(5), || {
        std::fs::read_to_string(&sink).is_ok_and(|s| s == "alpha\nbeta\n")
    })
    .await;

    agent.shutdown().await.unwrap();
    assert!(delivered);
    assert_eq!(agent.metrics().filter_rejected, 1);
}

// =============================================================================
// Shipped configs
// =============================================================================

fn shipped(path: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../configs").join(path)
}

#[test]
fn test_shipped_config_loads() {
    let path = shipped("ferry.toml");
    let (config, _) = resolve_config(Some(&path), &[]).unwrap();
    assert_eq!(config.pipeline.input, "file");
    assert_eq!(config.pipeline.output, "logr");

    let plugin_configs = config.load_plugin_configs().unwrap();
    let file: ferry_sources::FileConfig = plugin_configs.resolve("file").decode().unwrap();
    file.validate("file").unwrap();
    let logr: ferry_sinks::LogrConfig = plugin_configs.resolve("logr").decode().unwrap();
    logr.validate("logr").unwrap();
}

#[test]
fn test_shipped_plugin_documents_decode() {
    let plugin_configs = PluginConfigs::load([
        shipped("plugins/cron.toml"),
        shipped("plugins/command.toml"),
        shipped("plugins/valid.json"),
        shipped("plugins/rabbitmq.toml"),
    ])
    .unwrap();

    let cron: ferry_sources::CronConfig = plugin_configs.resolve("cron").decode().unwrap();
    assert_eq!(cron.schedules("cron").unwrap().len(), 2);

    let command: ferry_sinks::CommandConfig = plugin_configs.resolve("command").decode().unwrap();
    command.validate("command").unwrap();

    let valid: ferry_transform::ValidConfig = plugin_configs.resolve("valid").decode().unwrap();
    assert!(valid.reject_blank);
    assert_eq!(valid.max_size, 65536);

    let rabbitmq: ferry_sinks::RabbitmqConfig =
        plugin_configs.resolve("rabbitmq").decode().unwrap();
    rabbitmq.validate("rabbitmq").unwrap();
    assert_eq!(rabbitmq.routing_key, "ferry");
}

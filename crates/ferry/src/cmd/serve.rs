//! Serve command - Run the agent
//!
//! Loads configuration, wires the built-in plugins into an [`Agent`],
//! serves the admin API and waits for a signal.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Args;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use ferry_api::{ApiServer, AppState};
use ferry_config::{Config, LogLevel};
use ferry_pipeline::{Agent, AgentOptions};

use crate::plugins::default_registry;

/// Config files tried in order when `--config` is not given
const DEFAULT_CONFIG_PATHS: [&str; 2] = ["configs/ferry.toml", "ferry.toml"];

/// Serve command arguments
///
/// Every flag is global so it can be given with or without the `serve`
/// subcommand.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Input plugin name. Overrides config file.
    #[arg(long, global = true)]
    pub input: Option<String>,

    /// Filter plugin name. Overrides config file.
    #[arg(long, global = true)]
    pub filter: Option<String>,

    /// Output plugin name. Overrides config file.
    #[arg(long, global = true)]
    pub output: Option<String>,

    /// Admin API address as host:port. Overrides config file.
    #[arg(long, global = true)]
    pub http_address: Option<String>,
}

/// Configuration ready to run, with the file it came from
#[derive(Debug)]
pub struct Loaded {
    pub config: Config,
    pub source: Option<PathBuf>,
}

/// Resolve the config file and apply command-line overrides
///
/// Runs before logging is initialised, since the `[log]` section decides
/// where logs go.
pub fn load(args: &ServeArgs) -> Result<Loaded> {
    let candidates: Vec<PathBuf> = DEFAULT_CONFIG_PATHS.iter().map(PathBuf::from).collect();
    let (mut config, source) = resolve_config(args.config.as_deref(), &candidates)?;
    apply_overrides(&mut config, args)?;
    Ok(Loaded { config, source })
}

fn resolve_config(
    explicit: Option<&Path>,
    candidates: &[PathBuf],
) -> Result<(Config, Option<PathBuf>)> {
    if let Some(path) = explicit {
        // User explicitly provided config path - must exist
        if !path.exists() {
            bail!("config file not found: {}", path.display());
        }
        return Ok((read_config(path)?, Some(path.to_path_buf())));
    }

    for path in candidates {
        if path.exists() {
            return Ok((read_config(path)?, Some(path.clone())));
        }
    }

    Ok((Config::default(), None))
}

fn read_config(path: &Path) -> Result<Config> {
    Config::from_file(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

fn apply_overrides(config: &mut Config, args: &ServeArgs) -> Result<()> {
    if let Some(level) = args.log_level {
        config.log.level = level;
    }
    if let Some(input) = &args.input {
        config.pipeline.input = input.clone();
    }
    if let Some(filter) = &args.filter {
        config.pipeline.filter = filter.clone();
    }
    if let Some(output) = &args.output {
        config.pipeline.output = output.clone();
    }
    if let Some(addr) = &args.http_address {
        if !config.api_server.set_address(addr) {
            bail!("invalid --http-address '{addr}': expected host:port");
        }
        config.api_server.enabled = true;
    }

    config.validate().context("invalid configuration")
}

/// Run the serve command
pub async fn run(loaded: Loaded) -> Result<()> {
    let Loaded { config, source } = loaded;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        config = %source.as_deref().map_or_else(|| "(defaults)".into(), |p| p.display().to_string()),
        "ferry starting"
    );

    if let Err(e) = run_agent(config).await {
        error!(error = %e, "agent error");
        return Err(e);
    }

    info!("ferry shutdown complete");
    Ok(())
}

/// Bootstrap, block until a shutdown trigger, then tear down
async fn run_agent(config: Config) -> Result<()> {
    let plugin_configs = config
        .load_plugin_configs()
        .context("failed to load plugin configs")?;
    if !plugin_configs.is_empty() {
        info!(plugins = ?plugin_configs.names(), "plugin configs loaded");
    }

    let agent = Arc::new(Agent::new(
        AgentOptions::from_config(&config),
        default_registry(),
        plugin_configs,
    ));
    let cancel = CancellationToken::new();

    let api = if config.api_server.enabled {
        let state = AppState::new(Arc::clone(&agent));
        let server = ApiServer::bind(&config.api_server, state, cancel.clone())
            .await
            .context("failed to start API server")?;
        Some(server)
    } else {
        info!("API server disabled");
        None
    };

    if let Err(e) = agent.start().await {
        // Reap the stages that did start
        if let Err(shutdown_err) = agent.shutdown().await {
            warn!(error = %shutdown_err, "cleanup after failed start");
        }
        cancel.cancel();
        stop_api(api).await;
        return Err(e).context("failed to start pipeline");
    }

    let hangup = spawn_refresh_on_hangup(Arc::clone(&agent), cancel.clone());

    info!(
        input = %config.pipeline.input,
        filter = %config.pipeline.filter,
        output = %config.pipeline.output,
        "ferry running"
    );

    let reason = wait_for_shutdown(&agent, config.agent.shutdown_on_input_exit).await;
    info!(reason, "shutdown signal received");

    let result = agent.shutdown().await.context("pipeline shutdown failed");

    cancel.cancel();
    stop_api(api).await;
    if let Some(handle) = hangup {
        let _ = handle.await;
    }

    result
}

async fn stop_api(api: Option<ApiServer>) {
    if let Some(server) = api {
        server.join().await;
        info!("API server stopped");
    }
}

/// Refresh every plugin on SIGHUP until `cancel` fires
#[cfg(unix)]
fn spawn_refresh_on_hangup(agent: Arc<Agent>, cancel: CancellationToken) -> Option<JoinHandle<()>> {
    let mut sig = match signal::unix::signal(signal::unix::SignalKind::hangup()) {
        Ok(sig) => sig,
        Err(e) => {
            warn!(error = %e, "failed to install SIGHUP handler, refresh disabled");
            return None;
        }
    };
    info!("SIGHUP handler installed for plugin refresh");

    Some(tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                received = sig.recv() => {
                    if received.is_none() {
                        break;
                    }
                    info!("SIGHUP: refreshing plugins");
                    agent.refresh();
                }
            }
        }
    }))
}

#[cfg(not(unix))]
fn spawn_refresh_on_hangup(_agent: Arc<Agent>, _cancel: CancellationToken) -> Option<JoinHandle<()>> {
    None
}

/// Wait for SIGINT, SIGTERM, or the input returning when opted in
async fn wait_for_shutdown(agent: &Agent, on_input_exit: bool) -> &'static str {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let input_exit = async {
        if on_input_exit {
            agent.input_finished().await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
        _ = input_exit => "input finished",
    }
}

#[cfg(test)]
#[path = "serve_test.rs"]
mod tests;

//! Command Sink - Runs each packet as a shell command
//!
//! Payloads are executed one after another through the configured shell
//! (`sh -c` by default). A command that outlives `timeout` is killed.
//! Failures are logged and never reach the pipeline.
//!
//! ```toml
//! "@pluginName" = "command"
//! shell = ["bash", "-c"]
//! timeout = "10s"
//! ```

use std::process::Stdio;
use std::time::Duration;

use ferry_config::ConfigError;
use ferry_pipeline::{Output, Packet, PipelineContext, PluginResult, async_trait};
use parking_lot::RwLock;
use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;

#[cfg(test)]
#[path = "command_test.rs"]
mod tests;

/// Registered name
pub const NAME: &str = "command";

/// Options for the `command` output
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CommandConfig {
    /// Program and leading arguments; the payload is appended
    /// Default: ["sh", "-c"]
    pub shell: Vec<String>,

    /// Per-command time limit
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            shell: vec!["sh".into(), "-c".into()],
            timeout: Duration::from_secs(30),
        }
    }
}

impl CommandConfig {
    /// Set the time limit
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check the options
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if self.shell.first().is_none_or(|program| program.trim().is_empty()) {
            return Err(ConfigError::missing_field("output", name, "shell"));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::invalid_value(
                "output",
                name,
                "timeout",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Why a command did not succeed
#[derive(Debug, Error)]
pub enum CommandError {
    /// The shell could not be started
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The command ran past its time limit and was killed
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The command exited unsuccessfully
    #[error("exited with {status}: {stderr}")]
    Failed {
        /// Exit status
        status: std::process::ExitStatus,
        /// Captured standard error
        stderr: String,
    },
}

/// Run one script through the configured shell, returning its stdout
pub async fn run_script(config: &CommandConfig, script: &str) -> Result<String, CommandError> {
    let (program, args) = match config.shell.split_first() {
        Some((program, args)) => (program.as_str(), args),
        None => ("sh", &[][..]),
    };

    let child = Command::new(program)
        .args(args)
        .arg(script)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?;

    // dropping the wait future on timeout kills the child
    let output = match tokio::time::timeout(config.timeout, child.wait_with_output()).await {
        Ok(output) => output.map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?,
        Err(_) => return Err(CommandError::Timeout(config.timeout)),
    };

    if !output.status.success() {
        return Err(CommandError::Failed {
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Executes payloads as shell commands
#[derive(Debug, Default)]
pub struct CommandOutput {
    config: RwLock<CommandConfig>,
}

impl CommandOutput {
    /// Output with default options
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Output for CommandOutput {
    async fn bind(&self, ctx: &PipelineContext) -> PluginResult<()> {
        let config: CommandConfig = ctx.decode_config()?;
        config.validate(ctx.name())?;

        tracing::info!(
            parent: ctx.span(),
            shell = ?config.shell,
            timeout = ?config.timeout,
            "command output bound"
        );
        *self.config.write() = config;
        Ok(())
    }

    async fn write(&self, batch: &[Packet]) {
        let config = self.config.read().clone();

        for packet in batch {
            let script = packet.as_str_lossy();
            let script = script.trim();
            if script.is_empty() {
                continue;
            }

            tracing::info!(command = script, "command start");
            match run_script(&config, script).await {
                Ok(stdout) => {
                    tracing::info!(command = script, output = stdout.trim_end(), "command end");
                }
                Err(e) => tracing::error!(command = script, error = %e, "command failed"),
            }
        }
    }
}

//! Stdout Sink - Prints every packet
//!
//! Debug output; not intended for high throughput.
//!
//! # Example Output
//!
//! ```text
//! # format = "text" (default)
//! output : {"level":"info","msg":"started"}
//! output : disk usage 81%
//!
//! # format = "json", one line per batch
//! [{"data":"{\"level\":\"info\",\"msg\":\"started\"}"},{"data":"disk usage 81%"}]
//! ```

use std::io::Write;

use ferry_pipeline::{Output, Packet, PipelineContext, PluginResult, async_trait};
use owo_colors::OwoColorize;
use parking_lot::RwLock;
use serde::Deserialize;

#[cfg(test)]
#[path = "stdout_test.rs"]
mod tests;

/// Registered name
pub const NAME: &str = "stdout";

/// Default line prefix in text mode
pub const DEFAULT_PREFIX: &str = "output : ";

/// Output layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StdoutFormat {
    /// One line per packet
    #[default]
    Text,
    /// One JSON array per batch
    Json,
}

/// Options for the `stdout` output
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StdoutConfig {
    /// Output layout
    /// Default: text
    pub format: StdoutFormat,

    /// Text printed before each packet in text mode
    /// Default: "output : "
    pub prefix: String,

    /// Dim the prefix
    /// Default: false
    pub color: bool,
}

impl Default for StdoutConfig {
    fn default() -> Self {
        Self {
            format: StdoutFormat::Text,
            prefix: DEFAULT_PREFIX.into(),
            color: false,
        }
    }
}

impl StdoutConfig {
    /// JSON batches
    pub fn json() -> Self {
        Self {
            format: StdoutFormat::Json,
            ..Self::default()
        }
    }

    /// Text lines with a custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// Render a batch as it will be printed, trailing newline included
    pub fn render(&self, batch: &[Packet]) -> String {
        match self.format {
            StdoutFormat::Text => {
                let prefix = if self.color {
                    self.prefix.dimmed().to_string()
                } else {
                    self.prefix.clone()
                };
                let mut out = String::new();
                for packet in batch {
                    out.push_str(&prefix);
                    out.push_str(&packet.as_str_lossy());
                    out.push('\n');
                }
                out
            }
            StdoutFormat::Json => match serde_json::to_string(batch) {
                Ok(mut out) => {
                    out.push('\n');
                    out
                }
                Err(e) => {
                    tracing::debug!(error = %e, "json rendering failed");
                    String::new()
                }
            },
        }
    }
}

/// Prints batches to standard output
#[derive(Debug, Default)]
pub struct StdoutOutput {
    config: RwLock<StdoutConfig>,
}

impl StdoutOutput {
    /// Output with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Output with explicit options
    pub fn with_config(config: StdoutConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }
}

#[async_trait]
impl Output for StdoutOutput {
    async fn bind(&self, ctx: &PipelineContext) -> PluginResult<()> {
        let config: StdoutConfig = ctx.decode_config()?;
        tracing::debug!(parent: ctx.span(), format = ?config.format, "stdout output bound");
        *self.config.write() = config;
        Ok(())
    }

    async fn write(&self, batch: &[Packet]) {
        if batch.is_empty() {
            return;
        }

        let rendered = self.config.read().render(batch);
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = stdout
            .write_all(rendered.as_bytes())
            .and_then(|()| stdout.flush())
        {
            tracing::debug!(error = %e, "stdout write failed");
        }
    }
}

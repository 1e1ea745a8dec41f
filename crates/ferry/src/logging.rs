//! Logging setup
//!
//! Builds the global `tracing` subscriber from the `[log]` section.

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use anyhow::{Context, Result};
use ferry_config::{LogConfig, LogFormat, LogOutput};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber
pub fn init(config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(config.level.as_str()).or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::registry()
        .with(build_layer(config)?)
        .with(filter)
        .try_init()
        .context("failed to install log subscriber")
}

/// Formatting layer for the configured format and destination
fn build_layer(config: &LogConfig) -> Result<BoxedLayer> {
    let ansi = config.output.is_stream();
    let layer = match &config.output {
        LogOutput::Stdout => fmt_layer(config.format, io::stdout, ansi),
        LogOutput::Stderr => fmt_layer(config.format, io::stderr, ansi),
        LogOutput::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            fmt_layer(config.format, Mutex::new(file), ansi)
        }
    };
    Ok(layer)
}

fn fmt_layer<W>(format: LogFormat, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Console => fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
    }
}

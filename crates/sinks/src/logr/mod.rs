//! Logr Sink - Appends packets to a rotating file
//!
//! # Features
//!
//! - **Size limit**: rotate or truncate once `max_size` is reached
//! - **Daily rotation**: optionally act when the local date changes
//! - **Optional LZ4**: rotated files compressed to `<name>.lz4`
//! - **Refresh**: `refresh()` reopens the file after external rotation
//!
//! # File Names
//!
//! ```text
//! /tmp/dump.log            # current file
//! /tmp/dump.log.2025-03    # rotated
//! /tmp/dump.log.2025-03.1  # rotated again in the same period
//! /tmp/dump.2025-03.log    # with time_format_as_prefix
//! ```
//!
//! File I/O runs on the blocking pool; a batch is written and flushed as
//! one unit.

mod config;
mod rotator;

use std::sync::Arc;

use ferry_pipeline::{
    Bytes, Output, Packet, PipelineContext, PluginError, PluginResult, async_trait,
};
use parking_lot::Mutex;

pub use config::{DEFAULT_MAX_SIZE, DEFAULT_PATH, DEFAULT_TIME_FORMAT, LogrConfig, OnLimit};
pub use rotator::{COMPRESSED_EXTENSION, RotatingWriter};

#[cfg(test)]
#[path = "logr_test.rs"]
mod tests;

/// Registered name
pub const NAME: &str = "logr";

/// Appends every packet to a file
#[derive(Debug, Default)]
pub struct LogrOutput {
    writer: Arc<Mutex<Option<RotatingWriter>>>,
}

impl LogrOutput {
    /// Create the output; the file is opened at bind
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the writer directly, bypassing `bind`
    pub fn open(config: LogrConfig) -> std::io::Result<Self> {
        let writer = RotatingWriter::open(config)?;
        Ok(Self {
            writer: Arc::new(Mutex::new(Some(writer))),
        })
    }
}

#[async_trait]
impl Output for LogrOutput {
    async fn bind(&self, ctx: &PipelineContext) -> PluginResult<()> {
        let config: LogrConfig = ctx.decode_config()?;
        config.validate(ctx.name())?;

        let path = config.path.clone();
        let writer = RotatingWriter::open(config)
            .map_err(|e| PluginError::io(format!("opening {}", path.display()), e))?;

        tracing::info!(
            parent: ctx.span(),
            path = %path.display(),
            size = writer.size(),
            "logr output bound"
        );
        *self.writer.lock() = Some(writer);
        Ok(())
    }

    async fn write(&self, batch: &[Packet]) {
        if batch.is_empty() {
            return;
        }

        let payloads: Vec<Bytes> = batch.iter().map(|p| p.data().clone()).collect();
        let writer = Arc::clone(&self.writer);

        let written = tokio::task::spawn_blocking(move || {
            let mut guard = writer.lock();
            let Some(writer) = guard.as_mut() else {
                tracing::warn!("logr output written before bind, batch dropped");
                return;
            };

            for payload in &payloads {
                match writer.write_record(payload) {
                    Ok(Some(rotated)) => {
                        tracing::info!(rotated = %rotated.display(), "log file rotated");
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::error!(path = %writer.path().display(), error = %e, "logr write failed");
                        break;
                    }
                }
            }
            if let Err(e) = writer.flush() {
                tracing::error!(path = %writer.path().display(), error = %e, "logr flush failed");
            }
        })
        .await;

        if let Err(e) = written {
            tracing::error!(error = %e, "logr writer task failed");
        }
    }

    fn refresh(&self) {
        if let Some(writer) = self.writer.lock().as_mut() {
            match writer.reopen() {
                Ok(()) => tracing::info!(path = %writer.path().display(), "log file reopened"),
                Err(e) => {
                    tracing::error!(path = %writer.path().display(), error = %e, "log file reopen failed");
                }
            }
        }
    }
}

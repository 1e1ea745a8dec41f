//! Stdin Input - One payload per line of standard input
//!
//! Returns on EOF, so a piped run such as `cat events.log | ferry` ends
//! with the input finished while the rest of the pipeline keeps draining.
//!
//! Line endings (`\n` or `\r\n`) are stripped. Empty lines are emitted as
//! empty payloads and left to the filter.
//!
//! # Reader thread
//!
//! A blocking read on standard input cannot be interrupted. Lines are read
//! on a detached OS thread and forwarded over a bounded channel, so
//! cancellation returns immediately and the runtime can shut down while the
//! thread is still parked in `read`.
//!
//! ```text
//!  stdin ──→ [ferry-stdin thread] ──→ flume(LINE_BACKLOG) ──→ read_lines ──→ ingest queue
//! ```

use std::io::{self, BufRead, BufReader};
use std::thread;

use ferry_pipeline::{Bytes, Input, PipelineContext, PluginError, PluginResult, async_trait};

use crate::common::trim_line_ending;

#[cfg(test)]
#[path = "stdin_test.rs"]
mod tests;

/// Registered name
pub const NAME: &str = "stdin";

/// Initial capacity of the line buffer
const LINE_CAPACITY: usize = 4096;

/// Lines buffered between the reader thread and the pipeline
const LINE_BACKLOG: usize = 64;

/// Reads standard input line by line
#[derive(Debug, Default)]
pub struct StdinInput;

impl StdinInput {
    /// Create the input
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Input for StdinInput {
    async fn bind(&self, ctx: &PipelineContext) -> PluginResult<()> {
        // no options; reject typos early
        ctx.decode_config::<NoOptions>()?;
        Ok(())
    }

    async fn run(&self, ctx: &PipelineContext) -> PluginResult<()> {
        let lines = spawn_line_reader(BufReader::new(io::stdin()))
            .map_err(|e| PluginError::io("spawning stdin reader", e))?;
        read_lines(lines, ctx).await
    }
}

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct NoOptions {}

/// Lines produced by [`spawn_line_reader`]; the channel closes on EOF
pub type LineReceiver = flume::Receiver<io::Result<Bytes>>;

/// Read `reader` line by line on a detached thread
///
/// The thread exits on EOF, on a read error (forwarded as the last
/// message), or once the receiver has been dropped and the next line
/// arrives.
pub fn spawn_line_reader<R>(mut reader: R) -> io::Result<LineReceiver>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = flume::bounded(LINE_BACKLOG);

    thread::Builder::new()
        .name("ferry-stdin".into())
        .spawn(move || {
            let mut buf = Vec::with_capacity(LINE_CAPACITY);
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf) {
                    Ok(0) => break,
                    Ok(_) => {
                        let line = Bytes::copy_from_slice(trim_line_ending(&buf));
                        if tx.send(Ok(line)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e));
                        break;
                    }
                }
            }
        })?;

    Ok(rx)
}

/// Emit every line from `lines` until EOF or cancellation
pub async fn read_lines(lines: LineReceiver, ctx: &PipelineContext) -> PluginResult<()> {
    let mut count = 0u64;

    loop {
        let next = tokio::select! {
            biased;
            _ = ctx.cancelled() => break,
            next = lines.recv_async() => next,
        };

        let line = match next {
            Ok(Ok(line)) => line,
            Ok(Err(e)) => return Err(PluginError::io("reading stdin", e)),
            Err(flume::RecvError::Disconnected) => {
                tracing::debug!(parent: ctx.span(), lines = count, "stdin reached EOF");
                break;
            }
        };

        if ctx.emit(line).await.is_err() {
            break;
        }
        count += 1;
    }

    Ok(())
}

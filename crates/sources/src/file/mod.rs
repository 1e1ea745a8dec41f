//! File Input - Polling tail with offset persistence
//!
//! Each configured file is checked every `poll_interval`. New complete
//! lines are emitted one payload per line; a trailing partial line is held
//! until its newline arrives.
//!
//! # Rotation
//!
//! ```text
//! size < offset        → truncated, read again from 0
//! inode changed        → replaced, reopen and read from 0
//! file missing         → wait; when it reappears read from 0
//! ```
//!
//! Offsets of the last complete line are kept in a [`SinceDb`], written
//! every `sincedb_write_interval` when changed and once more on exit.
//! Files present at startup without a stored offset start at
//! `start_position`; files that appear later are read from the beginning.

mod config;
mod sincedb;

use std::io::{self, SeekFrom};
use std::path::PathBuf;

use ferry_pipeline::{Bytes, Input, PipelineContext, PluginError, PluginResult, async_trait};
use parking_lot::Mutex;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::time::{MissedTickBehavior, interval};

use crate::common::trim_line_ending;

pub use config::{DEFAULT_SINCEDB_PATH, FileConfig, StartPosition};
pub use sincedb::{SinceDb, SinceEntry};

#[cfg(test)]
#[path = "file_test.rs"]
mod tests;

/// Registered name
pub const NAME: &str = "file";

/// Bytes read per syscall
const READ_CHUNK: usize = 64 * 1024;

/// Tails files listed in its options
#[derive(Debug, Default)]
pub struct FileInput {
    bound: Mutex<Option<Bound>>,
}

#[derive(Debug)]
struct Bound {
    config: FileConfig,
    sincedb: SinceDb,
}

impl FileInput {
    /// Create the input; options are read at bind
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Input for FileInput {
    async fn bind(&self, ctx: &PipelineContext) -> PluginResult<()> {
        let config: FileConfig = ctx.decode_config()?;
        config.validate(ctx.name())?;

        let sincedb = match config.sincedb() {
            Some(path) => SinceDb::load(path.clone())
                .await
                .map_err(|e| PluginError::io(format!("loading sincedb {}", path.display()), e))?,
            None => SinceDb::disabled(),
        };

        tracing::info!(
            parent: ctx.span(),
            files = ?config.files(),
            start_position = ?config.start_position,
            sincedb = sincedb.is_enabled(),
            "file input bound"
        );
        *self.bound.lock() = Some(Bound { config, sincedb });
        Ok(())
    }

    async fn run(&self, ctx: &PipelineContext) -> PluginResult<()> {
        let bound = self.bound.lock().take();
        let Some(Bound {
            config,
            mut sincedb,
        }) = bound
        else {
            return Err(PluginError::runtime("file input run before bind"));
        };

        let mut tails: Vec<Tail> = config
            .files()
            .into_iter()
            .map(|path| {
                let resume = sincedb.offset(&path);
                Tail::new(path, resume)
            })
            .collect();

        let mut poll = interval(config.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut flush = interval(config.sincedb_write_interval);
        flush.set_missed_tick_behavior(MissedTickBehavior::Skip);

        'outer: loop {
            tokio::select! {
                biased;

                _ = ctx.cancelled() => break,

                _ = poll.tick() => {
                    for tail in &mut tails {
                        let open = match tail.poll(ctx, config.start_position).await {
                            Ok(open) => open,
                            Err(e) => {
                                tracing::warn!(
                                    parent: ctx.span(),
                                    path = %tail.path.display(),
                                    error = %e,
                                    "file read failed"
                                );
                                true
                            }
                        };
                        if tail.seen {
                            sincedb.set_offset(&tail.path, tail.committed());
                        }
                        if !open {
                            break 'outer;
                        }
                    }
                }

                _ = flush.tick() => save(&mut sincedb, ctx).await,
            }
        }

        save(&mut sincedb, ctx).await;
        Ok(())
    }
}

async fn save(sincedb: &mut SinceDb, ctx: &PipelineContext) {
    if let Err(e) = sincedb.save().await {
        tracing::warn!(parent: ctx.span(), error = %e, "sincedb write failed");
    }
}

/// Read position in one file
#[derive(Debug)]
struct Tail {
    path: PathBuf,
    file: Option<File>,
    inode: Option<u64>,
    /// Bytes consumed from the file, including `partial`
    offset: u64,
    /// Trailing bytes without a newline yet
    partial: Vec<u8>,
    /// Stored offset to use on first contact
    resume: Option<u64>,
    seen: bool,
}

impl Tail {
    fn new(path: PathBuf, resume: Option<u64>) -> Self {
        Self {
            path,
            file: None,
            inode: None,
            offset: 0,
            partial: Vec::new(),
            resume,
            seen: false,
        }
    }

    /// Offset just past the last complete line
    fn committed(&self) -> u64 {
        self.offset - self.partial.len() as u64
    }

    fn reset(&mut self, inode: Option<u64>) {
        self.file = None;
        self.inode = inode;
        self.offset = 0;
        self.partial.clear();
    }

    /// Emit whatever was appended since the last poll
    ///
    /// Returns `false` once the pipeline stops accepting payloads.
    async fn poll(&mut self, ctx: &PipelineContext, start: StartPosition) -> io::Result<bool> {
        let meta = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if self.file.is_some() {
                    tracing::info!(parent: ctx.span(), path = %self.path.display(), "file removed");
                }
                self.seen = true;
                self.resume = None;
                self.reset(None);
                return Ok(true);
            }
            Err(e) => return Err(e),
        };
        let inode = inode_of(&meta);
        let len = meta.len();

        if !self.seen {
            self.seen = true;
            self.inode = inode;
            self.offset = match self.resume.take() {
                Some(offset) => offset,
                None if start == StartPosition::Beginning => 0,
                None => len,
            };
        } else if self.inode != inode {
            tracing::info!(parent: ctx.span(), path = %self.path.display(), "file replaced");
            self.reset(inode);
        }

        if len < self.offset {
            tracing::info!(
                parent: ctx.span(),
                path = %self.path.display(),
                offset = self.offset,
                len,
                "file truncated"
            );
            self.reset(inode);
        }
        if len == self.offset {
            return Ok(true);
        }

        let mut file = match self.file.take() {
            Some(file) => file,
            None => File::open(&self.path).await?,
        };
        file.seek(SeekFrom::Start(self.offset)).await?;

        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            let n = file.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            self.offset += n as u64;
            self.partial.extend_from_slice(&chunk[..n]);
            if !self.emit_lines(ctx).await {
                return Ok(false);
            }
        }

        self.file = Some(file);
        Ok(true)
    }

    /// Emit complete lines from `partial`, keeping the remainder
    async fn emit_lines(&mut self, ctx: &PipelineContext) -> bool {
        let mut start = 0;
        let mut open = true;

        while let Some(pos) = self.partial[start..].iter().position(|&b| b == b'\n') {
            let end = start + pos + 1;
            let line = Bytes::copy_from_slice(trim_line_ending(&self.partial[start..end]));
            if ctx.emit(line).await.is_err() {
                open = false;
                break;
            }
            start = end;
        }

        self.partial.drain(..start);
        open
    }
}

#[cfg(unix)]
fn inode_of(meta: &std::fs::Metadata) -> Option<u64> {
    use std::os::unix::fs::MetadataExt;
    Some(meta.ino())
}

#[cfg(not(unix))]
fn inode_of(_meta: &std::fs::Metadata) -> Option<u64> {
    None
}

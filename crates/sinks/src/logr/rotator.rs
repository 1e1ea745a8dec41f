//! Size- and date-triggered file rotation
//!
//! ```text
//! write ──→ limit reached? ──no──→ append
//!               │yes
//!               ├─ truncate: set_len(0), append
//!               └─ rotate:   rename dump.log → dump.log.2025-03[.N]
//!                            compress → dump.log.2025-03.lz4 (optional)
//!                            reopen dump.log, append
//! ```
//!
//! The stamp comes from the start of the current period: midnight of the
//! file's last modification when opened, midnight of the rotation after.

use std::fmt::Write as _;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use lz4_flex::frame::FrameEncoder;

use super::config::{LogrConfig, OnLimit};

/// Write buffer per open file
const BUFFER_SIZE: usize = 64 * 1024;

/// Extension appended to compressed files
pub const COMPRESSED_EXTENSION: &str = "lz4";

/// Appending writer that rotates or truncates its file
#[derive(Debug)]
pub struct RotatingWriter {
    path: PathBuf,
    config: LogrConfig,
    file: BufWriter<File>,
    size: u64,
    period_start: DateTime<Local>,
}

impl RotatingWriter {
    /// Open `config.path` for appending, creating parent directories
    pub fn open(config: LogrConfig) -> io::Result<Self> {
        let path = config.path.clone();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let (file, size, modified) = open_append(&path)?;
        Ok(Self {
            path,
            config,
            file,
            size,
            period_start: midnight(modified),
        })
    }

    /// Path being written
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes in the current file
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Append one record, rotating first if a limit was reached
    ///
    /// Returns the rotated file when a rotation happened.
    pub fn write_record(&mut self, data: &[u8]) -> io::Result<Option<PathBuf>> {
        self.write_record_at(data, Local::now())
    }

    pub(crate) fn write_record_at(
        &mut self,
        data: &[u8],
        now: DateTime<Local>,
    ) -> io::Result<Option<PathBuf>> {
        let rotated = if self.limit_reached(now) {
            match self.config.on_limit {
                OnLimit::Rotate => Some(self.rotate(now)?),
                OnLimit::Truncate => {
                    self.truncate(now)?;
                    None
                }
            }
        } else {
            None
        };

        self.file.write_all(data)?;
        self.size += data.len() as u64;
        if self.config.newline {
            self.file.write_all(b"\n")?;
            self.size += 1;
        }
        Ok(rotated)
    }

    fn limit_reached(&self, now: DateTime<Local>) -> bool {
        let full = self.config.max_size > 0 && self.size >= self.config.max_size;
        let new_day =
            self.config.rotate_daily && now.date_naive() > self.period_start.date_naive();
        full || new_day
    }

    /// Flush buffered records to the file
    pub fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }

    /// Empty the current file in place
    pub fn truncate(&mut self, now: DateTime<Local>) -> io::Result<()> {
        self.file.flush()?;
        self.file.get_ref().set_len(0)?;
        self.size = 0;
        self.period_start = midnight(now);
        Ok(())
    }

    /// Move the current file aside and start a new one
    ///
    /// Returns the final name of the rotated file.
    pub fn rotate(&mut self, now: DateTime<Local>) -> io::Result<PathBuf> {
        self.file.flush()?;

        let dest = self.unused_name(&rotated_name(&self.path, self.period_start, &self.config)?);
        fs::rename(&self.path, &dest)?;
        let (file, size, _) = open_append(&self.path)?;
        self.file = file;
        self.size = size;
        self.period_start = midnight(now);

        if self.config.compress {
            return compress_file(&dest);
        }
        Ok(dest)
    }

    /// Reopen the file, e.g. after it was moved by another tool
    pub fn reopen(&mut self) -> io::Result<()> {
        self.file.flush()?;
        let (file, size, _) = open_append(&self.path)?;
        self.file = file;
        self.size = size;
        Ok(())
    }

    /// First of `name`, `name.1`, `name.2`, ... not taken on disk
    fn unused_name(&self, name: &Path) -> PathBuf {
        let taken = |candidate: &Path| {
            candidate.exists()
                || (self.config.compress && with_suffix(candidate, COMPRESSED_EXTENSION).exists())
        };

        if !taken(name) {
            return name.to_path_buf();
        }
        let mut n = 1u32;
        loop {
            let candidate = with_suffix(name, &n.to_string());
            if !taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

impl Drop for RotatingWriter {
    fn drop(&mut self) {
        let _ = self.file.flush();
    }
}

fn open_append(path: &Path) -> io::Result<(BufWriter<File>, u64, DateTime<Local>)> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let meta = file.metadata()?;
    let modified = meta.modified().map(DateTime::<Local>::from).unwrap_or_else(|_| Local::now());
    Ok((BufWriter::with_capacity(BUFFER_SIZE, file), meta.len(), modified))
}

fn midnight(t: DateTime<Local>) -> DateTime<Local> {
    t.date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|m| m.and_local_timezone(Local).earliest())
        .unwrap_or(t)
}

/// `name.ext` → `name.ext.<stamp>`, or `name.<stamp>.ext` as a prefix
pub(crate) fn rotated_name(
    path: &Path,
    period_start: DateTime<Local>,
    config: &LogrConfig,
) -> io::Result<PathBuf> {
    let mut stamp = String::new();
    write!(stamp, "{}", period_start.format(&config.time_format)).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("cannot format date with '{}'", config.time_format),
        )
    })?;

    if config.time_format_as_prefix
        && let (Some(stem), Some(ext)) = (path.file_stem(), path.extension())
    {
        let mut file_name = stem.to_os_string();
        file_name.push(".");
        file_name.push(&stamp);
        file_name.push(".");
        file_name.push(ext);
        return Ok(path.with_file_name(file_name));
    }

    Ok(with_suffix(path, &stamp))
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Compress `src` into `src.lz4` and remove the original
fn compress_file(src: &Path) -> io::Result<PathBuf> {
    let dest = with_suffix(src, COMPRESSED_EXTENSION);

    let mut input = File::open(src)?;
    let output = BufWriter::with_capacity(BUFFER_SIZE, File::create(&dest)?);
    let mut encoder = FrameEncoder::new(output);
    io::copy(&mut input, &mut encoder)?;
    encoder.finish().map_err(io::Error::other)?.flush()?;

    fs::remove_file(src)?;
    Ok(dest)
}

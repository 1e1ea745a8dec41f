//! Offset store for the file input
//!
//! A small JSON document mapping each tailed path to the offset of the
//! last complete line emitted:
//!
//! ```json
//! { "/var/log/app.log": { "offset": 18342 } }
//! ```
//!
//! Writes go to a temporary sibling first and are renamed into place.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Stored position of one file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinceEntry {
    /// Byte offset after the last emitted line
    pub offset: u64,
}

/// Persistent path-to-offset map
#[derive(Debug, Default)]
pub struct SinceDb {
    path: Option<PathBuf>,
    entries: BTreeMap<String, SinceEntry>,
    dirty: bool,
}

impl SinceDb {
    /// In-memory store that never touches disk
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Load the store at `path`
    ///
    /// A missing file yields an empty store. An unreadable document is
    /// logged and replaced on the next save.
    pub async fn load(path: PathBuf) -> io::Result<Self> {
        let entries = match tokio::fs::read(&path).await {
            Ok(raw) => match serde_json::from_slice(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt sincedb");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e),
        };

        Ok(Self {
            path: Some(path),
            entries,
            dirty: false,
        })
    }

    /// Whether offsets are persisted
    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    /// Stored offset for `file`
    pub fn offset(&self, file: &Path) -> Option<u64> {
        self.entries.get(&key(file)).map(|entry| entry.offset)
    }

    /// Record the offset for `file`
    pub fn set_offset(&mut self, file: &Path, offset: u64) {
        let entry = self.entries.entry(key(file)).or_default();
        if entry.offset != offset {
            entry.offset = offset;
            self.dirty = true;
        }
    }

    /// Whether there are unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of tracked files
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no file is tracked
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the store if anything changed since the last save
    pub async fn save(&mut self) -> io::Result<()> {
        let Some(path) = &self.path else {
            self.dirty = false;
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }

        let json = serde_json::to_vec_pretty(&self.entries).map_err(io::Error::other)?;
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        self.dirty = false;
        Ok(())
    }
}

fn key(file: &Path) -> String {
    file.to_string_lossy().into_owned()
}

//! File input configuration

use std::path::PathBuf;
use std::time::Duration;

use ferry_config::ConfigError;
use serde::Deserialize;

/// Default offset store location
pub const DEFAULT_SINCEDB_PATH: &str = "/tmp/sincedb.json";

/// Where to start reading a file seen for the first time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartPosition {
    /// Read existing content
    Beginning,
    /// Only read content appended after startup
    #[default]
    End,
}

/// Options for the `file` input
///
/// ```toml
/// "@pluginName" = "file"
/// paths = ["/var/log/app.log", "/var/log/worker.log"]
/// start_position = "beginning"
/// sincedb_path = "/var/lib/ferry/sincedb.json"
/// sincedb_write_interval = "15s"
/// poll_interval = "1s"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Single file to tail
    pub path: Option<PathBuf>,

    /// Files to tail, in addition to `path`
    pub paths: Vec<PathBuf>,

    /// Start position for files without a stored offset
    /// Default: end
    pub start_position: StartPosition,

    /// Offset store; empty or `/dev/null` disables persistence
    /// Default: /tmp/sincedb.json
    pub sincedb_path: String,

    /// How often changed offsets are written
    /// Default: 15s
    #[serde(with = "humantime_serde")]
    pub sincedb_write_interval: Duration,

    /// How often files are checked for new data
    /// Default: 1s
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: None,
            paths: Vec::new(),
            start_position: StartPosition::End,
            sincedb_path: DEFAULT_SINCEDB_PATH.into(),
            sincedb_write_interval: Duration::from_secs(15),
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl FileConfig {
    /// Tail a single file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Every configured file, `path` first, without duplicates
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = Vec::with_capacity(self.paths.len() + 1);
        for path in self.path.iter().chain(&self.paths) {
            if !files.contains(path) {
                files.push(path.clone());
            }
        }
        files
    }

    /// Offset store path, if persistence is enabled
    pub fn sincedb(&self) -> Option<PathBuf> {
        match self.sincedb_path.trim() {
            "" | "/dev/null" => None,
            path => Some(PathBuf::from(path)),
        }
    }

    /// Check the options
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if self.files().is_empty() {
            return Err(ConfigError::missing_field("input", name, "path"));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::invalid_value(
                "input",
                name,
                "poll_interval",
                "must be greater than zero",
            ));
        }
        if self.sincedb().is_some() && self.sincedb_write_interval.is_zero() {
            return Err(ConfigError::invalid_value(
                "input",
                name,
                "sincedb_write_interval",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

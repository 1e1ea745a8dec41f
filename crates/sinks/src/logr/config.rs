//! Logr output configuration

use std::path::PathBuf;

use chrono::format::{Item, StrftimeItems};
use ferry_config::ConfigError;
use serde::Deserialize;

/// Default output file
pub const DEFAULT_PATH: &str = "/tmp/dump.log";

/// Default size limit (1 GiB)
pub const DEFAULT_MAX_SIZE: u64 = 1024 * 1024 * 1024;

/// Default date stamp of rotated files
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m";

/// What happens when the file reaches its limit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnLimit {
    /// Move the file aside and start a new one
    #[default]
    Rotate,
    /// Empty the file in place
    Truncate,
}

/// Options for the `logr` output
///
/// ```toml
/// "@pluginName" = "logr"
/// path = "/var/log/ferry/dump.log"
/// max_size = 104857600
/// rotate_daily = true
/// time_format = "%Y-%m-%d"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogrConfig {
    /// File to append to
    /// Default: /tmp/dump.log
    pub path: PathBuf,

    /// Terminate every packet with `\n`
    /// Default: true
    pub newline: bool,

    /// Size limit in bytes (0 = unlimited)
    /// Default: 1 GiB
    pub max_size: u64,

    /// Action taken at the size limit or day boundary
    /// Default: rotate
    pub on_limit: OnLimit,

    /// Also act when the local date changes
    /// Default: false
    pub rotate_daily: bool,

    /// LZ4-compress rotated files
    /// Default: true
    pub compress: bool,

    /// strftime pattern stamped on rotated files
    /// Default: %Y-%m
    pub time_format: String,

    /// Put the stamp before the extension (`dump.2025-03.log`)
    /// instead of after it (`dump.log.2025-03`)
    /// Default: false
    pub time_format_as_prefix: bool,
}

impl Default for LogrConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_PATH),
            newline: true,
            max_size: DEFAULT_MAX_SIZE,
            on_limit: OnLimit::Rotate,
            rotate_daily: false,
            compress: true,
            time_format: DEFAULT_TIME_FORMAT.into(),
            time_format_as_prefix: false,
        }
    }
}

impl LogrConfig {
    /// Append to `path`
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Set the size limit
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set the limit action
    pub fn with_on_limit(mut self, on_limit: OnLimit) -> Self {
        self.on_limit = on_limit;
        self
    }

    /// Enable or disable compression
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Check the options
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::missing_field("output", name, "path"));
        }
        if self.time_format.is_empty()
            || StrftimeItems::new(&self.time_format).any(|item| matches!(item, Item::Error))
        {
            return Err(ConfigError::invalid_value(
                "output",
                name,
                "time_format",
                format!("'{}' is not a valid strftime pattern", self.time_format),
            ));
        }
        if self.time_format.contains('/') {
            return Err(ConfigError::invalid_value(
                "output",
                name,
                "time_format",
                "must not contain '/'",
            ));
        }
        Ok(())
    }
}

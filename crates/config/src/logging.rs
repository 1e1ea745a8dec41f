//! `[log]` section
//!
//! Where ferry writes its own diagnostics and how much of them. The level
//! can also come from `--log-level`, which parses through [`LogLevel`]'s
//! `FromStr` and replaces the file value.
//!
//! The `stdout` output plugin writes packets to the process stdout, so a
//! pipeline using it should send diagnostics to `stderr` or a file:
//!
//! ```toml
//! [log]
//! level = "debug"
//! format = "json"
//! output = "/var/log/ferry/agent.log"
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

/// Minimum severity that is written
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Per-item detail, including queue and batch activity
    Trace,
    /// Plugin setup and option decoding
    Debug,
    /// Lifecycle milestones
    #[default]
    Info,
    /// Dropped items and recoverable plugin failures
    Warn,
    /// Failures that stop a stage
    Error,
}

impl LogLevel {
    /// Every level, most verbose first
    pub const ALL: [LogLevel; 5] = [
        Self::Trace,
        Self::Debug,
        Self::Info,
        Self::Warn,
        Self::Error,
    ];

    /// Name used in config files and as the `EnvFilter` directive
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive; `warning` is accepted for `warn`
impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        if lowered == "warning" {
            return Ok(Self::Warn);
        }
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == lowered)
            .ok_or_else(|| format!("unknown log level '{s}', expected one of {}", names()))
    }
}

fn names() -> String {
    LogLevel::ALL.map(|level| level.as_str()).join(", ")
}

/// Line format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One readable line per event
    #[default]
    Console,
    /// One JSON object per event, for log shippers
    Json,
}

/// Destination of diagnostics
///
/// `"stdout"` and `"stderr"` name the streams; any other string is a file
/// path opened in append mode.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    #[serde(untagged)]
    File(PathBuf),
}

impl LogOutput {
    /// Whether ANSI colors belong in this destination
    pub fn is_stream(&self) -> bool {
        !matches!(self, Self::File(_))
    }
}

/// Options of the `[log]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Default: info
    pub level: LogLevel,

    /// Default: console
    pub format: LogFormat,

    /// Default: stdout
    pub output: LogOutput,
}

//! Ferry Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! An empty file is a working config: stdin in, `valid` filter, stdout out.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use ferry_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[pipeline]\noutput = \"logr\"").unwrap();
//! assert_eq!(config.pipeline.output, "logr");
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [agent]
//! id = "edge-01"
//! max_batch_size = 500
//!
//! [pipeline]
//! input = "file"
//! output = "logr"
//! plugin_configs = ["plugins/file.toml", "plugins/logr.toml"]
//!
//! [log]
//! output = "stderr"
//! ```
//!
//! Plugin documents are loaded separately, see [`PluginConfigs`].

mod agent;
mod api_server;
mod error;
mod logging;
mod monitor;
mod pipeline;
mod plugins;
mod validation;

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use agent::AgentConfig;
pub use api_server::ApiServerConfig;
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use monitor::MonitorConfig;
pub use pipeline::{DEFAULT_FILTER, DEFAULT_INPUT, DEFAULT_OUTPUT, PipelineConfig};
pub use plugins::{PLUGIN_NAME_KEY, PluginConfig, PluginConfigs};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Agent identity and channel sizing
    pub agent: AgentConfig,

    /// Plugins bound to each stage
    pub pipeline: PipelineConfig,

    /// Logging configuration
    pub log: LogConfig,

    /// Periodic counter logging
    pub monitor: MonitorConfig,

    /// Admin HTTP API
    pub api_server: ApiServerConfig,

    /// Directory of the file this config was loaded from
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Relative plugin document paths are resolved against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or contains invalid TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        let mut config = Self::from_str(&contents)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Parse configuration from a TOML string
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Re-run validation, e.g. after command-line overrides
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Plugin document paths, resolved against the config file's directory
    pub fn plugin_config_paths(&self) -> Vec<PathBuf> {
        self.pipeline
            .plugin_configs
            .iter()
            .map(|p| match &self.base_dir {
                Some(base) if p.is_relative() => base.join(p),
                _ => p.clone(),
            })
            .collect()
    }

    /// Load every plugin document named by `pipeline.plugin_configs`
    pub fn load_plugin_configs(&self) -> Result<PluginConfigs> {
        PluginConfigs::load(self.plugin_config_paths())
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

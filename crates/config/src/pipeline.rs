//! Pipeline wiring configuration
//!
//! Names the plugins bound to each stage and lists the plugin documents.

use serde::Deserialize;
use std::path::PathBuf;

/// Default input plugin
pub const DEFAULT_INPUT: &str = "stdin";

/// Default filter plugin
pub const DEFAULT_FILTER: &str = "valid";

/// Default output plugin
pub const DEFAULT_OUTPUT: &str = "stdout";

/// Stage plugin selection
///
/// # Example
///
/// ```toml
/// [pipeline]
/// input = "file"
/// filter = "valid"
/// output = "logr"
/// plugin_configs = ["plugins/file.toml", "plugins/logr.json"]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Input plugin name
    /// Default: "stdin"
    pub input: String,

    /// Filter plugin name
    /// Default: "valid"
    pub filter: String,

    /// Output plugin name
    /// Default: "stdout"
    pub output: String,

    /// Plugin documents to load, relative to the config file
    pub plugin_configs: Vec<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: DEFAULT_INPUT.into(),
            filter: DEFAULT_FILTER.into(),
            output: DEFAULT_OUTPUT.into(),
            plugin_configs: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.input, "stdin");
        assert_eq!(config.filter, "valid");
        assert_eq!(config.output, "stdout");
        assert!(config.plugin_configs.is_empty());
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
input = "cron"
filter = "noop"
output = "command"
plugin_configs = ["plugins/cron.toml"]
"#;
        let config: PipelineConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.input, "cron");
        assert_eq!(config.filter, "noop");
        assert_eq!(config.output, "command");
        assert_eq!(config.plugin_configs, vec![PathBuf::from("plugins/cron.toml")]);
    }
}

//! Monitor configuration
//!
//! Periodic logging of pipeline counters and queue depths.

use serde::Deserialize;
use std::time::Duration;

/// Monitor configuration
///
/// # Example
///
/// ```toml
/// [monitor]
/// enabled = true
/// interval = "10s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Start the monitor task before the pipeline stages
    /// Default: false
    pub enabled: bool,

    /// Reporting interval
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.interval, Duration::from_secs(5));
    }

    #[test]
    fn test_deserialize() {
        let config: MonitorConfig = toml::from_str("enabled = true\ninterval = \"1m\"").unwrap();
        assert!(config.enabled);
        assert_eq!(config.interval, Duration::from_secs(60));
    }
}

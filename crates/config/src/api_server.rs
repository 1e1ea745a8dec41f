//! Admin API configuration
//!
//! Configuration for the small HTTP surface used by operators.

use serde::Deserialize;

/// Admin API configuration
///
/// # Example
///
/// ```toml
/// [api_server]
/// enabled = true       # default
/// host = "0.0.0.0"     # default
/// port = 10630         # default
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiServerConfig {
    /// Enable the admin API
    /// Default: true
    pub enabled: bool,

    /// Host to bind to
    /// Default: "0.0.0.0"
    pub host: String,

    /// Port to listen on
    /// Default: 10630
    pub port: u16,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "0.0.0.0".to_string(),
            port: 10630,
        }
    }
}

impl ApiServerConfig {
    /// Listen address in `host:port` form
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Apply a `host:port` override (as given on the command line)
    ///
    /// Returns false if the address has no valid port.
    pub fn set_address(&mut self, addr: &str) -> bool {
        let Some((host, port)) = addr.rsplit_once(':') else {
            return false;
        };
        let Ok(port) = port.parse() else {
            return false;
        };
        self.host = host.to_string();
        self.port = port;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiServerConfig::default();
        assert!(config.enabled);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 10630);
        assert_eq!(config.address(), "0.0.0.0:10630");
    }

    #[test]
    fn test_disabled() {
        let config: ApiServerConfig = toml::from_str("enabled = false").unwrap();
        assert!(!config.enabled);
    }

    #[test]
    fn test_set_address() {
        let mut config = ApiServerConfig::default();
        assert!(config.set_address("127.0.0.1:9000"));
        assert_eq!(config.address(), "127.0.0.1:9000");

        assert!(!config.set_address("127.0.0.1"));
        assert!(!config.set_address("127.0.0.1:http"));
        assert_eq!(config.address(), "127.0.0.1:9000");
    }
}

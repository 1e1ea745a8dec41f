//! Application state

use std::sync::Arc;

use ferry_pipeline::Agent;
use serde::{Deserialize, Serialize};

/// Build information served by `/version`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Program name
    pub name: String,
    /// Program version
    pub version: String,
    /// Target operating system
    pub os: String,
    /// Target architecture
    pub arch: String,
}

impl VersionInfo {
    /// Info for `name` at `version` on the current target
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            os: std::env::consts::OS.into(),
            arch: std::env::consts::ARCH.into(),
        }
    }
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self::new("ferry", env!("CARGO_PKG_VERSION"))
    }
}

/// Shared state for handlers
#[derive(Debug, Clone)]
pub struct AppState {
    /// The agent being administered
    pub agent: Arc<Agent>,
    /// Build information
    pub version: Arc<VersionInfo>,
}

impl AppState {
    /// State with the default version info
    pub fn new(agent: Arc<Agent>) -> Self {
        Self {
            agent,
            version: Arc::new(VersionInfo::default()),
        }
    }

    /// Override the version info
    pub fn with_version(mut self, version: VersionInfo) -> Self {
        self.version = Arc::new(version);
        self
    }
}

//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A plugin document could not be parsed
    #[error("malformed plugin document '{path}': {message}")]
    PluginDocument {
        /// Path to the document
        path: String,
        /// Parser message
        message: String,
    },

    /// A plugin document has no `@pluginName` key
    #[error("plugin document '{path}' is missing '@pluginName'")]
    MissingPluginName {
        /// Path to the document
        path: String,
    },

    /// Plugin options do not match the plugin's schema
    #[error("plugin '{plugin}' has invalid options: {message}")]
    PluginOptions {
        /// Plugin name
        plugin: String,
        /// Decoder message
        message: String,
    },

    /// Validation error - required field missing
    #[error("{component} '{name}' is missing required field '{field}'")]
    MissingField {
        /// Component type (e.g., "pipeline", "agent")
        component: &'static str,
        /// Name of the component
        name: String,
        /// Missing field name
        field: &'static str,
    },

    /// Validation error - invalid value
    #[error("{component} '{name}' has invalid {field}: {message}")]
    InvalidValue {
        /// Component type
        component: &'static str,
        /// Name of the component
        name: String,
        /// Field name
        field: &'static str,
        /// Error message
        message: String,
    },
}

impl ConfigError {
    /// Create a PluginDocument error
    pub fn plugin_document(path: impl Into<String>, message: impl ToString) -> Self {
        Self::PluginDocument {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a MissingPluginName error
    pub fn missing_plugin_name(path: impl Into<String>) -> Self {
        Self::MissingPluginName { path: path.into() }
    }

    /// Create a PluginOptions error
    pub fn plugin_options(plugin: impl Into<String>, message: impl ToString) -> Self {
        Self::PluginOptions {
            plugin: plugin.into(),
            message: message.to_string(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(
        component: &'static str,
        name: impl Into<String>,
        field: &'static str,
    ) -> Self {
        Self::MissingField {
            component,
            name: name.into(),
            field,
        }
    }

    /// Create an InvalidValue error
    pub fn invalid_value(
        component: &'static str,
        name: impl Into<String>,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            component,
            name: name.into(),
            field,
            message: message.into(),
        }
    }
}

//! Plugin documents
//!
//! Each plugin reads its options from a flat document that names the plugin
//! it belongs to with an `@pluginName` key:
//!
//! ```toml
//! "@pluginName" = "file"
//! path = "/var/log/nginx/access.log"
//! start_position = "beginning"
//! ```
//!
//! Documents may be TOML or JSON (chosen by file extension). Documents
//! naming the same plugin are merged key by key, later documents winning.
//! Plugins turn their options into a typed struct with [`PluginConfig::decode`],
//! so a mistyped option fails at bind time with the offending key named.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::error::{ConfigError, Result};

/// Key that identifies which plugin a document configures
pub const PLUGIN_NAME_KEY: &str = "@pluginName";

/// Options for a single plugin
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginConfig {
    /// Plugin name from `@pluginName`
    pub name: String,

    /// Every other key of the document
    pub options: toml::Table,
}

impl PluginConfig {
    /// Create an empty config for a plugin
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: toml::Table::new(),
        }
    }

    /// Builder-style option setter
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Build from a parsed document, taking the name out of `@pluginName`
    pub fn from_table(source: &str, mut table: toml::Table) -> Result<Self> {
        let name = match table.remove(PLUGIN_NAME_KEY) {
            Some(toml::Value::String(name)) if !name.trim().is_empty() => name,
            _ => return Err(ConfigError::missing_plugin_name(source)),
        };

        Ok(Self {
            name,
            options: table,
        })
    }

    /// Parse a TOML or JSON document
    ///
    /// Files ending in `.json` are parsed as JSON, everything else as TOML.
    pub fn parse_document(path: &Path, contents: &str) -> Result<Self> {
        let source = path.display().to_string();
        let table: toml::Table = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(contents)
                .map_err(|e| ConfigError::plugin_document(&source, e))?,
            _ => toml::from_str(contents).map_err(|e| ConfigError::plugin_document(&source, e))?,
        };

        Self::from_table(&source, table)
    }

    /// Decode the options into a typed config struct
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(toml::Value::Table(self.options.clone()))
            .map_err(|e| ConfigError::plugin_options(&self.name, e.message()))
    }

    /// Overlay another document's options on top of this one
    pub fn merge(&mut self, other: PluginConfig) {
        self.options.extend(other.options);
    }

    /// Get an option as string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(|v| v.as_str())
    }

    /// Get an option as i64
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.options.get(key).and_then(|v| v.as_integer())
    }

    /// Get an option as bool
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.options.get(key).and_then(|v| v.as_bool())
    }

    /// Get an option as PathBuf
    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.get_str(key).map(PathBuf::from)
    }
}

/// Name-keyed map of every loaded plugin document
#[derive(Debug, Clone, Default)]
pub struct PluginConfigs {
    configs: HashMap<String, PluginConfig>,
}

impl PluginConfigs {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and merge every document in order
    ///
    /// # Errors
    ///
    /// Fails on the first unreadable or malformed document.
    pub fn load<I, P>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut configs = Self::new();
        for path in paths {
            configs.load_file(path)?;
        }
        Ok(configs)
    }

    /// Load one document and merge it in
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        self.insert(PluginConfig::parse_document(path, &contents)?);
        Ok(())
    }

    /// Insert a document, merging with any earlier one for the same plugin
    pub fn insert(&mut self, config: PluginConfig) {
        match self.configs.get_mut(&config.name) {
            Some(existing) => existing.merge(config),
            None => {
                self.configs.insert(config.name.clone(), config);
            }
        }
    }

    /// Get the document for a plugin
    pub fn get(&self, name: &str) -> Option<&PluginConfig> {
        self.configs.get(name)
    }

    /// Get the document for a plugin, or an empty one if none was loaded
    pub fn resolve(&self, name: &str) -> PluginConfig {
        self.get(name)
            .cloned()
            .unwrap_or_else(|| PluginConfig::new(name))
    }

    /// Names of all configured plugins, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.configs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of configured plugins
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    /// Check if no documents were loaded
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

#[cfg(test)]
#[path = "plugins_test.rs"]
mod tests;

//! Plugin Registry - name to instance mapping
//!
//! Populated once at bootstrap, then moved into the [`Agent`](crate::Agent)
//! which only reads from it. There is no removal API, so the mapping needs
//! no synchronization once the pipeline is running.
//!
//! # Example
//!
//! ```ignore
//! let mut registry = PluginRegistry::new();
//! registry.register_input("stdin", Arc::new(StdinInput::default()));
//! registry.register_filter("valid", Arc::new(ValidFilter));
//! registry.register_output("stdout", Arc::new(StdoutOutput::default()));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{PipelineError, Result};
use crate::plugin::{Filter, Input, Output, PluginKind};

/// Registered plugin instances for all three stages
#[derive(Default)]
pub struct PluginRegistry {
    inputs: HashMap<String, Arc<dyn Input>>,
    filters: HashMap<String, Arc<dyn Filter>>,
    outputs: HashMap<String, Arc<dyn Output>>,
}

impl PluginRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an input plugin
    ///
    /// # Panics
    ///
    /// Panics if an input with the same name is already registered.
    pub fn register_input(&mut self, name: impl Into<String>, input: Arc<dyn Input>) {
        let name = name.into();
        if !self.try_register_input(name.clone(), input) {
            panic!("input plugin '{name}' already registered");
        }
    }

    /// Register a filter plugin
    ///
    /// # Panics
    ///
    /// Panics if a filter with the same name is already registered.
    pub fn register_filter(&mut self, name: impl Into<String>, filter: Arc<dyn Filter>) {
        let name = name.into();
        if !self.try_register_filter(name.clone(), filter) {
            panic!("filter plugin '{name}' already registered");
        }
    }

    /// Register an output plugin
    ///
    /// # Panics
    ///
    /// Panics if an output with the same name is already registered.
    pub fn register_output(&mut self, name: impl Into<String>, output: Arc<dyn Output>) {
        let name = name.into();
        if !self.try_register_output(name.clone(), output) {
            panic!("output plugin '{name}' already registered");
        }
    }

    /// Register an input, returning false if the name is taken
    pub fn try_register_input(&mut self, name: impl Into<String>, input: Arc<dyn Input>) -> bool {
        try_insert(&mut self.inputs, name.into(), input)
    }

    /// Register a filter, returning false if the name is taken
    pub fn try_register_filter(&mut self, name: impl Into<String>, filter: Arc<dyn Filter>) -> bool {
        try_insert(&mut self.filters, name.into(), filter)
    }

    /// Register an output, returning false if the name is taken
    pub fn try_register_output(&mut self, name: impl Into<String>, output: Arc<dyn Output>) -> bool {
        try_insert(&mut self.outputs, name.into(), output)
    }

    /// Look up an input plugin
    pub fn input(&self, name: &str) -> Result<Arc<dyn Input>> {
        self.inputs
            .get(name)
            .cloned()
            .ok_or_else(|| self.unknown(PluginKind::Input, name))
    }

    /// Look up a filter plugin
    pub fn filter(&self, name: &str) -> Result<Arc<dyn Filter>> {
        self.filters
            .get(name)
            .cloned()
            .ok_or_else(|| self.unknown(PluginKind::Filter, name))
    }

    /// Look up an output plugin
    pub fn output(&self, name: &str) -> Result<Arc<dyn Output>> {
        self.outputs
            .get(name)
            .cloned()
            .ok_or_else(|| self.unknown(PluginKind::Output, name))
    }

    /// Check if a plugin is registered for a stage
    pub fn contains(&self, kind: PluginKind, name: &str) -> bool {
        match kind {
            PluginKind::Input => self.inputs.contains_key(name),
            PluginKind::Filter => self.filters.contains_key(name),
            PluginKind::Output => self.outputs.contains_key(name),
        }
    }

    /// Registered names for a stage, sorted
    pub fn names(&self, kind: PluginKind) -> Vec<&str> {
        let mut names: Vec<&str> = match kind {
            PluginKind::Input => self.inputs.keys().map(String::as_str).collect(),
            PluginKind::Filter => self.filters.keys().map(String::as_str).collect(),
            PluginKind::Output => self.outputs.keys().map(String::as_str).collect(),
        };
        names.sort_unstable();
        names
    }

    /// Total number of registered plugins
    pub fn len(&self) -> usize {
        self.inputs.len() + self.filters.len() + self.outputs.len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn unknown(&self, kind: PluginKind, name: &str) -> PipelineError {
        PipelineError::unknown_plugin(kind, name, &self.names(kind))
    }
}

fn try_insert<T: ?Sized>(map: &mut HashMap<String, Arc<T>>, name: String, plugin: Arc<T>) -> bool {
    if map.contains_key(&name) {
        return false;
    }
    map.insert(name, plugin);
    true
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("inputs", &self.names(PluginKind::Input))
            .field("filters", &self.names(PluginKind::Filter))
            .field("outputs", &self.names(PluginKind::Output))
            .finish()
    }
}

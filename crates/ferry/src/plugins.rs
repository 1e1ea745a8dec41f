//! Built-in plugin registration

use ferry_pipeline::PluginRegistry;

/// Registry holding every plugin shipped with ferry
pub fn default_registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    ferry_sources::register_inputs(&mut registry);
    ferry_transform::register_filters(&mut registry);
    ferry_sinks::register_outputs(&mut registry);
    registry
}

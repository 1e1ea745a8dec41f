//! Plugins command - List the built-in plugins

use anyhow::Result;
use owo_colors::OwoColorize;

use ferry_pipeline::{PluginKind, PluginRegistry};

use crate::plugins::default_registry;

/// Run the plugins command
pub fn run() -> Result<()> {
    print!("{}", render(&default_registry()));
    Ok(())
}

fn render(registry: &PluginRegistry) -> String {
    let mut out = String::new();
    for kind in [PluginKind::Input, PluginKind::Filter, PluginKind::Output] {
        out.push_str(&format!("{}\n", format!("{kind}s:").bold()));
        for name in registry.names(kind) {
            out.push_str(&format!("  {name}\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lists_every_stage() {
        let text = render(&default_registry());
        assert!(text.contains("inputs:"));
        assert!(text.contains("filters:"));
        assert!(text.contains("outputs:"));
        assert!(text.contains("  file\n"));
        assert!(text.contains("  valid\n"));
        assert!(text.contains("  logr\n"));
    }

    #[test]
    fn test_render_keeps_stage_order() {
        let text = render(&default_registry());
        let inputs = text.find("inputs:").unwrap();
        let filters = text.find("filters:").unwrap();
        let outputs = text.find("outputs:").unwrap();
        assert!(inputs < filters && filters < outputs);
    }
}

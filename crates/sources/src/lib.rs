//! Ferry Sources - Input plugins
//!
//! Inputs feed raw payloads into the ingestion queue through
//! [`PipelineContext::emit`](ferry_pipeline::PipelineContext::emit).
//!
//! # Available Inputs
//!
//! - **stdin** - One payload per line of standard input
//! - **file** - Polling tail of one or more files with offset persistence
//! - **cron** - Fixed payloads emitted on cron schedules
//!
//! # Design Principles
//!
//! - Options are decoded once in `bind`; a bad option fails startup
//! - `run` returns when the context is cancelled or the source is exhausted
//! - Backpressure comes from the bounded queue: `emit` waits for space
//!
//! # Example
//!
//! ```ignore
//! let mut registry = PluginRegistry::new();
//! ferry_sources::register_inputs(&mut registry);
//! assert!(registry.contains(PluginKind::Input, "file"));
//! ```

mod common;

pub mod cron;
pub mod file;
pub mod stdin;

use std::sync::Arc;

use ferry_pipeline::PluginRegistry;

pub use self::cron::{CronConfig, CronInput};
pub use file::{FileConfig, FileInput, StartPosition};
pub use stdin::StdinInput;

/// Register every built-in input
pub fn register_inputs(registry: &mut PluginRegistry) {
    registry.register_input(stdin::NAME, Arc::new(StdinInput::new()));
    registry.register_input(file::NAME, Arc::new(FileInput::new()));
    registry.register_input(self::cron::NAME, Arc::new(CronInput::new()));
}

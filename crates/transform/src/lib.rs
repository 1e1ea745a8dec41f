//! Ferry - Transform
//!
//! Filter plugins applied to every item between the ingest and egress
//! queues.
//!
//! # Filters
//!
//! - `valid` - drops empty payloads (the default filter)
//! - `noop` - passes everything through
//!
//! # Adding a New Filter
//!
//! 1. Define a typed options struct deriving `Deserialize` with
//!    `#[serde(default, deny_unknown_fields)]`.
//! 2. Implement [`Filter`](ferry_pipeline::Filter): decode the options in
//!    `bind`, keep `apply` free of I/O.
//! 3. Register it in [`register_filters`].

pub mod noop;
pub mod valid;

use std::sync::Arc;

use ferry_pipeline::PluginRegistry;

pub use noop::NoopFilter;
pub use valid::{ValidConfig, ValidFilter};

/// Register every built-in filter
pub fn register_filters(registry: &mut PluginRegistry) {
    registry.register_filter(valid::NAME, Arc::new(ValidFilter::new()));
    registry.register_filter(noop::NAME, Arc::new(NoopFilter::new()));
}

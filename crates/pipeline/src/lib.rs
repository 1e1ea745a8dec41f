//! Ferry - Pipeline
//!
//! The channel-mediated engine that wires one input, one filter and one
//! output together.
//!
//! # Architecture
//!
//! ```text
//!  source ──→ [Input] ──→ ingest queue ──→ filter runner ──→ egress queue ──→ egress runner ──→ [Output] ──→ sink
//!                              │            [Filter]              │          (micro-batching)
//!                              └────────────── Agent::empty ──────┘
//! ```
//!
//! # Key Design
//!
//! - **Bounded queues**: backpressure comes from queue capacity alone
//! - **Startup barrier**: the output binds before anything is read from the source
//! - **Opportunistic batching**: read one, then drain what is already queued
//! - **Cooperative shutdown**: one close-once cancellation signal observed by every stage
//! - **Explicit registry**: plugins are looked up by name from a [`PluginRegistry`]
//!
//! # Example
//!
//! ```ignore
//! use ferry_pipeline::{Agent, AgentOptions, PluginRegistry};
//!
//! let mut registry = PluginRegistry::new();
//! registry.register_input("stdin", Arc::new(StdinInput::default()));
//! registry.register_filter("valid", Arc::new(ValidFilter));
//! registry.register_output("stdout", Arc::new(StdoutOutput::default()));
//!
//! let agent = Agent::new(AgentOptions::from_config(&config), registry, plugin_configs);
//! agent.start().await?;
//! // ...
//! agent.shutdown().await?;
//! ```

mod agent;
mod context;
mod error;
mod metrics;
mod monitor;
mod packet;
mod plugin;
mod queue;
mod registry;
mod runner;
mod signal;

pub mod test_utils;

pub use agent::{Agent, AgentOptions, DrainReport, StageStates};
pub use context::PipelineContext;
pub use error::{
    FilterError, PipelineError, PluginError, PluginResult, QueueError, Result, TrySendError,
};
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use packet::{Batch, Packet};
pub use plugin::{Filter, Input, Output, PluginKind};
pub use queue::{EGRESS_QUEUE, INGEST_QUEUE, Queue};
pub use registry::PluginRegistry;
pub use runner::StageState;
pub use signal::CancelSignal;

// Re-exported so plugin crates need no direct dependency
pub use async_trait::async_trait;
pub use bytes::Bytes;
pub use ferry_config::{PluginConfig, PluginConfigs};

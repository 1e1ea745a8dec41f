//! Ferry - Sinks
//!
//! Output plugins. Each receives batches from the egress runner through
//! [`Output::write`](ferry_pipeline::Output::write) and owns its own error
//! handling: nothing a sink does can fail the pipeline after bind.
//!
//! ```text
//! [egress queue] --batch--> [EgressRunner] --&[Packet]--> [Output::write] --> [destination]
//! ```
//!
//! # Available Sinks
//!
//! | Sink | Purpose | Refresh |
//! |------|---------|---------|
//! | `stdout` | Debug output, text or JSON | No-op |
//! | `command` | Run each payload as a shell command | No-op |
//! | `logr` | Append to a rotating, optionally compressed file | Reopens the file |
//! | `rabbitmq` | Publish to AMQP brokers, rotating across them | No-op |
//!
//! # Example
//!
//! ```ignore
//! let mut registry = PluginRegistry::new();
//! ferry_sinks::register_outputs(&mut registry);
//! let output = registry.output("logr")?;
//! ```

pub mod command;
pub mod logr;
pub mod rabbitmq;
pub mod stdout;

use std::sync::Arc;

use ferry_pipeline::PluginRegistry;

pub use command::{CommandConfig, CommandError, CommandOutput};
pub use logr::{LogrConfig, LogrOutput, OnLimit, RotatingWriter};
pub use rabbitmq::{ExchangeType, PublishMode, RabbitmqConfig, RabbitmqOutput};
pub use stdout::{StdoutConfig, StdoutFormat, StdoutOutput};

/// Register every built-in output
pub fn register_outputs(registry: &mut PluginRegistry) {
    registry.register_output(stdout::NAME, Arc::new(StdoutOutput::new()));
    registry.register_output(command::NAME, Arc::new(CommandOutput::new()));
    registry.register_output(logr::NAME, Arc::new(LogrOutput::new()));
    registry.register_output(rabbitmq::NAME, Arc::new(RabbitmqOutput::new()));
}

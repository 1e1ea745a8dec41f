//! Agent configuration
//!
//! Identity of this agent and the sizing of the pipeline channels.

use serde::Deserialize;
use std::time::Duration;

/// Agent identity and channel sizing
///
/// All fields have sensible defaults - you only need to specify what you want to change.
///
/// # Example
///
/// ```toml
/// [agent]
/// id = "edge-01"
/// group = "devops"
/// ingest_queue_size = 4096
/// egress_queue_size = 4096
/// max_batch_size = 500
/// idle_poll_interval = "400ms"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Agent identifier reported by the admin API
    /// Default: "localhost"
    pub id: String,

    /// Group the agent belongs to
    /// Default: "devops"
    pub group: String,

    /// Capacity of the queue between the input and the filter
    /// Default: 4096
    pub ingest_queue_size: usize,

    /// Capacity of the queue between the filter and the output
    /// Default: 4096
    pub egress_queue_size: usize,

    /// Packets drained opportunistically after the first one of a batch
    /// Default: 500
    pub max_batch_size: usize,

    /// How long the egress runner sleeps when its queue is empty
    /// Default: 400ms
    #[serde(with = "humantime_serde")]
    pub idle_poll_interval: Duration,

    /// Shut the agent down once the input plugin returns
    /// Default: false (finite inputs leave the rest of the pipeline running)
    pub shutdown_on_input_exit: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            id: "localhost".into(),
            group: "devops".into(),
            ingest_queue_size: 4096,
            egress_queue_size: 4096,
            max_batch_size: 500,
            idle_poll_interval: Duration::from_millis(400),
            shutdown_on_input_exit: false,
        }
    }
}

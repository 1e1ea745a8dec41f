//! Plugin contracts
//!
//! Every plugin implements exactly one of [`Input`], [`Filter`] or
//! [`Output`]. Instances are shared as `Arc<dyn ..>`, so per-bind state
//! lives behind interior mutability in the plugin itself.
//!
//! # Lifecycle
//!
//! ```text
//! Output::bind ──→ (startup barrier) ──→ Filter::bind ──→ Input::bind ──→ Input::run
//!       │                                     │
//!       └──→ Output::write(batch) ...         └──→ Filter::apply(item) ...
//! ```

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;

use crate::context::PipelineContext;
use crate::error::{FilterError, PluginResult};
use crate::packet::Packet;

/// Stage a plugin belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginKind {
    /// Produces raw payloads into the ingestion queue
    Input,
    /// Transforms items between the two queues
    Filter,
    /// Writes batches to a sink
    Output,
}

impl PluginKind {
    /// Lowercase stage name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Filter => "filter",
            Self::Output => "output",
        }
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source of raw payloads
///
/// `run` blocks for the plugin's operational lifetime, pushing payloads
/// with [`PipelineContext::emit`] (backpressure) or
/// [`PipelineContext::try_emit`] (drop when full). It must return once
/// the context is cancelled.
#[async_trait]
pub trait Input: Send + Sync {
    /// Decode options and acquire resources
    async fn bind(&self, ctx: &PipelineContext) -> PluginResult<()>;

    /// Produce payloads until the source is exhausted or the context is cancelled
    async fn run(&self, ctx: &PipelineContext) -> PluginResult<()>;

    /// Reload hook
    fn refresh(&self) {}
}

/// A per-item transform
///
/// An `Err` drops the item. The filter runner does not retry.
#[async_trait]
pub trait Filter: Send + Sync {
    /// Decode options
    async fn bind(&self, _ctx: &PipelineContext) -> PluginResult<()> {
        Ok(())
    }

    /// Transform one item
    fn apply(&self, item: Bytes) -> Result<Bytes, FilterError>;
}

/// A batch sink
///
/// Write failures are the plugin's own concern: the egress runner neither
/// sees nor retries them. A `write` that never returns stalls the pipeline.
#[async_trait]
pub trait Output: Send + Sync {
    /// Decode options and open the sink
    ///
    /// Ingestion does not start until this returns `Ok`.
    async fn bind(&self, ctx: &PipelineContext) -> PluginResult<()>;

    /// Flush one batch
    async fn write(&self, batch: &[Packet]);

    /// Reload hook, e.g. reopen a file after external rotation
    fn refresh(&self) {}
}

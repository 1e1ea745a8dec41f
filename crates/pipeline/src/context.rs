//! Pipeline context
//!
//! The handle every plugin receives at bind time: its resolved options,
//! both queues, the cancellation token, shared metrics and a tracing span
//! that identifies the plugin in logs.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use ferry_config::PluginConfig;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::error::{PluginResult, QueueError, TrySendError};
use crate::metrics::PipelineMetrics;
use crate::plugin::PluginKind;
use crate::queue::Queue;

/// Per-plugin view of the running pipeline
///
/// Cheap to clone; plugins may hand clones to tasks they spawn.
#[derive(Clone)]
pub struct PipelineContext {
    kind: PluginKind,
    config: Arc<PluginConfig>,
    ingest: Queue,
    egress: Queue,
    cancel: CancellationToken,
    metrics: Arc<PipelineMetrics>,
    span: Span,
}

impl PipelineContext {
    /// Create a context for one plugin
    ///
    /// `cancel` should be a child of the pipeline's cancellation signal so
    /// the plugin can observe shutdown without being able to trigger it.
    pub fn new(
        kind: PluginKind,
        config: PluginConfig,
        ingest: Queue,
        egress: Queue,
        cancel: CancellationToken,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        let span = tracing::info_span!("plugin", kind = kind.as_str(), name = %config.name);
        Self {
            kind,
            config: Arc::new(config),
            ingest,
            egress,
            cancel,
            metrics,
            span,
        }
    }

    /// Stage this plugin is bound to
    #[inline]
    pub fn kind(&self) -> PluginKind {
        self.kind
    }

    /// Plugin name
    #[inline]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Raw plugin options
    #[inline]
    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// Decode the plugin options into a typed struct
    pub fn decode_config<T: DeserializeOwned>(&self) -> PluginResult<T> {
        Ok(self.config.decode()?)
    }

    /// Queue between the input and the filter
    #[inline]
    pub fn ingest(&self) -> &Queue {
        &self.ingest
    }

    /// Queue between the filter and the output
    #[inline]
    pub fn egress(&self) -> &Queue {
        &self.egress
    }

    /// Shared pipeline counters
    #[inline]
    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Span carrying the plugin's kind and name
    #[inline]
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Check if the pipeline is shutting down
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait until the pipeline is shutting down
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// Token for tasks the plugin spawns itself
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Push a payload into the ingestion queue, waiting for space
    ///
    /// Fails with `Closed` once the pipeline is shutting down.
    pub async fn emit(&self, item: impl Into<Bytes>) -> Result<(), QueueError> {
        let item = item.into();
        let len = item.len();

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(QueueError::Closed),
            res = self.ingest.send(item) => {
                res?;
                self.metrics.record_ingested(len);
                Ok(())
            }
        }
    }

    /// Push a payload without waiting, dropping it if the queue is full
    pub fn try_emit(&self, item: impl Into<Bytes>) -> Result<(), QueueError> {
        if self.is_cancelled() {
            return Err(QueueError::Closed);
        }

        let item = item.into();
        let len = item.len();
        match self.ingest.try_send(item) {
            Ok(()) => {
                self.metrics.record_ingested(len);
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.metrics.record_ingest_dropped();
                Err(QueueError::Full)
            }
            Err(TrySendError::Closed(_)) => Err(QueueError::Closed),
        }
    }
}

impl fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineContext")
            .field("kind", &self.kind)
            .field("name", &self.config.name)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

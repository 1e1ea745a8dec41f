//! Egress runner and micro-batching
//!
//! Reads one packet, then opportunistically drains whatever is already
//! queued (up to `max_batch` more) and hands the lot to the output in a
//! single `write`. The first packet is never held back waiting for a full
//! batch. When the queue is empty the runner sleeps for `idle_poll`.
//!
//! A batch therefore holds at most `max_batch + 1` packets: the trigger
//! packet plus up to `max_batch` drained ones.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::Instrument;

use crate::context::PipelineContext;
use crate::error::{PluginResult, QueueError};
use crate::packet::{Batch, Packet};
use crate::plugin::Output;
use crate::runner::{StageState, StageStatus};

/// Packet slots to preallocate for one batch
///
/// A batch never holds more than the queue's capacity plus the trigger
/// packet, however large `max_batch` is configured.
pub(crate) fn batch_capacity(max_batch: usize, queue_capacity: usize) -> usize {
    max_batch.min(queue_capacity).saturating_add(1)
}

/// Drives one output plugin
pub(crate) struct EgressRunner {
    output: Arc<dyn Output>,
    ctx: PipelineContext,
    max_batch: usize,
    idle_poll: Duration,
    status: StageStatus,
}

impl EgressRunner {
    pub(crate) fn new(
        output: Arc<dyn Output>,
        ctx: PipelineContext,
        max_batch: usize,
        idle_poll: Duration,
        status: StageStatus,
    ) -> Self {
        Self {
            output,
            ctx,
            max_batch,
            idle_poll,
            status,
        }
    }

    /// Bind the output, report the result through `ready`, then run
    ///
    /// `ready` is the startup barrier: nothing upstream starts until it fires.
    pub(crate) async fn run(self, ready: oneshot::Sender<PluginResult<()>>) {
        self.status.set(StageState::Binding);
        let bound = self
            .output
            .bind(&self.ctx)
            .instrument(self.ctx.span().clone())
            .await;
        let ok = bound.is_ok();

        // The receiver is gone only if start() was abandoned
        let _ = ready.send(bound);

        if ok {
            self.status.set(StageState::Running);
            self.run_loop().await;
        }
        self.status.set(StageState::Stopped);
    }

    async fn run_loop(&self) {
        let queue = self.ctx.egress();
        let mut batch = Batch::with_capacity(batch_capacity(self.max_batch, queue.capacity()));

        tracing::debug!(
            parent: self.ctx.span(),
            max_batch = self.max_batch,
            idle_poll_ms = self.idle_poll.as_millis() as u64,
            "egress runner started"
        );

        loop {
            if self.ctx.is_cancelled() {
                break;
            }

            match queue.try_recv() {
                Ok(item) => {
                    batch.push(Packet::new(item));

                    // Only pull what is already buffered. A concurrent drain
                    // may take some of it, so stop at the first miss.
                    let extra = queue.len().min(self.max_batch);
                    for _ in 0..extra {
                        match queue.try_recv() {
                            Ok(item) => batch.push(Packet::new(item)),
                            Err(_) => break,
                        }
                    }

                    if !batch.is_empty() {
                        self.flush(&mut batch).await;
                    }
                }
                Err(QueueError::Empty) => {
                    tokio::select! {
                        biased;
                        _ = self.ctx.cancelled() => break,
                        _ = tokio::time::sleep(self.idle_poll) => {}
                    }
                }
                Err(_) => break,
            }
        }

        tracing::debug!(parent: self.ctx.span(), "egress runner stopped");
    }

    async fn flush(&self, batch: &mut Batch) {
        self.ctx
            .metrics()
            .record_batch(batch.len(), batch.total_bytes());
        self.output
            .write(batch.packets())
            .instrument(self.ctx.span().clone())
            .await;
        batch.clear();
    }
}

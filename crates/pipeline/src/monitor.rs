//! Pipeline monitor
//!
//! Logs counter deltas and queue depths at a fixed interval until the
//! pipeline is cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::metrics::PipelineMetrics;
use crate::queue::Queue;

pub(crate) async fn run_monitor(
    interval: Duration,
    metrics: Arc<PipelineMetrics>,
    ingest: Queue,
    egress: Queue,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // First tick completes immediately
    ticker.tick().await;

    let mut previous = metrics.snapshot();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let current = metrics.snapshot();
        let delta = current.diff(&previous);
        previous = current;

        tracing::info!(
            interval_secs = interval.as_secs_f64(),
            ingest_len = ingest.len(),
            ingest_capacity = ingest.capacity(),
            egress_len = egress.len(),
            egress_capacity = egress.capacity(),
            ingested = delta.items_ingested,
            ingest_dropped = delta.ingest_dropped,
            filtered = delta.items_filtered,
            rejected = delta.filter_rejected,
            batches = delta.batches_written,
            packets = delta.packets_written,
            bytes = delta.bytes_written,
            avg_batch = delta.avg_batch_size().unwrap_or(0.0),
            "pipeline metrics"
        );
    }
}

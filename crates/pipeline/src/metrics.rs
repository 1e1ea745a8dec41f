//! Pipeline metrics
//!
//! Atomic counters shared by the stage runners and the pipeline context.
//! All operations use relaxed ordering; values are eventually consistent.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for one pipeline
///
/// # Thread Safety
///
/// All methods are safe to call from multiple tasks concurrently.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Items accepted into the ingestion queue
    items_ingested: AtomicU64,

    /// Payload bytes accepted into the ingestion queue
    bytes_ingested: AtomicU64,

    /// Items an input dropped because the ingestion queue was full
    ingest_dropped: AtomicU64,

    /// Items that passed the filter
    items_filtered: AtomicU64,

    /// Items the filter rejected
    filter_rejected: AtomicU64,

    /// Output `write` calls
    batches_written: AtomicU64,

    /// Packets handed to the output
    packets_written: AtomicU64,

    /// Payload bytes handed to the output
    bytes_written: AtomicU64,

    /// Largest batch handed to the output
    max_batch_seen: AtomicU64,

    /// Items removed by the administrative drain
    items_drained: AtomicU64,
}

impl PipelineMetrics {
    /// Create new metrics with all counters at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            items_ingested: AtomicU64::new(0),
            bytes_ingested: AtomicU64::new(0),
            ingest_dropped: AtomicU64::new(0),
            items_filtered: AtomicU64::new(0),
            filter_rejected: AtomicU64::new(0),
            batches_written: AtomicU64::new(0),
            packets_written: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            max_batch_seen: AtomicU64::new(0),
            items_drained: AtomicU64::new(0),
        }
    }

    /// Record an item accepted into the ingestion queue
    #[inline]
    pub fn record_ingested(&self, bytes: usize) {
        self.items_ingested.fetch_add(1, Ordering::Relaxed);
        self.bytes_ingested
            .fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Record an item dropped at ingestion (queue full)
    #[inline]
    pub fn record_ingest_dropped(&self) {
        self.ingest_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an item forwarded by the filter
    #[inline]
    pub fn record_filtered(&self) {
        self.items_filtered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an item rejected by the filter
    #[inline]
    pub fn record_rejected(&self) {
        self.filter_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a batch handed to the output
    #[inline]
    pub fn record_batch(&self, packets: usize, bytes: usize) {
        self.batches_written.fetch_add(1, Ordering::Relaxed);
        self.packets_written
            .fetch_add(packets as u64, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
        self.max_batch_seen
            .fetch_max(packets as u64, Ordering::Relaxed);
    }

    /// Record items removed by a drain
    #[inline]
    pub fn record_drained(&self, count: usize) {
        self.items_drained
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Get a point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            items_ingested: self.items_ingested.load(Ordering::Relaxed),
            bytes_ingested: self.bytes_ingested.load(Ordering::Relaxed),
            ingest_dropped: self.ingest_dropped.load(Ordering::Relaxed),
            items_filtered: self.items_filtered.load(Ordering::Relaxed),
            filter_rejected: self.filter_rejected.load(Ordering::Relaxed),
            batches_written: self.batches_written.load(Ordering::Relaxed),
            packets_written: self.packets_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            max_batch_seen: self.max_batch_seen.load(Ordering::Relaxed),
            items_drained: self.items_drained.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of pipeline metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MetricsSnapshot {
    /// Items accepted into the ingestion queue
    pub items_ingested: u64,
    /// Payload bytes accepted into the ingestion queue
    pub bytes_ingested: u64,
    /// Items dropped at ingestion
    pub ingest_dropped: u64,
    /// Items that passed the filter
    pub items_filtered: u64,
    /// Items the filter rejected
    pub filter_rejected: u64,
    /// Output `write` calls
    pub batches_written: u64,
    /// Packets handed to the output
    pub packets_written: u64,
    /// Payload bytes handed to the output
    pub bytes_written: u64,
    /// Largest batch handed to the output
    pub max_batch_seen: u64,
    /// Items removed by drains
    pub items_drained: u64,
}

impl MetricsSnapshot {
    /// Average packets per output write
    ///
    /// Returns None if nothing has been written.
    pub fn avg_batch_size(&self) -> Option<f64> {
        if self.batches_written == 0 {
            None
        } else {
            Some(self.packets_written as f64 / self.batches_written as f64)
        }
    }

    /// Calculate the difference from an earlier snapshot
    ///
    /// `max_batch_seen` is not a counter and is carried over as-is.
    pub fn diff(&self, previous: &MetricsSnapshot) -> MetricsSnapshot {
        MetricsSnapshot {
            items_ingested: self.items_ingested.saturating_sub(previous.items_ingested),
            bytes_ingested: self.bytes_ingested.saturating_sub(previous.bytes_ingested),
            ingest_dropped: self.ingest_dropped.saturating_sub(previous.ingest_dropped),
            items_filtered: self.items_filtered.saturating_sub(previous.items_filtered),
            filter_rejected: self
                .filter_rejected
                .saturating_sub(previous.filter_rejected),
            batches_written: self
                .batches_written
                .saturating_sub(previous.batches_written),
            packets_written: self
                .packets_written
                .saturating_sub(previous.packets_written),
            bytes_written: self.bytes_written.saturating_sub(previous.bytes_written),
            max_batch_seen: self.max_batch_seen,
            items_drained: self.items_drained.saturating_sub(previous.items_drained),
        }
    }
}

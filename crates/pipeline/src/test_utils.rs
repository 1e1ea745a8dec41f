//! Stub plugins and harnesses for tests
//!
//! Used by this crate's tests and by the plugin crates to drive a plugin
//! without a full [`Agent`](crate::Agent).

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use ferry_config::PluginConfig;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::context::PipelineContext;
use crate::error::{FilterError, PluginError, PluginResult};
use crate::metrics::PipelineMetrics;
use crate::packet::Packet;
use crate::plugin::{Filter, Input, Output, PluginKind};
use crate::queue::{EGRESS_QUEUE, INGEST_QUEUE, Queue};

/// A context wired to fresh queues, with handles to everything behind it
pub struct TestContext {
    /// The context to hand to a plugin
    pub ctx: PipelineContext,
    /// Cancels the context
    pub cancel: CancellationToken,
    /// Metrics the context records into
    pub metrics: Arc<PipelineMetrics>,
}

impl TestContext {
    /// Context with queues of capacity 64
    pub fn new(kind: PluginKind, config: PluginConfig) -> Self {
        Self::with_capacity(kind, config, 64)
    }

    /// Context whose queues hold `capacity` items
    pub fn with_capacity(kind: PluginKind, config: PluginConfig, capacity: usize) -> Self {
        let cancel = CancellationToken::new();
        let metrics = Arc::new(PipelineMetrics::new());
        let ctx = PipelineContext::new(
            kind,
            config,
            Queue::bounded(INGEST_QUEUE, capacity),
            Queue::bounded(EGRESS_QUEUE, capacity),
            cancel.clone(),
            Arc::clone(&metrics),
        );
        Self {
            ctx,
            cancel,
            metrics,
        }
    }

    /// Take everything currently in the ingestion queue
    pub fn take_ingested(&self) -> Vec<Bytes> {
        let mut items = Vec::new();
        while let Ok(item) = self.ctx.ingest().try_recv() {
            items.push(item);
        }
        items
    }
}

/// Input that emits a fixed list of payloads
///
/// Returns after the last one unless `hold_open` is set, in which case it
/// waits for cancellation.
pub struct VecInput {
    items: Vec<Bytes>,
    hold_open: bool,
    runs: AtomicUsize,
    refreshes: AtomicUsize,
}

impl VecInput {
    /// Emit `items` then return
    pub fn new<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Bytes>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            hold_open: false,
            runs: AtomicUsize::new(0),
            refreshes: AtomicUsize::new(0),
        }
    }

    /// Keep running after the last item until cancelled
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// Number of times `run` was entered
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    /// Number of `refresh` calls
    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Input for VecInput {
    async fn bind(&self, _ctx: &PipelineContext) -> PluginResult<()> {
        Ok(())
    }

    async fn run(&self, ctx: &PipelineContext) -> PluginResult<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        for item in &self.items {
            if ctx.emit(item.clone()).await.is_err() {
                return Ok(());
            }
        }
        if self.hold_open {
            ctx.cancelled().await;
        }
        Ok(())
    }

    fn refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Filter that passes everything through
pub struct PassFilter;

#[async_trait]
impl Filter for PassFilter {
    fn apply(&self, item: Bytes) -> Result<Bytes, FilterError> {
        Ok(item)
    }
}

/// Filter that rejects every `n`th item (1-based)
pub struct FailEveryNth {
    n: usize,
    seen: AtomicUsize,
}

impl FailEveryNth {
    /// Reject items n, 2n, 3n, ...
    pub fn new(n: usize) -> Self {
        Self {
            n,
            seen: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Filter for FailEveryNth {
    fn apply(&self, item: Bytes) -> Result<Bytes, FilterError> {
        let seen = self.seen.fetch_add(1, Ordering::SeqCst) + 1;
        if seen % self.n == 0 {
            Err(FilterError::rejected(format!("item {seen}")))
        } else {
            Ok(item)
        }
    }
}

/// Output that records every batch it is given
///
/// Bind and write can be slowed down; both delays end early when the
/// pipeline is cancelled.
#[derive(Default)]
pub struct RecordingOutput {
    batches: Mutex<Vec<Vec<Bytes>>>,
    bind_delay: Option<Duration>,
    write_delay: Option<Duration>,
    fail_bind: bool,
    cancel: Mutex<Option<CancellationToken>>,
    refreshes: AtomicUsize,
}

impl RecordingOutput {
    /// Output that binds and writes instantly
    pub fn new() -> Self {
        Self::default()
    }

    /// Stall `bind` for `delay`
    pub fn with_bind_delay(mut self, delay: Duration) -> Self {
        self.bind_delay = Some(delay);
        self
    }

    /// Stall every `write` for `delay`
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    /// Make `bind` fail
    pub fn failing_bind(mut self) -> Self {
        self.fail_bind = true;
        self
    }

    /// Every batch written so far
    pub fn batches(&self) -> Vec<Vec<Bytes>> {
        self.batches.lock().clone()
    }

    /// Sizes of the batches written so far
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().iter().map(Vec::len).collect()
    }

    /// All written payloads in order
    pub fn items(&self) -> Vec<Bytes> {
        self.batches.lock().iter().flatten().cloned().collect()
    }

    /// Number of `refresh` calls
    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    async fn pause(&self, delay: Option<Duration>) {
        let Some(delay) = delay else {
            return;
        };
        let cancel = self.cancel.lock().clone().unwrap_or_default();
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

#[async_trait]
impl Output for RecordingOutput {
    async fn bind(&self, ctx: &PipelineContext) -> PluginResult<()> {
        *self.cancel.lock() = Some(ctx.cancellation_token());
        self.pause(self.bind_delay).await;
        if self.fail_bind {
            return Err(PluginError::init("sink unavailable"));
        }
        Ok(())
    }

    async fn write(&self, batch: &[Packet]) {
        self.pause(self.write_delay).await;
        let items = batch.iter().map(|p| p.data().clone()).collect();
        self.batches.lock().push(items);
    }

    fn refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Poll `condition` every 5ms until it holds or `timeout` passes
pub async fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

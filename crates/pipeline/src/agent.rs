//! Agent - pipeline lifecycle controller
//!
//! Owns the channel topology and the plugin registry, starts the stage
//! runners in dependency order and exposes the administrative operations.
//!
//! # Startup
//!
//! ```text
//! start()
//!   1. monitor task (optional)
//!   2. egress runner ── Output::bind ──┐
//!   3. wait on startup barrier ←───────┘  (bind error = fatal)
//!   4. Filter::bind, filter runner
//!   5. Input::bind, ingestion runner
//! ```
//!
//! Until the output is bound nothing is read from the source, so a sink
//! that never comes up costs at most one ingest queue of memory.
//!
//! # Shutdown
//!
//! Closes the cancellation signal, then the ingest queue, then the egress
//! queue, and waits for every stage task. Anything still queued or
//! half-batched is dropped. Calling `shutdown` twice is an error.

use std::fmt::Write as _;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use ferry_config::{Config, PluginConfigs};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::context::PipelineContext;
use crate::error::{PipelineError, PluginError, Result};
use crate::metrics::{MetricsSnapshot, PipelineMetrics};
use crate::monitor::run_monitor;
use crate::plugin::PluginKind;
use crate::queue::{EGRESS_QUEUE, INGEST_QUEUE, Queue};
use crate::registry::PluginRegistry;
use crate::runner::{EgressRunner, StageState, StageStatus, run_filter, run_input};
use crate::signal::CancelSignal;

/// Sizing and plugin selection for one agent
#[derive(Debug, Clone)]
pub struct AgentOptions {
    /// Agent identifier
    pub id: String,
    /// Agent group
    pub group: String,
    /// Input plugin name
    pub input: String,
    /// Filter plugin name
    pub filter: String,
    /// Output plugin name
    pub output: String,
    /// Ingest queue capacity
    pub ingest_capacity: usize,
    /// Egress queue capacity
    pub egress_capacity: usize,
    /// Extra packets drained per batch
    pub max_batch: usize,
    /// Egress sleep when idle
    pub idle_poll: Duration,
    /// Monitor interval, `None` to disable
    pub monitor_interval: Option<Duration>,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl AgentOptions {
    /// Build options from the process configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            id: config.agent.id.clone(),
            group: config.agent.group.clone(),
            input: config.pipeline.input.clone(),
            filter: config.pipeline.filter.clone(),
            output: config.pipeline.output.clone(),
            ingest_capacity: config.agent.ingest_queue_size,
            egress_capacity: config.agent.egress_queue_size,
            max_batch: config.agent.max_batch_size,
            idle_poll: config.agent.idle_poll_interval,
            monitor_interval: config
                .monitor
                .enabled
                .then_some(config.monitor.interval),
        }
    }

    /// Select the three plugins
    pub fn with_plugins(
        mut self,
        input: impl Into<String>,
        filter: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        self.input = input.into();
        self.filter = filter.into();
        self.output = output.into();
        self
    }
}

/// Items removed by one drain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DrainReport {
    /// Removed from the ingest queue
    pub ingest: usize,
    /// Removed from the egress queue
    pub egress: usize,
}

impl DrainReport {
    /// Total items removed
    pub fn total(&self) -> usize {
        self.ingest + self.egress
    }
}

/// State of each stage runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageStates {
    /// Ingestion runner
    pub input: StageState,
    /// Filter runner
    pub filter: StageState,
    /// Egress runner
    pub output: StageState,
}

#[derive(Default)]
struct Stages {
    input: StageStatus,
    filter: StageStatus,
    output: StageStatus,
}

/// The pipeline lifecycle controller
pub struct Agent {
    options: AgentOptions,
    registry: PluginRegistry,
    plugin_configs: PluginConfigs,
    ingest: Queue,
    egress: Queue,
    cancel: CancelSignal,
    input_finished: CancellationToken,
    metrics: Arc<PipelineMetrics>,
    stages: Stages,
    started: AtomicBool,
    tasks: Mutex<Vec<(&'static str, JoinHandle<()>)>>,
    drain_lock: Mutex<()>,
    created_at: Instant,
}

impl Agent {
    /// Build the channel topology
    ///
    /// Nothing runs until [`start`](Self::start).
    pub fn new(options: AgentOptions, registry: PluginRegistry, plugin_configs: PluginConfigs) -> Self {
        Self {
            ingest: Queue::bounded(INGEST_QUEUE, options.ingest_capacity),
            egress: Queue::bounded(EGRESS_QUEUE, options.egress_capacity),
            options,
            registry,
            plugin_configs,
            cancel: CancelSignal::new(),
            input_finished: CancellationToken::new(),
            metrics: Arc::new(PipelineMetrics::new()),
            stages: Stages::default(),
            started: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
            drain_lock: Mutex::new(()),
            created_at: Instant::now(),
        }
    }

    /// Start the stages in dependency order
    ///
    /// Returns once the input is running.
    ///
    /// # Errors
    ///
    /// Unknown plugin names and bind failures are returned before anything
    /// reads from the source. Calling `start` twice returns `AlreadyStarted`.
    pub async fn start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(PipelineError::AlreadyStarted);
        }
        if self.cancel.is_closed() {
            return Err(PipelineError::ShuttingDown);
        }

        let opts = &self.options;
        let input = self.registry.input(&opts.input)?;
        let filter = self.registry.filter(&opts.filter)?;
        let output = self.registry.output(&opts.output)?;

        tracing::info!(
            agent_id = %opts.id,
            input = %opts.input,
            filter = %opts.filter,
            output = %opts.output,
            ingest_capacity = opts.ingest_capacity,
            egress_capacity = opts.egress_capacity,
            max_batch = opts.max_batch,
            "starting pipeline"
        );

        // 1. monitor
        if let Some(interval) = opts.monitor_interval {
            self.spawn(
                "monitor",
                run_monitor(
                    interval,
                    Arc::clone(&self.metrics),
                    self.ingest.clone(),
                    self.egress.clone(),
                    self.cancel.child_token(),
                ),
            )?;
        }

        // 2. egress
        let (ready_tx, ready_rx) = oneshot::channel();
        let runner = EgressRunner::new(
            output,
            self.context(PluginKind::Output, &opts.output),
            opts.max_batch,
            opts.idle_poll,
            self.stages.output.clone(),
        );
        self.spawn("egress", runner.run(ready_tx))?;

        // 3. startup barrier
        let bound = tokio::select! {
            biased;
            _ = self.cancel.closed() => return Err(PipelineError::ShuttingDown),
            bound = ready_rx => bound,
        };
        match bound {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(PipelineError::bind(PluginKind::Output, &opts.output, e)),
            Err(_) => {
                return Err(PipelineError::bind(
                    PluginKind::Output,
                    &opts.output,
                    PluginError::runtime("egress runner exited before binding"),
                ));
            }
        }
        tracing::debug!(output = %opts.output, "output bound");

        // 4. filter
        let ctx = self.context(PluginKind::Filter, &opts.filter);
        self.stages.filter.set(StageState::Binding);
        tokio::select! {
            biased;
            _ = self.cancel.closed() => return Err(PipelineError::ShuttingDown),
            bound = filter.bind(&ctx) => {
                bound.map_err(|e| PipelineError::bind(PluginKind::Filter, &opts.filter, e))?;
            }
        }
        self.spawn("filter", run_filter(filter, ctx, self.stages.filter.clone()))?;

        // 5. input
        let ctx = self.context(PluginKind::Input, &opts.input);
        self.stages.input.set(StageState::Binding);
        tokio::select! {
            biased;
            _ = self.cancel.closed() => return Err(PipelineError::ShuttingDown),
            bound = input.bind(&ctx) => {
                bound.map_err(|e| PipelineError::bind(PluginKind::Input, &opts.input, e))?;
            }
        }
        self.spawn(
            "input",
            run_input(
                input,
                ctx,
                self.stages.input.clone(),
                self.input_finished.clone(),
            ),
        )?;

        tracing::info!("pipeline started");
        Ok(())
    }

    /// Stop every stage and wait for them to return
    ///
    /// # Errors
    ///
    /// Returns `AlreadyShutdown` if called more than once.
    pub async fn shutdown(&self) -> Result<()> {
        if !self.cancel.close() {
            return Err(PipelineError::AlreadyShutdown);
        }

        tracing::info!(
            ingest_len = self.ingest.len(),
            egress_len = self.egress.len(),
            "shutting down pipeline"
        );

        self.ingest.close()?;
        self.egress.close()?;

        let tasks = std::mem::take(&mut *self.tasks.lock());
        for (stage, handle) in tasks {
            match handle.await {
                Ok(()) => tracing::debug!(stage, "stage stopped"),
                Err(e) if e.is_panic() => tracing::error!(stage, "stage panicked"),
                Err(e) => tracing::warn!(stage, error = %e, "stage task failed"),
            }
        }

        let s = self.metrics.snapshot();
        tracing::info!(
            ingested = s.items_ingested,
            filtered = s.items_filtered,
            rejected = s.filter_rejected,
            batches = s.batches_written,
            packets = s.packets_written,
            "pipeline stopped"
        );
        Ok(())
    }

    /// Discard everything currently buffered in both queues
    ///
    /// Does not close the queues or stop the stages. Items already taken
    /// by a runner are not affected.
    pub fn empty(&self) -> DrainReport {
        let _guard = self.drain_lock.lock();

        let report = DrainReport {
            ingest: self.ingest.drain(),
            egress: self.egress.drain(),
        };
        self.metrics.record_drained(report.total());

        tracing::info!(
            ingest = report.ingest,
            egress = report.egress,
            "queues emptied"
        );
        report
    }

    /// Call the refresh hook of the input and the output
    pub fn refresh(&self) {
        if !self.is_started() || self.is_shutdown() {
            tracing::warn!("refresh ignored, pipeline not running");
            return;
        }

        if let Ok(input) = self.registry.input(&self.options.input) {
            input.refresh();
        }
        if let Ok(output) = self.registry.output(&self.options.output) {
            output.refresh();
        }
        tracing::info!(
            input = %self.options.input,
            output = %self.options.output,
            "plugins refreshed"
        );
    }

    /// Resolves once the ingestion runner has returned
    pub fn input_finished(&self) -> WaitForCancellationFuture<'_> {
        self.input_finished.cancelled()
    }

    /// Check if `start` has been called
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Check if `shutdown` has been called
    pub fn is_shutdown(&self) -> bool {
        self.cancel.is_closed()
    }

    /// Agent options
    pub fn options(&self) -> &AgentOptions {
        &self.options
    }

    /// Plugin registry
    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Queue between the input and the filter
    pub fn ingest_queue(&self) -> &Queue {
        &self.ingest
    }

    /// Queue between the filter and the output
    pub fn egress_queue(&self) -> &Queue {
        &self.egress
    }

    /// Current counters
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Current state of each stage runner
    pub fn stage_states(&self) -> StageStates {
        StageStates {
            input: self.stages.input.get(),
            filter: self.stages.filter.get(),
            output: self.stages.output.get(),
        }
    }

    /// Time since the agent was created
    pub fn uptime(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Human-readable state dump
    pub fn debug_dump(&self) -> String {
        let opts = &self.options;
        let stages = self.stage_states();
        let s = self.metrics.snapshot();
        let mut out = String::new();

        let _ = writeln!(out, "agent: {} (group {})", opts.id, opts.group);
        let _ = writeln!(out, "uptime: {}s", self.uptime().as_secs());
        let _ = writeln!(
            out,
            "started: {}  shutdown: {}",
            self.is_started(),
            self.is_shutdown()
        );
        let _ = writeln!(
            out,
            "plugins: input={} filter={} output={}",
            opts.input, opts.filter, opts.output
        );
        let _ = writeln!(
            out,
            "stages: input={} filter={} output={}",
            stages.input, stages.filter, stages.output
        );
        for queue in [&self.ingest, &self.egress] {
            let _ = writeln!(
                out,
                "queue {}: len={} capacity={} closed={}",
                queue.name(),
                queue.len(),
                queue.capacity(),
                queue.is_closed()
            );
        }
        let _ = writeln!(
            out,
            "batching: max_batch={} idle_poll={}ms",
            opts.max_batch,
            opts.idle_poll.as_millis()
        );
        let _ = writeln!(
            out,
            "metrics: ingested={} ingest_dropped={} filtered={} rejected={} batches={} packets={} bytes={} max_batch_seen={} drained={}",
            s.items_ingested,
            s.ingest_dropped,
            s.items_filtered,
            s.filter_rejected,
            s.batches_written,
            s.packets_written,
            s.bytes_written,
            s.max_batch_seen,
            s.items_drained
        );
        out
    }

    fn context(&self, kind: PluginKind, name: &str) -> PipelineContext {
        PipelineContext::new(
            kind,
            self.plugin_configs.resolve(name),
            self.ingest.clone(),
            self.egress.clone(),
            self.cancel.child_token(),
            Arc::clone(&self.metrics),
        )
    }

    /// Spawn a stage task unless shutdown has begun
    ///
    /// The closed check runs under the task lock, so `shutdown` either
    /// sees the new handle or the task is never spawned.
    fn spawn<F>(&self, stage: &'static str, fut: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock();
        if self.cancel.is_closed() {
            return Err(PipelineError::ShuttingDown);
        }
        tasks.push((stage, tokio::spawn(fut)));
        Ok(())
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.options.id)
            .field("started", &self.is_started())
            .field("shutdown", &self.is_shutdown())
            .field("ingest", &self.ingest)
            .field("egress", &self.egress)
            .finish()
    }
}

#[cfg(test)]
#[path = "agent_test.rs"]
mod tests;

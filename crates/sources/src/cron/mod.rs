//! Cron Input - Fixed payloads on cron schedules
//!
//! Each job maps a cron expression (with a leading seconds field) to the
//! payloads emitted every time it fires:
//!
//! ```toml
//! "@pluginName" = "cron"
//!
//! [jobs]
//! "0 */5 * * * *" = ["heartbeat"]
//! "30 0 3 * * * *" = ["nightly-a", "nightly-b"]
//! ```
//!
//! Schedules are evaluated in UTC. Firings missed while the pipeline was
//! blocked on a full queue are skipped, not replayed.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use ::cron::Schedule;
use ferry_config::ConfigError;
use ferry_pipeline::{Bytes, Input, PipelineContext, PluginError, PluginResult, async_trait};
use parking_lot::Mutex;
use serde::Deserialize;
use tokio::task::JoinSet;

#[cfg(test)]
#[path = "cron_test.rs"]
mod tests;

/// Registered name
pub const NAME: &str = "cron";

/// Options for the `cron` input
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CronConfig {
    /// Cron expression to payloads
    pub jobs: BTreeMap<String, Vec<String>>,
}

impl CronConfig {
    /// Add a job
    pub fn with_job<I, S>(mut self, expression: impl Into<String>, payloads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.jobs.insert(
            expression.into(),
            payloads.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Parse every expression
    pub fn schedules(&self, name: &str) -> Result<Vec<Job>, ConfigError> {
        if self.jobs.is_empty() {
            return Err(ConfigError::missing_field("input", name, "jobs"));
        }

        self.jobs
            .iter()
            .map(|(expression, payloads)| {
                let schedule = Schedule::from_str(expression).map_err(|e| {
                    ConfigError::invalid_value("input", name, "jobs", format!("'{expression}': {e}"))
                })?;
                Ok(Job {
                    expression: expression.clone(),
                    schedule,
                    payloads: payloads.iter().map(|p| Bytes::from(p.clone())).collect(),
                })
            })
            .collect()
    }
}

/// A parsed cron job
#[derive(Debug, Clone)]
pub struct Job {
    expression: String,
    schedule: Schedule,
    payloads: Vec<Bytes>,
}

impl Job {
    /// Source expression
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Time until the next firing after now
    pub fn next_delay(&self) -> Option<Duration> {
        let now = Utc::now();
        let next = self.schedule.after(&now).next()?;
        Some((next - now).to_std().unwrap_or(Duration::ZERO))
    }

    /// Fire on schedule until cancelled
    async fn run(self, ctx: PipelineContext) {
        let mut last = Utc::now();

        loop {
            let Some(next) = self.schedule.after(&last).next() else {
                tracing::info!(parent: ctx.span(), job = %self.expression, "cron job has no further firings");
                return;
            };
            let wait = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);

            tokio::select! {
                biased;
                _ = ctx.cancelled() => return,
                _ = tokio::time::sleep(wait) => {}
            }

            tracing::trace!(parent: ctx.span(), job = %self.expression, %next, "cron job fired");
            for payload in &self.payloads {
                if ctx.emit(payload.clone()).await.is_err() {
                    return;
                }
            }
            last = next.max(Utc::now());
        }
    }
}

/// Emits configured payloads on cron schedules
#[derive(Debug, Default)]
pub struct CronInput {
    jobs: Mutex<Vec<Job>>,
}

impl CronInput {
    /// Create the input; jobs are read at bind
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Input for CronInput {
    async fn bind(&self, ctx: &PipelineContext) -> PluginResult<()> {
        let config: CronConfig = ctx.decode_config()?;
        let jobs = config.schedules(ctx.name())?;

        tracing::info!(parent: ctx.span(), jobs = jobs.len(), "cron input bound");
        *self.jobs.lock() = jobs;
        Ok(())
    }

    async fn run(&self, ctx: &PipelineContext) -> PluginResult<()> {
        let jobs = std::mem::take(&mut *self.jobs.lock());
        if jobs.is_empty() {
            return Err(PluginError::runtime("cron input run before bind"));
        }

        let mut tasks = JoinSet::new();
        for job in jobs {
            tasks.spawn(job.run(ctx.clone()));
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(parent: ctx.span(), error = %e, "cron job panicked");
            }
        }

        Ok(())
    }
}

//! Stage runners
//!
//! One task per stage, each bound to a single plugin instance:
//!
//! ```text
//! Input::run ──→ [ingest queue] ──→ filter runner ──→ [egress queue] ──→ egress runner ──→ Output::write
//! ```
//!
//! The runners share nothing but the two queues, the cancellation signal
//! and the metrics counters.

mod egress;
mod filter;
mod ingest;

pub(crate) use egress::EgressRunner;
pub(crate) use filter::run_filter;
pub(crate) use ingest::run_input;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::Serialize;

/// Where a stage runner is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageState {
    /// Not started yet
    Idle,
    /// Binding its plugin
    Binding,
    /// Processing items
    Running,
    /// Returned
    Stopped,
}

impl StageState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Binding,
            2 => Self::Running,
            3 => Self::Stopped,
            _ => Self::Idle,
        }
    }

    /// Lowercase state name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Binding => "binding",
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared, lock-free stage state
#[derive(Debug, Clone, Default)]
pub(crate) struct StageStatus(Arc<AtomicU8>);

impl StageStatus {
    pub(crate) fn set(&self, state: StageState) {
        self.0.store(state as u8, Ordering::Release);
    }

    pub(crate) fn get(&self) -> StageState {
        StageState::from_u8(self.0.load(Ordering::Acquire))
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;

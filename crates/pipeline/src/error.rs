//! Pipeline error types
//!
//! Errors raised by the lifecycle controller, the queues and the plugins.

use bytes::Bytes;
use ferry_config::ConfigError;
use thiserror::Error;

use crate::plugin::PluginKind;

/// Lifecycle errors
///
/// Every variant except `ShuttingDown` is fatal to the process: a
/// half-wired pipeline is never left running.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No plugin registered under the configured name
    #[error("unknown {kind} plugin '{name}' (available: {available})")]
    UnknownPlugin {
        /// Stage the plugin was configured for
        kind: PluginKind,
        /// Configured name
        name: String,
        /// Registered names for this stage
        available: String,
    },

    /// A plugin failed to bind
    #[error("{kind} plugin '{name}' failed to bind: {source}")]
    Bind {
        /// Stage of the plugin
        kind: PluginKind,
        /// Plugin name
        name: String,
        /// Underlying plugin error
        #[source]
        source: PluginError,
    },

    /// `start` was called twice
    #[error("pipeline already started")]
    AlreadyStarted,

    /// `shutdown` was called twice
    #[error("pipeline already shut down")]
    AlreadyShutdown,

    /// A queue was closed twice
    #[error("queue '{0}' already closed")]
    QueueAlreadyClosed(&'static str),

    /// Shutdown was requested while starting
    #[error("pipeline is shutting down")]
    ShuttingDown,
}

impl PipelineError {
    /// Create an UnknownPlugin error
    pub fn unknown_plugin(kind: PluginKind, name: impl Into<String>, available: &[&str]) -> Self {
        Self::UnknownPlugin {
            kind,
            name: name.into(),
            available: available.join(", "),
        }
    }

    /// Create a Bind error
    pub fn bind(kind: PluginKind, name: impl Into<String>, source: PluginError) -> Self {
        Self::Bind {
            kind,
            name: name.into(),
            source,
        }
    }
}

/// Errors reported by plugins from `bind` and `run`
#[derive(Debug, Error)]
pub enum PluginError {
    /// Options failed to decode or validate
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// I/O failure with context
    #[error("{context}: {source}")]
    Io {
        /// What the plugin was doing
        context: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Plugin-specific initialization failure
    #[error("initialization failed: {0}")]
    Init(String),

    /// Runtime failure
    #[error("{0}")]
    Runtime(String),
}

impl PluginError {
    /// Create an Io error
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an Init error
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    /// Create a Runtime error
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }
}

/// Error returned by `Filter::apply`; the item is dropped
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The payload did not pass the filter
    #[error("rejected: {0}")]
    Rejected(String),
}

impl FilterError {
    /// Create a Rejected error
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }
}

/// Queue operation errors
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum QueueError {
    /// The queue (or the pipeline) has been closed
    #[error("queue closed")]
    Closed,

    /// Non-blocking send found the queue at capacity
    #[error("queue full")]
    Full,

    /// Non-blocking receive found nothing buffered
    #[error("queue empty")]
    Empty,
}

/// Failed non-blocking send, handing the item back to the caller
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TrySendError {
    /// The queue was at capacity
    #[error("queue full")]
    Full(Bytes),

    /// The queue has been closed
    #[error("queue closed")]
    Closed(Bytes),
}

impl TrySendError {
    /// The item that was not sent
    pub fn into_inner(self) -> Bytes {
        match self {
            Self::Full(item) | Self::Closed(item) => item,
        }
    }

    /// The failure without the item
    pub fn kind(&self) -> QueueError {
        match self {
            Self::Full(_) => QueueError::Full,
            Self::Closed(_) => QueueError::Closed,
        }
    }
}

impl From<TrySendError> for QueueError {
    fn from(err: TrySendError) -> Self {
        err.kind()
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Result type for plugin operations
pub type PluginResult<T> = std::result::Result<T, PluginError>;

//! Valid Filter - Drops payloads that carry no data
//!
//! The default filter. Rejects empty payloads with "null data"; optional
//! checks can also reject whitespace-only or oversized payloads.
//!
//! # Options
//!
//! ```toml
//! "@pluginName" = "valid"
//! reject_blank = true    # default false
//! max_size = 65536       # bytes, 0 = unlimited (default)
//! ```

mod config;

use ferry_pipeline::{
    Bytes, Filter, FilterError, PipelineContext, PluginResult, async_trait,
};
use parking_lot::RwLock;

pub use config::ValidConfig;

#[cfg(test)]
#[path = "valid_test.rs"]
mod tests;

/// Registered name
pub const NAME: &str = "valid";

/// Rejection reason for empty payloads
pub const NULL_DATA: &str = "null data";

/// Rejects empty (and optionally blank or oversized) payloads
#[derive(Debug, Default)]
pub struct ValidFilter {
    config: RwLock<ValidConfig>,
}

impl ValidFilter {
    /// Filter with default options (only empty payloads are rejected)
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter with explicit options
    pub fn with_config(config: ValidConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }
}

#[async_trait]
impl Filter for ValidFilter {
    async fn bind(&self, ctx: &PipelineContext) -> PluginResult<()> {
        let config: ValidConfig = ctx.decode_config()?;
        tracing::debug!(
            parent: ctx.span(),
            reject_blank = config.reject_blank,
            max_size = config.max_size,
            "valid filter bound"
        );
        *self.config.write() = config;
        Ok(())
    }

    fn apply(&self, item: Bytes) -> Result<Bytes, FilterError> {
        if item.is_empty() {
            return Err(FilterError::rejected(NULL_DATA));
        }

        let config = self.config.read();
        if config.max_size > 0 && item.len() > config.max_size {
            return Err(FilterError::rejected(format!(
                "payload of {} bytes exceeds max_size {}",
                item.len(),
                config.max_size
            )));
        }
        if config.reject_blank && item.iter().all(u8::is_ascii_whitespace) {
            return Err(FilterError::rejected("blank data"));
        }

        Ok(item)
    }
}

//! Noop Filter - Pass-through filter
//!
//! Forwards every item unchanged, including empty ones. Useful when the
//! input already guarantees well-formed payloads, and for measuring the
//! filter stage's own overhead.

use ferry_pipeline::{Bytes, Filter, FilterError, async_trait};

#[cfg(test)]
mod noop_test;

/// Registered name
pub const NAME: &str = "noop";

/// A filter that passes items through unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFilter;

impl NoopFilter {
    /// Create a new noop filter
    #[inline]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Filter for NoopFilter {
    #[inline]
    fn apply(&self, item: Bytes) -> Result<Bytes, FilterError> {
        Ok(item)
    }
}

//! Valid filter configuration

use serde::Deserialize;

/// Options for the `valid` filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidConfig {
    /// Also reject payloads made only of ASCII whitespace
    pub reject_blank: bool,

    /// Reject payloads longer than this many bytes (0 = unlimited)
    pub max_size: usize,
}

impl ValidConfig {
    /// Set blank rejection
    pub fn with_reject_blank(mut self, reject: bool) -> Self {
        self.reject_blank = reject;
        self
    }

    /// Set the size limit
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }
}

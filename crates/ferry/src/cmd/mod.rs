//! Command implementations for the ferry CLI

pub mod plugins;
pub mod serve;

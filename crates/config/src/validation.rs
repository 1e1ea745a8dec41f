//! Configuration validation
//!
//! Validates config consistency:
//! - Queue capacities, batch size and poll interval are non-zero
//! - Every stage names a plugin
//! - The admin API has a port when enabled
//! - The monitor has a non-zero interval when enabled

use crate::Config;
use crate::error::{ConfigError, Result};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_agent(config)?;
    validate_pipeline(config)?;
    validate_api_server(config)?;
    validate_monitor(config)?;
    Ok(())
}

fn validate_agent(config: &Config) -> Result<()> {
    let agent = &config.agent;

    for (field, value) in [
        ("ingest_queue_size", agent.ingest_queue_size),
        ("egress_queue_size", agent.egress_queue_size),
        ("max_batch_size", agent.max_batch_size),
    ] {
        if value == 0 {
            return Err(ConfigError::invalid_value(
                "agent",
                &agent.id,
                field,
                "must be greater than 0",
            ));
        }
    }

    if agent.idle_poll_interval.is_zero() {
        return Err(ConfigError::invalid_value(
            "agent",
            &agent.id,
            "idle_poll_interval",
            "must be greater than 0",
        ));
    }

    Ok(())
}

fn validate_pipeline(config: &Config) -> Result<()> {
    let pipeline = &config.pipeline;

    for (stage, name) in [
        ("input", &pipeline.input),
        ("filter", &pipeline.filter),
        ("output", &pipeline.output),
    ] {
        if name.trim().is_empty() {
            return Err(ConfigError::missing_field("pipeline", stage, "name"));
        }
    }

    Ok(())
}

fn validate_api_server(config: &Config) -> Result<()> {
    let api = &config.api_server;
    if api.enabled && api.port == 0 {
        return Err(ConfigError::invalid_value(
            "api_server",
            &api.host,
            "port",
            "must be non-zero when the admin API is enabled",
        ));
    }
    Ok(())
}

fn validate_monitor(config: &Config) -> Result<()> {
    if config.monitor.enabled && config.monitor.interval.is_zero() {
        return Err(ConfigError::invalid_value(
            "monitor",
            "monitor",
            "interval",
            "must be greater than 0",
        ));
    }
    Ok(())
}

// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::*;
use anyhow::{bail, Result};
use stream2buckets_core::PartitionPattern;
use tracing::warn;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_source_config(&config.source)?;
    validate_sink_config(&config.sink)?;
    validate_filter_config(&config.filter)?;
    validate_log_config(&config.logging)?;
    Ok(())
}

fn validate_source_config(config: &SourceConfig) -> Result<()> {
    if config.stream_name.is_empty() {
        bail!("source.stream_name must not be empty");
    }

    if config.region.is_empty() {
        bail!("source.region must not be empty");
    }

    Ok(())
}

fn validate_sink_config(config: &SinkConfig) -> Result<()> {
    if config.output_path.is_empty() {
        bail!("sink.output_path must not be empty");
    }

    // Fail fast on patterns the assigner would reject; an empty pattern is
    // valid and yields a bare `ts=` bucket
    PartitionPattern::compile(&config.partition_format)?;

    if let Some(parallelism) = config.parallelism {
        if parallelism == 0 {
            bail!("sink.parallelism must be greater than 0");
        }

        if parallelism > 1024 {
            warn!(
                parallelism = parallelism,
                "sink.parallelism is very large; each sink instance keeps its own open buckets"
            );
        }
    }

    Ok(())
}

fn validate_filter_config(config: &FilterConfig) -> Result<()> {
    if !config.min_price.is_finite() {
        bail!("filter.min_price must be a finite number");
    }

    Ok(())
}

fn validate_log_config(config: &LogConfig) -> Result<()> {
    if config.level.is_empty() {
        bail!("logging.level must not be empty");
    }

    Ok(())
}

use crate::{InitialPosition, LogFormat, RecordKind, RuntimeConfig};
use anyhow::{anyhow, Context, Result};
use std::str::FromStr;

pub const ENV_PREFIX: &str = "STREAM2BUCKETS_";

/// Abstraction over environment-variable lookups so tests can supply their
/// own source of overrides.
pub trait EnvSource {
    /// Get a variable by its key without the STREAM2BUCKETS_ prefix
    fn get(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides (highest priority) to the runtime config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    // Source
    if let Some(name) = env.get("STREAM_NAME") {
        config.source.stream_name = name;
    }
    if let Some(region) = env.get("REGION") {
        config.source.region = region;
    }
    if let Some(position) = env.get("INITIAL_POSITION") {
        config.source.initial_position = position
            .parse::<InitialPosition>()
            .context("Invalid STREAM2BUCKETS_INITIAL_POSITION value")?;
    }
    if let Some(kind) = env.get("RECORD_KIND") {
        config.source.record_kind = kind
            .parse::<RecordKind>()
            .map_err(|e| anyhow!("Invalid STREAM2BUCKETS_RECORD_KIND value: {}", e))?;
    }

    // Sink
    if let Some(path) = env.get("OUTPUT_PATH") {
        config.sink.output_path = path;
    }
    if let Some(format) = env.get("PARTITION_FORMAT") {
        config.sink.partition_format = format;
    }
    if let Some(app_name) = env.get("APP_NAME") {
        config.sink.app_name = app_name;
    }
    if let Some(parallelism) = get_env_parsed::<usize, _>(env, "SINK_PARALLELISM")? {
        config.sink.parallelism = Some(parallelism);
    }
    if let Some(millis) = get_env_parsed::<i64, _>(env, "JOB_START_MILLIS")? {
        config.sink.job_start_millis = Some(millis);
    }

    // Filter
    if let Some(min_price) = get_env_parsed::<f64, _>(env, "MIN_PRICE")? {
        config.filter.min_price = min_price;
    }

    // Logging
    if let Some(level) = env.get("LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(format) = env.get("LOG_FORMAT") {
        config.logging.format = match format.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };
    }

    Ok(())
}

fn get_env_parsed<T, E>(env: &E, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    E: EnvSource,
{
    match env.get(key) {
        Some(val) => {
            let parsed = val
                .parse::<T>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

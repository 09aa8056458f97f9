// stream2buckets-config - Unified configuration for local and managed runs
//
// Supports configuration from multiple sources:
// 1. Environment variables (highest priority)
// 2. Managed application properties (BlueprintMetadata property group)
// 3. Config file path from STREAM2BUCKETS_CONFIG env var
// 4. Config file contents from STREAM2BUCKETS_CONFIG_CONTENT env var
// 5. Default config file locations (./config.toml, ./.stream2buckets.toml)
// 6. Mode-specific defaults (lowest priority)

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

mod env_overrides;
mod mode;
mod properties;
mod sources;
mod validation;

pub use env_overrides::{apply_env_overrides, EnvSource, ENV_PREFIX};
pub use mode::{RuntimeMode, DEFAULT_PROPERTIES_FILE};
pub use properties::{
    apply_blueprint_properties, load_property_groups, parse_property_groups, PropertyGroup,
    BLUEPRINT_PROPERTY_GROUP,
};
pub use stream2buckets_core::RecordKind;

/// Main runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub sink: SinkConfig,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub logging: LogConfig,
}

/// Where records come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub stream_name: String,
    pub region: String,
    #[serde(default)]
    pub initial_position: InitialPosition,
    #[serde(default)]
    pub record_kind: RecordKind,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            stream_name: "myKinesisStream".to_string(),
            region: "us-east-1".to_string(),
            initial_position: InitialPosition::Latest,
            record_kind: RecordKind::Stock,
        }
    }
}

/// Starting position of a stream consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InitialPosition {
    #[default]
    Latest,
    TrimHorizon,
    AtTimestamp,
}

impl std::fmt::Display for InitialPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InitialPosition::Latest => write!(f, "LATEST"),
            InitialPosition::TrimHorizon => write!(f, "TRIM_HORIZON"),
            InitialPosition::AtTimestamp => write!(f, "AT_TIMESTAMP"),
        }
    }
}

impl std::str::FromStr for InitialPosition {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "LATEST" => Ok(InitialPosition::Latest),
            "TRIM_HORIZON" => Ok(InitialPosition::TrimHorizon),
            "AT_TIMESTAMP" => Ok(InitialPosition::AtTimestamp),
            _ => anyhow::bail!(
                "Unsupported initial position: {}. Supported: LATEST, TRIM_HORIZON, AT_TIMESTAMP",
                s
            ),
        }
    }
}

/// Where partitioned output goes and how it is bucketed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkConfig {
    pub output_path: String,
    #[serde(default = "default_partition_format")]
    pub partition_format: String,
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_start_millis: Option<i64>,
}

fn default_partition_format() -> String {
    stream2buckets_core::DEFAULT_PARTITION_FORMAT.to_string()
}

fn default_app_name() -> String {
    "app-kda-kafka-to-s3".to_string()
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            output_path: "/tmp/flinkout".to_string(),
            partition_format: default_partition_format(),
            app_name: default_app_name(),
            parallelism: None,
            job_start_millis: None,
        }
    }
}

impl SinkConfig {
    /// Prefix placed in front of every partition path:
    /// `{app_name}/job_start={millis}/`.
    ///
    /// Uses the configured job start when set, otherwise the current time.
    pub fn bucket_prefix(&self) -> String {
        let millis = self
            .job_start_millis
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
        format!("{}/job_start={}/", self.app_name, millis)
    }
}

/// Record filter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Records priced below this are dropped
    pub min_price: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { min_price: 1.0 }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl RuntimeConfig {
    /// Defaults for a runtime mode, before any file, property, or env overrides
    pub fn from_mode_defaults(mode: RuntimeMode) -> Self {
        match mode {
            RuntimeMode::Local => Self {
                source: SourceConfig::default(),
                sink: SinkConfig::default(),
                filter: FilterConfig::default(),
                logging: LogConfig::default(),
            },
            // Managed runs must be told where to read and write
            RuntimeMode::Managed => Self {
                source: SourceConfig {
                    stream_name: String::new(),
                    region: String::new(),
                    ..SourceConfig::default()
                },
                sink: SinkConfig {
                    output_path: String::new(),
                    ..SinkConfig::default()
                },
                filter: FilterConfig::default(),
                logging: LogConfig {
                    format: LogFormat::Json,
                    ..LogConfig::default()
                },
            },
        }
    }

    /// Layer a parsed config file over this configuration.
    ///
    /// Keys present in the file replace current values one at a time, so a
    /// section that sets a single key keeps the mode defaults for the rest.
    pub fn merge_toml(&mut self, file: toml::Table) -> Result<()> {
        let mut merged = match toml::Value::try_from(&*self)? {
            toml::Value::Table(table) => table,
            other => bail!("configuration serialized to {} instead of a table", other.type_str()),
        };
        merge_tables(&mut merged, file);
        *self = toml::Value::Table(merged)
            .try_into()
            .context("Invalid configuration values")?;
        Ok(())
    }

    /// Load configuration from all sources with priority
    pub fn load() -> Result<Self> {
        sources::load_config(RuntimeMode::detect())
    }

    /// Load configuration for a specific mode (useful for testing)
    pub fn load_for_mode(mode: RuntimeMode) -> Result<Self> {
        sources::load_config(mode)
    }

    /// Load configuration starting from an explicit file (CLI --config flag)
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        sources::load_from_file_path(path, RuntimeMode::detect())
    }

    /// Parse inline TOML on top of the given mode's defaults, without
    /// consulting the process environment
    pub fn from_toml_str(mode: RuntimeMode, content: &str) -> Result<Self> {
        let mut config = Self::from_mode_defaults(mode);
        let file: toml::Table = toml::from_str(content)?;
        config.merge_toml(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(incoming) => match base.get_mut(&key) {
                Some(toml::Value::Table(existing)) => merge_tables(existing, incoming),
                _ => {
                    base.insert(key, toml::Value::Table(incoming));
                }
            },
            other => {
                base.insert(key, other);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_position_from_str() {
        assert_eq!(
            "latest".parse::<InitialPosition>().unwrap(),
            InitialPosition::Latest
        );
        assert_eq!(
            "TRIM_HORIZON".parse::<InitialPosition>().unwrap(),
            InitialPosition::TrimHorizon
        );
        assert!("EARLIEST".parse::<InitialPosition>().is_err());
    }

    #[test]
    fn test_default_configs() {
        let local = RuntimeConfig::from_mode_defaults(RuntimeMode::Local);
        assert_eq!(local.source.stream_name, "myKinesisStream");
        assert_eq!(local.sink.output_path, "/tmp/flinkout");
        assert_eq!(local.sink.partition_format, "yyyy-MM-dd-HH");
        assert_eq!(local.filter.min_price, 1.0);
        assert_eq!(local.logging.format, LogFormat::Text);

        let managed = RuntimeConfig::from_mode_defaults(RuntimeMode::Managed);
        assert!(managed.source.stream_name.is_empty());
        assert!(managed.sink.output_path.is_empty());
        assert_eq!(managed.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_bucket_prefix() {
        let sink = SinkConfig {
            job_start_millis: Some(1_709_300_700_000),
            ..SinkConfig::default()
        };
        assert_eq!(
            sink.bucket_prefix(),
            "app-kda-kafka-to-s3/job_start=1709300700000/"
        );

        let unset = SinkConfig::default();
        assert!(unset.bucket_prefix().starts_with("app-kda-kafka-to-s3/job_start="));
    }

    #[test]
    fn test_from_toml_str() {
        let config = RuntimeConfig::from_toml_str(
            RuntimeMode::Local,
            r#"
            [source]
            stream_name = "orders"
            region = "eu-west-1"
            initial_position = "TRIM_HORIZON"
            record_kind = "order"

            [sink]
            output_path = "s3://bucket/out"
            partition_format = "yyyy-MM-dd"
            parallelism = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.source.record_kind, RecordKind::Order);
        assert_eq!(config.source.initial_position, InitialPosition::TrimHorizon);
        assert_eq!(config.sink.partition_format, "yyyy-MM-dd");
        assert_eq!(config.sink.app_name, "app-kda-kafka-to-s3");
        assert_eq!(config.sink.parallelism, Some(4));
        assert_eq!(config.filter, FilterConfig::default());
    }

    #[test]
    fn test_partial_sections_keep_mode_defaults() {
        let config = RuntimeConfig::from_toml_str(
            RuntimeMode::Local,
            "[source]\nrecord_kind = \"order\"\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();
        assert_eq!(config.source.record_kind, RecordKind::Order);
        assert_eq!(config.source.stream_name, "myKinesisStream");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_merge_keeps_managed_log_format() {
        let mut config = RuntimeConfig::from_mode_defaults(RuntimeMode::Managed);
        let file: toml::Table = toml::from_str("[filter]\nmin_price = 2.5\n").unwrap();
        config.merge_toml(file).unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.filter.min_price, 2.5);
        assert!(config.source.stream_name.is_empty());
    }

    #[test]
    fn test_merge_rejects_mistyped_values() {
        let mut config = RuntimeConfig::from_mode_defaults(RuntimeMode::Local);
        let file: toml::Table = toml::from_str("[sink]\nparallelism = \"four\"\n").unwrap();
        assert!(config.merge_toml(file).is_err());
    }
}

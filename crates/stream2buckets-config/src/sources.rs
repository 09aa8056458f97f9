// Configuration source loading
//
// Priority order:
// 1. Environment variables (STREAM2BUCKETS_* prefix)
// 2. Managed application properties (managed mode only)
// 3. Config file path from STREAM2BUCKETS_CONFIG
// 4. Inline config content from STREAM2BUCKETS_CONFIG_CONTENT
// 5. Default config files (./config.toml, ./.stream2buckets.toml)
// 6. Mode defaults

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::mode::RuntimeMode;
use crate::properties;
use crate::RuntimeConfig;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;

/// Load configuration for the given mode using process environment/file access.
pub fn load_config(mode: RuntimeMode) -> Result<RuntimeConfig> {
    let mut config = RuntimeConfig::from_mode_defaults(mode);

    if let Some(file) = load_from_file()? {
        config.merge_toml(file)?;
    }

    finish(config, mode)
}

/// Load configuration from a specific file path (for CLI --config flag).
/// Returns error if file doesn't exist or can't be parsed.
pub fn load_from_file_path(path: impl AsRef<Path>, mode: RuntimeMode) -> Result<RuntimeConfig> {
    let path = path.as_ref();
    let file = read_config_file(path)?;

    let mut config = RuntimeConfig::from_mode_defaults(mode);
    config
        .merge_toml(file)
        .with_context(|| format!("Invalid config file: {}", path.display()))?;

    finish(config, mode)
}

fn finish(mut config: RuntimeConfig, mode: RuntimeMode) -> Result<RuntimeConfig> {
    if mode == RuntimeMode::Managed {
        let path = RuntimeMode::properties_path();
        let groups = properties::load_property_groups(&path)?;
        properties::apply_blueprint_properties(&mut config, &groups)?;
    }

    env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;
    config.validate()?;
    Ok(config)
}

fn load_from_file() -> Result<Option<toml::Table>> {
    if let Ok(path) = env::var("STREAM2BUCKETS_CONFIG") {
        return read_config_file(Path::new(&path)).map(Some);
    }

    if let Ok(content) = env::var("STREAM2BUCKETS_CONFIG_CONTENT") {
        let config: toml::Table = toml::from_str(&content)
            .context("Failed to parse inline config from STREAM2BUCKETS_CONFIG_CONTENT")?;
        return Ok(Some(config));
    }

    for path in &["./config.toml", "./.stream2buckets.toml"] {
        let path = Path::new(path);
        if path.exists() {
            return read_config_file(path).map(Some);
        }
    }

    Ok(None)
}

fn read_config_file(path: &Path) -> Result<toml::Table> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }
}

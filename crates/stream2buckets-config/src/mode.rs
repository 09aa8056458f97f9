// Runtime mode detection based on environment variables
//
// - STREAM2BUCKETS_MODE=local|managed wins when set
// - Managed: an application properties file is present
// - Local: otherwise (default)

use std::env;
use std::path::{Path, PathBuf};

/// Where the managed runtime publishes application properties
pub const DEFAULT_PROPERTIES_FILE: &str = "/etc/flink/application_properties.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeMode {
    /// Developer machine: hard-coded defaults, no application properties
    Local,
    /// Managed stream-processing service: settings come from property groups
    Managed,
}

impl RuntimeMode {
    /// Auto-detect the current mode based on environment variables
    pub fn detect() -> Self {
        if let Ok(mode) = env::var("STREAM2BUCKETS_MODE") {
            if let Some(parsed) = Self::parse(&mode) {
                return parsed;
            }
            tracing::warn!(mode = %mode, "Ignoring unknown STREAM2BUCKETS_MODE");
        }

        if Self::properties_path().exists() {
            RuntimeMode::Managed
        } else {
            RuntimeMode::Local
        }
    }

    /// Path of the application properties file for managed runs
    pub fn properties_path() -> PathBuf {
        env::var("STREAM2BUCKETS_PROPERTIES_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Path::new(DEFAULT_PROPERTIES_FILE).to_path_buf())
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "local" => Some(RuntimeMode::Local),
            "managed" => Some(RuntimeMode::Managed),
            _ => None,
        }
    }

    pub fn is_local(&self) -> bool {
        *self == RuntimeMode::Local
    }
}

impl std::fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeMode::Local => write!(f, "local"),
            RuntimeMode::Managed => write!(f, "managed"),
        }
    }
}

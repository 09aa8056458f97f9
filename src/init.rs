// Initialization utilities
//
// Logging/tracing setup. Logs go to stderr so stdout stays machine-readable.

use stream2buckets_config::{LogConfig, LogFormat, RuntimeConfig};
use tracing::info;

/// Initialize tracing/logging from LogConfig
pub fn init_tracing(config: &LogConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Parse log level from config
    let env_filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Try to set the global subscriber; ignore error if already set (idempotent)
    let _ = match config.format {
        LogFormat::Json => tracing::subscriber::set_global_default(
            registry.with(fmt::layer().json().with_writer(std::io::stderr)),
        ),
        LogFormat::Text => tracing::subscriber::set_global_default(
            registry.with(fmt::layer().with_writer(std::io::stderr)),
        ),
    };
}

/// Log the resolved configuration once at startup
pub fn log_startup_info(config: &RuntimeConfig) {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        stream = %config.source.stream_name,
        region = %config.source.region,
        initial_position = %config.source.initial_position,
        record_kind = %config.source.record_kind,
        "Source configured"
    );
    info!(
        output_path = %config.sink.output_path,
        partition_format = %config.sink.partition_format,
        parallelism = ?config.sink.parallelism,
        min_price = config.filter.min_price,
        "Sink configured"
    );
}

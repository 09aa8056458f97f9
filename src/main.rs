use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use stream2buckets::bucket::{decode_hex, encode_hex};
use stream2buckets::datagen::DataGenerator;
use stream2buckets::{init_tracing, log_startup_info, ErrorPolicy, Pipeline};
use stream2buckets_config::{RecordKind, RuntimeConfig};
use tracing::info;

/// Assign streamed records to time-bucketed partition paths
#[derive(Parser)]
#[command(name = "stream2buckets")]
#[command(version)]
#[command(about = "Assign streamed records to time-bucketed partition paths", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Tag JSON-lines records with their partition path
    Assign {
        /// Read records from a file instead of stdin
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Partition format (overrides config), e.g. yyyy-MM-dd-HH
        #[arg(long, value_name = "PATTERN")]
        partition_format: Option<String>,

        /// Bucket prefix (overrides the {app_name}/job_start={millis}/ prefix)
        #[arg(long, value_name = "PREFIX")]
        prefix: Option<String>,

        /// Record shape: stock or order (overrides config)
        #[arg(long, value_name = "KIND")]
        record_kind: Option<RecordKind>,

        /// What to do with records that cannot be assigned
        #[arg(long, value_enum, default_value_t = ErrorPolicy::Fail)]
        on_error: ErrorPolicy,
    },
    /// Generate synthetic records as JSON lines
    Datagen {
        /// Number of records to produce
        #[arg(short = 'n', long, default_value_t = 100)]
        count: usize,

        /// Record shape: stock or order (overrides config)
        #[arg(long, value_name = "KIND")]
        record_kind: Option<RecordKind>,

        /// Seed for reproducible tickers, ids, and prices
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Encode or decode persisted bucket ids
    Bucket {
        #[command(subcommand)]
        action: BucketCommand,
    },
    /// Print the resolved configuration as TOML
    Config,
}

#[derive(Subcommand)]
enum BucketCommand {
    /// Print the hex-encoded versioned form of a bucket id
    Encode { bucket_id: String },
    /// Print the bucket id stored in a hex-encoded versioned value
    Decode { hex: String },
}

fn main() -> Result<()> {
    let Cli {
        command,
        config,
        log_level,
    } = Cli::parse();
    let config_path = config.as_ref();

    match command {
        Commands::Assign {
            input,
            partition_format,
            prefix,
            record_kind,
            on_error,
        } => {
            let mut config = setup(config_path, log_level)?;
            if let Some(format) = partition_format {
                config.sink.partition_format = format;
            }
            if let Some(kind) = record_kind {
                config.source.record_kind = kind;
            }
            run_assign(&config, input, prefix, on_error)
        }
        Commands::Datagen {
            count,
            record_kind,
            seed,
        } => {
            let config = setup(config_path, log_level)?;
            run_datagen(record_kind.unwrap_or(config.source.record_kind), count, seed)
        }
        // Bucket tools work on their arguments alone
        Commands::Bucket { action } => run_bucket(action),
        Commands::Config => {
            let config = setup(config_path, log_level)?;
            let rendered = toml::to_string(&config).context("Failed to render configuration")?;
            print!("{}", rendered);
            Ok(())
        }
    }
}

/// Load configuration, apply the --log-level flag, and start logging
fn setup(path: Option<&PathBuf>, log_level: Option<String>) -> Result<RuntimeConfig> {
    let mut config = load_config(path)?;
    if let Some(level) = log_level {
        config.logging.level = level;
    }
    init_tracing(&config.logging);
    Ok(config)
}

fn load_config(path: Option<&PathBuf>) -> Result<RuntimeConfig> {
    match path {
        Some(path) => RuntimeConfig::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => RuntimeConfig::load().context("Failed to load configuration"),
    }
}

fn run_assign(
    config: &RuntimeConfig,
    input: Option<PathBuf>,
    prefix: Option<String>,
    on_error: ErrorPolicy,
) -> Result<()> {
    log_startup_info(config);

    let pipeline = Pipeline::from_config(config, prefix, on_error)?;
    info!(prefix = %pipeline.assigner().prefix(), "Assigning records");

    let reader: Box<dyn BufRead> = match input {
        Some(path) => {
            let file = File::open(&path)
                .with_context(|| format!("Failed to open input: {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(io::stdin().lock()),
    };
    let writer = BufWriter::new(io::stdout().lock());

    pipeline.run(reader, writer)?;
    Ok(())
}

fn run_datagen(kind: RecordKind, count: usize, seed: Option<u64>) -> Result<()> {
    let now = chrono::Local::now().naive_local();
    let mut generator = DataGenerator::new(kind, seed);
    let written = generator.write_records(count, now, BufWriter::new(io::stdout().lock()))?;
    info!(count = written, kind = %kind, "Generated records");
    Ok(())
}

fn run_bucket(action: BucketCommand) -> Result<()> {
    let mut out = io::stdout().lock();
    match action {
        BucketCommand::Encode { bucket_id } => writeln!(out, "{}", encode_hex(&bucket_id))?,
        BucketCommand::Decode { hex } => writeln!(out, "{}", decode_hex(&hex)?)?,
    }
    Ok(())
}

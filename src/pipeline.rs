// Local assign pipeline
//
// Reads JSON-lines records, drops those below the price threshold, and tags
// each remaining record with its partition path:
//
//   {"bucket": "app/job_start=.../ts=2024-03-01-13", "record": {...}}
//
// Writing the records into those buckets is left to the sink.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{BufRead, Write};
use stream2buckets_config::RuntimeConfig;
use stream2buckets_core::{
    EventTime, Order, PartitionError, PartitionPathAssigner, PriceFilter, Priced, RecordKind,
    Stock,
};
use thiserror::Error;
use tracing::{info, warn};

/// What to do with a record that cannot be assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ErrorPolicy {
    /// Stop at the first bad record
    #[default]
    Fail,
    /// Drop bad records with a warning
    Skip,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("line {line}: invalid {kind} record: {source}")]
    Decode {
        line: usize,
        kind: RecordKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: {source}")]
    Partition {
        line: usize,
        #[source]
        source: PartitionError,
    },

    #[error("failed to write output: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Errors caused by a single record rather than the pipeline itself
    pub fn is_record_error(&self) -> bool {
        match self {
            PipelineError::Decode { .. } => true,
            PipelineError::Partition { source, .. } => source.is_record_error(),
            PipelineError::Encode(_) | PipelineError::Io(_) => false,
        }
    }
}

/// A record tagged with its partition path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assigned {
    pub bucket: String,
    pub record: Value,
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub read: usize,
    pub filtered: usize,
    pub assigned: usize,
    pub skipped: usize,
}

pub struct Pipeline {
    assigner: PartitionPathAssigner,
    filter: PriceFilter,
    kind: RecordKind,
    policy: ErrorPolicy,
}

impl Pipeline {
    pub fn new(
        assigner: PartitionPathAssigner,
        filter: PriceFilter,
        kind: RecordKind,
        policy: ErrorPolicy,
    ) -> Self {
        Self {
            assigner,
            filter,
            kind,
            policy,
        }
    }

    /// Build a pipeline from resolved configuration.
    ///
    /// The bucket prefix is taken from `prefix` when given, otherwise derived
    /// from the sink's app name and job start time.
    pub fn from_config(
        config: &RuntimeConfig,
        prefix: Option<String>,
        policy: ErrorPolicy,
    ) -> anyhow::Result<Self> {
        let prefix = prefix.unwrap_or_else(|| config.sink.bucket_prefix());
        let assigner = PartitionPathAssigner::new(&config.sink.partition_format, prefix)?;
        Ok(Self::new(
            assigner,
            PriceFilter::new(config.filter.min_price),
            config.source.record_kind,
            policy,
        ))
    }

    pub fn assigner(&self) -> &PartitionPathAssigner {
        &self.assigner
    }

    /// Route one JSON line; `Ok(None)` means the filter dropped it
    pub fn process_line(&self, line_no: usize, line: &str) -> Result<Option<Assigned>, PipelineError> {
        let value: Value = serde_json::from_str(line).map_err(|source| PipelineError::Decode {
            line: line_no,
            kind: self.kind,
            source,
        })?;

        match self.kind {
            RecordKind::Stock => self.route::<Stock>(line_no, value),
            RecordKind::Order => self.route::<Order>(line_no, value),
        }
    }

    fn route<R>(&self, line_no: usize, value: Value) -> Result<Option<Assigned>, PipelineError>
    where
        R: EventTime + Priced + DeserializeOwned,
    {
        let record = R::deserialize(&value).map_err(|source| PipelineError::Decode {
            line: line_no,
            kind: self.kind,
            source,
        })?;

        if !self.filter.accepts(&record) {
            return Ok(None);
        }

        let bucket = self
            .assigner
            .assign(&record)
            .map_err(|source| PipelineError::Partition {
                line: line_no,
                source,
            })?;

        Ok(Some(Assigned {
            bucket,
            record: value,
        }))
    }

    /// Process every line of `input`, writing assigned records to `output`
    pub fn run<R: BufRead, W: Write>(
        &self,
        input: R,
        mut output: W,
    ) -> Result<PipelineStats, PipelineError> {
        let mut stats = PipelineStats::default();

        for (idx, line) in input.lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;
            if line.trim().is_empty() {
                continue;
            }
            stats.read += 1;

            match self.process_line(line_no, &line) {
                Ok(Some(assigned)) => {
                    serde_json::to_writer(&mut output, &assigned)?;
                    output.write_all(b"\n")?;
                    stats.assigned += 1;
                }
                Ok(None) => stats.filtered += 1,
                Err(e) if e.is_record_error() && self.policy == ErrorPolicy::Skip => {
                    warn!(line = line_no, error = %e, "Skipping record");
                    stats.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        output.flush()?;
        info!(
            read = stats.read,
            assigned = stats.assigned,
            filtered = stats.filtered,
            skipped = stats.skipped,
            "Pipeline finished"
        );
        Ok(stats)
    }
}

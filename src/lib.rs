// stream2buckets - assign streamed records to time-bucketed partition paths
//
// Library half of the CLI: logging setup, the local assign pipeline, the
// synthetic data generator, and bucket-id inspection helpers.

pub mod bucket;
pub mod datagen;
pub mod pipeline;

mod init;

pub use init::{init_tracing, log_startup_info};
pub use pipeline::{Assigned, ErrorPolicy, Pipeline, PipelineError, PipelineStats};

//! Time-bucketed partition paths for streamed records
//!
//! This crate maps each record to the output partition a file sink should
//! append it to, based on the record's embedded event time, and provides the
//! versioned encoding used to persist those partition ids across restarts.

mod error;

pub mod codec;
pub mod partition;
pub mod records;

pub use codec::{
    decode_bucket_id, decode_versioned, encode_bucket_id, encode_versioned,
    VersionedSerializer, VersionedStringSerializer,
};
pub use error::{ErrorCode, PartitionError, Result};
pub use partition::{
    parse_event_time, BucketAssigner, PartitionPathAssigner, PartitionPattern,
    DEFAULT_PARTITION_FORMAT, PARTITION_KEY,
};
pub use records::{EventTime, JsonRecord, Order, PriceFilter, Priced, RecordKind, Stock};

//! Partition path assignment for time-based organization
//!
//! Every record is routed to a bucket derived from its embedded event time:
//! `{prefix}ts={formatted event time}`, e.g. `app/ts=2024-03-01-13` for the
//! pattern `yyyy-MM-dd-HH` and prefix `app/`.
//!
//! Event times are zone-less `yyyy-MM-dd HH:mm:ss` strings and are rendered
//! as-is, without timezone conversion.

mod pattern;

pub use pattern::PartitionPattern;

use crate::codec::VersionedStringSerializer;
use crate::error::{PartitionError, Result};
use crate::records::EventTime;
use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

/// Literal inserted between the prefix and the formatted event time
pub const PARTITION_KEY: &str = "ts=";

/// Hourly buckets, the format used when none is configured
pub const DEFAULT_PARTITION_FORMAT: &str = "yyyy-MM-dd-HH";

/// Routes records to the bucket a file sink should append them to.
///
/// Implementations are called once per record from every parallel sink
/// instance, so they take `&self` and must be safe to share across threads.
pub trait BucketAssigner<R: ?Sized>: Send + Sync {
    /// Identifier of a bucket
    type BucketId;

    /// Serializer used to persist in-flight bucket ids in checkpoint metadata
    type Serializer;

    /// Compute the bucket for a single record
    fn bucket_id(&self, record: &R) -> Result<Self::BucketId>;

    /// Serializer for this assigner's bucket ids
    fn serializer(&self) -> Self::Serializer;
}

/// Assigns `{prefix}ts={event time}` partition paths
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionPathAssigner {
    pattern: PartitionPattern,
    prefix: String,
}

impl PartitionPathAssigner {
    /// Create an assigner, failing fast if `partition_format` cannot be compiled.
    ///
    /// # Arguments
    /// * `partition_format` - Date/time pattern such as `yyyy-MM-dd-HH`
    /// * `prefix` - Path prefix placed before `ts=`; may be empty
    pub fn new(partition_format: &str, prefix: impl Into<String>) -> Result<Self> {
        let pattern = PartitionPattern::compile(partition_format)?;
        let prefix = prefix.into();
        debug!(
            partition_format = partition_format,
            prefix = prefix.as_str(),
            "Compiled partition path assigner"
        );
        Ok(Self { pattern, prefix })
    }

    /// Compute the partition path for a record.
    ///
    /// Missing or unparseable event times are returned as errors; there is no
    /// fallback bucket.
    pub fn assign<R: EventTime + ?Sized>(&self, record: &R) -> Result<String> {
        let raw = record
            .event_time()
            .ok_or_else(PartitionError::missing_event_time)?;
        let event_time = parse_event_time(raw)?;
        let formatted = self.pattern.render(&event_time)?;

        let mut path =
            String::with_capacity(self.prefix.len() + PARTITION_KEY.len() + formatted.len());
        path.push_str(&self.prefix);
        path.push_str(PARTITION_KEY);
        path.push_str(&formatted);
        Ok(path)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn pattern(&self) -> &PartitionPattern {
        &self.pattern
    }
}

impl<R: EventTime + ?Sized> BucketAssigner<R> for PartitionPathAssigner {
    type BucketId = String;
    type Serializer = VersionedStringSerializer;

    fn bucket_id(&self, record: &R) -> Result<String> {
        self.assign(record)
    }

    fn serializer(&self) -> VersionedStringSerializer {
        VersionedStringSerializer
    }
}

/// Parse a zone-less event time.
///
/// Spaces are replaced with `T` so `2024-03-01 13:45:00` reads as the ISO local
/// date-time `2024-03-01T13:45:00`. The grammar is fixed-width:
///
/// ```text
/// [+|-]yyyy-MM-ddTHH:mm[:ss[.f{1,9}]]
/// ```
///
/// Years beyond four digits need an explicit sign. Out-of-range fields,
/// including leap second 60, are malformed.
pub fn parse_event_time(raw: &str) -> Result<NaiveDateTime> {
    let normalized = raw.replace(' ', "T");
    let mut cursor = Cursor::new(&normalized);
    let malformed = |reason: &str| PartitionError::malformed_timestamp(raw, reason);

    let sign = cursor.sign();
    let year = match sign {
        Some(_) => cursor.digits(4, 6),
        None => cursor.digits(4, 4),
    }
    .ok_or_else(|| malformed("expected a four-digit year"))?;
    let year = match sign {
        Some(b'-') => -(year as i32),
        _ => year as i32,
    };

    let month = cursor
        .field(b'-', 2)
        .ok_or_else(|| malformed("expected '-' and a two-digit month"))?;
    let day = cursor
        .field(b'-', 2)
        .ok_or_else(|| malformed("expected '-' and a two-digit day"))?;
    let hour = cursor
        .field(b'T', 2)
        .ok_or_else(|| malformed("expected a date and time separated by ' ' or 'T'"))?;
    let minute = cursor
        .field(b':', 2)
        .ok_or_else(|| malformed("expected ':' and a two-digit minute"))?;

    let mut second = 0;
    let mut nano = 0;
    if !cursor.is_done() {
        second = cursor
            .field(b':', 2)
            .ok_or_else(|| malformed("expected ':' and two-digit seconds"))?;
        if !cursor.is_done() {
            nano = cursor
                .fraction()
                .ok_or_else(|| malformed("expected '.' and 1 to 9 fraction digits"))?;
        }
    }
    if !cursor.is_done() {
        return Err(malformed("unexpected trailing characters"));
    }

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| malformed("date out of range"))?
        .and_hms_nano_opt(hour, minute, second, nano)
        // second 60 is rejected here; nano never reaches the leap range
        .ok_or_else(|| malformed("time out of range"))
}

/// Byte cursor over an ASCII event-time string
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self {
            bytes: s.as_bytes(),
            pos: 0,
        }
    }

    fn is_done(&self) -> bool {
        self.pos == self.bytes.len()
    }

    fn sign(&mut self) -> Option<u8> {
        match self.bytes.get(self.pos) {
            Some(&b @ (b'+' | b'-')) => {
                self.pos += 1;
                Some(b)
            }
            _ => None,
        }
    }

    /// Between `min` and `max` ASCII digits
    fn digits(&mut self, min: usize, max: usize) -> Option<u32> {
        let run = self.bytes[self.pos..]
            .iter()
            .take(max + 1)
            .take_while(|b| b.is_ascii_digit())
            .count();
        if run < min || run > max {
            return None;
        }
        let value = self.bytes[self.pos..self.pos + run]
            .iter()
            .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'));
        self.pos += run;
        Some(value)
    }

    fn separator(&mut self, expected: u8) -> bool {
        if self.bytes.get(self.pos) == Some(&expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// A separator followed by exactly `width` digits
    fn field(&mut self, separator: u8, width: usize) -> Option<u32> {
        if !self.separator(separator) {
            return None;
        }
        self.digits(width, width)
    }

    /// `.` followed by 1-9 digits, scaled to nanoseconds
    fn fraction(&mut self) -> Option<u32> {
        if !self.separator(b'.') {
            return None;
        }
        let start = self.pos;
        let value = self.digits(1, 9)?;
        let width = self.pos - start;
        Some(value * 10u32.pow((9 - width) as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_assign_hourly_bucket() {
        let assigner = PartitionPathAssigner::new("yyyy-MM-dd-HH", "app/").unwrap();
        assert_eq!(
            assigner.assign("2024-03-01 13:45:00").unwrap(),
            "app/ts=2024-03-01-13"
        );
    }

    #[test]
    fn test_assign_collapses_within_hour() {
        let assigner = PartitionPathAssigner::new("yyyy-MM-dd-HH", "app/").unwrap();
        let first = assigner.assign("2024-03-01 13:00:00").unwrap();
        let last = assigner.assign("2024-03-01 13:59:59").unwrap();
        assert_eq!(first, last);
        assert_eq!(last, "app/ts=2024-03-01-13");
    }

    #[test]
    fn test_assign_empty_prefix() {
        let assigner = PartitionPathAssigner::new("yyyy-MM-dd-HH", "").unwrap();
        assert_eq!(
            assigner.assign("2024-03-01 00:00:00").unwrap(),
            "ts=2024-03-01-00"
        );
    }

    #[test]
    fn test_assign_is_deterministic() {
        let assigner = PartitionPathAssigner::new("yyyy-MM-dd-HH", "app/").unwrap();
        let a = assigner.assign("2024-12-31 23:59:59").unwrap();
        let b = assigner.assign("2024-12-31 23:59:59").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_assign_malformed() {
        let assigner = PartitionPathAssigner::new("yyyy-MM-dd-HH", "app/").unwrap();
        let err = assigner.assign("not-a-date").unwrap_err();
        assert_eq!(err.code(), ErrorCode::E002MalformedTimestamp);
        assert!(matches!(err, PartitionError::MalformedTimestamp { .. }));
    }

    #[test]
    fn test_invalid_pattern_fails_construction() {
        let err = PartitionPathAssigner::new("yyyy-MM-dd-'HH", "app/").unwrap_err();
        assert!(matches!(err, PartitionError::InvalidPattern { .. }));
    }

    #[test]
    fn test_parse_event_time_variants() {
        let dt = parse_event_time("2024-03-01 13:45:07").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 3, 1));
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (13, 45, 7));

        // ISO form with fraction, as produced by Python's isoformat()
        let dt = parse_event_time("2024-03-01T13:45:07.123456").unwrap();
        assert_eq!(dt.nanosecond(), 123_456_000);

        // Seconds are optional
        let dt = parse_event_time("2024-03-01 13:45").unwrap();
        assert_eq!(dt.second(), 0);
    }

    #[test]
    fn test_parse_event_time_rejects_garbage() {
        assert!(parse_event_time("").is_err());
        assert!(parse_event_time("2024-13-01 00:00:00").is_err());
        assert!(parse_event_time("2024-02-30 00:00:00").is_err());
        assert!(parse_event_time("2024-03-01 25:00:00").is_err());
        assert!(parse_event_time("2024-03-01 13:45:00+02:00").is_err());
        assert!(parse_event_time("2024-03-01  13:45:00").is_err());
        assert!(parse_event_time("2024-03-01 13:45:00.").is_err());
        assert!(parse_event_time("2024-03-01 13:45:00Z").is_err());
    }

    #[test]
    fn test_parse_event_time_rejects_loose_widths() {
        for raw in [
            "24-03-01 13:45:00",
            "2024-3-1 1:2:3",
            "2024-03-01 13:59:60",
            "2024-03-01T13:45:00.1234567891234",
            "12024-03-01 13:45:00",
            "2024-03-01 13:45:0",
        ] {
            let err = parse_event_time(raw).unwrap_err();
            assert_eq!(err.code(), ErrorCode::E002MalformedTimestamp, "{}", raw);
        }
    }

    #[test]
    fn test_parse_event_time_fraction_and_sign() {
        let dt = parse_event_time("2024-03-01 13:45:00.5").unwrap();
        assert_eq!(dt.nanosecond(), 500_000_000);
        let dt = parse_event_time("2024-03-01 13:45:00.123456789").unwrap();
        assert_eq!(dt.nanosecond(), 123_456_789);

        let dt = parse_event_time("+12024-03-01 00:00").unwrap();
        assert_eq!(dt.year(), 12024);
        let dt = parse_event_time("-0001-03-01 00:00").unwrap();
        assert_eq!(dt.year(), -1);
    }

    #[test]
    fn test_assign_rejects_two_digit_year() {
        let assigner = PartitionPathAssigner::new("yyyy-MM-dd-HH-mm-ss", "app/").unwrap();
        let err = assigner.assign("24-03-01 13:45:00").unwrap_err();
        assert!(matches!(err, PartitionError::MalformedTimestamp { .. }));
    }

    #[test]
    fn test_bucket_assigner_trait() {
        fn route<A: BucketAssigner<str, BucketId = String>>(a: &A, t: &str) -> String {
            a.bucket_id(t).unwrap()
        }
        let assigner = PartitionPathAssigner::new("yyyy-MM-dd", "p/").unwrap();
        assert_eq!(route(&assigner, "2024-03-01 13:45:00"), "p/ts=2024-03-01");
    }
}

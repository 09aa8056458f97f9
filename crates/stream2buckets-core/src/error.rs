//! Error types for partition assignment and bucket-id encoding

use thiserror::Error;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Partition format pattern could not be compiled
    E001InvalidPattern,
    /// E002: Event time missing or unparseable
    E002MalformedTimestamp,
    /// E003: Encoded bucket id carries an unknown format version
    E003UnsupportedVersion,
    /// E004: Encoded bucket id is truncated or not valid UTF-8
    E004CorruptBucketId,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E001InvalidPattern => "E001",
            Self::E002MalformedTimestamp => "E002",
            Self::E003UnsupportedVersion => "E003",
            Self::E004CorruptBucketId => "E004",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while assigning or restoring partition paths
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PartitionError {
    /// The partition format is not a usable date/time pattern
    #[error("[{code}] Invalid partition format '{pattern}': {reason}")]
    InvalidPattern {
        code: ErrorCode,
        pattern: String,
        reason: String,
    },

    /// The record's event time could not be parsed
    #[error("[{code}] Malformed event time '{value}': {reason}")]
    MalformedTimestamp {
        code: ErrorCode,
        value: String,
        reason: String,
    },

    /// The record carries no event-time field
    #[error("[{code}] Record has no event time")]
    MissingEventTime { code: ErrorCode },

    /// A persisted bucket id was written by a format version this build cannot read
    #[error("[{code}] Unsupported bucket id version {found} (supported: {supported})")]
    UnsupportedVersion {
        code: ErrorCode,
        found: u32,
        supported: u32,
    },

    /// A persisted bucket id is structurally invalid
    #[error("[{code}] Corrupt bucket id: {reason}")]
    CorruptBucketId { code: ErrorCode, reason: String },
}

impl PartitionError {
    /// Create an invalid pattern error with error code
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            code: ErrorCode::E001InvalidPattern,
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed timestamp error with error code
    pub fn malformed_timestamp(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedTimestamp {
            code: ErrorCode::E002MalformedTimestamp,
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_event_time() -> Self {
        Self::MissingEventTime {
            code: ErrorCode::E002MalformedTimestamp,
        }
    }

    /// Create an unsupported version error with error code
    pub fn unsupported_version(found: u32, supported: u32) -> Self {
        Self::UnsupportedVersion {
            code: ErrorCode::E003UnsupportedVersion,
            found,
            supported,
        }
    }

    /// Create a corrupt bucket id error with error code
    pub fn corrupt_bucket_id(reason: impl Into<String>) -> Self {
        Self::CorruptBucketId {
            code: ErrorCode::E004CorruptBucketId,
            reason: reason.into(),
        }
    }

    /// Error code of this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidPattern { code, .. }
            | Self::MalformedTimestamp { code, .. }
            | Self::MissingEventTime { code }
            | Self::UnsupportedVersion { code, .. }
            | Self::CorruptBucketId { code, .. } => *code,
        }
    }

    /// True for per-record failures that a pipeline may choose to drop
    pub fn is_record_error(&self) -> bool {
        self.code() == ErrorCode::E002MalformedTimestamp
    }
}

/// Result type alias for PartitionError
pub type Result<T> = std::result::Result<T, PartitionError>;

//! Versioned encoding for bucket ids persisted in checkpoint metadata
//!
//! Layout of an encoded value:
//!
//! ```text
//! +----------------+----------------+---------------------------+
//! | version: u32BE | length: u32BE  | payload (length bytes)    |
//! +----------------+----------------+---------------------------+
//! ```
//!
//! For string bucket ids (version 1) the payload is a little-endian `u32`
//! byte count followed by the UTF-8 bytes.

use crate::error::{PartitionError, Result};
use bytes::{Buf, BufMut};

/// Serializer whose output is tagged with a format version
pub trait VersionedSerializer<T> {
    /// Version written by [`VersionedSerializer::serialize`]
    fn version(&self) -> u32;

    /// Serialize a value into its versioned payload
    fn serialize(&self, value: &T) -> Vec<u8>;

    /// Deserialize a payload written with the given version
    fn deserialize(&self, version: u32, payload: &[u8]) -> Result<T>;
}

/// Serializer for string bucket ids
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionedStringSerializer;

impl VersionedStringSerializer {
    pub const VERSION: u32 = 1;
}

impl VersionedSerializer<String> for VersionedStringSerializer {
    fn version(&self) -> u32 {
        Self::VERSION
    }

    fn serialize(&self, value: &String) -> Vec<u8> {
        let bytes = value.as_bytes();
        let mut out = Vec::with_capacity(4 + bytes.len());
        out.put_u32_le(bytes.len() as u32);
        out.put_slice(bytes);
        out
    }

    fn deserialize(&self, version: u32, mut payload: &[u8]) -> Result<String> {
        if version != Self::VERSION {
            return Err(PartitionError::unsupported_version(version, Self::VERSION));
        }
        if payload.remaining() < 4 {
            return Err(PartitionError::corrupt_bucket_id(
                "payload shorter than its length prefix",
            ));
        }

        let len = payload.get_u32_le() as usize;
        if payload.remaining() != len {
            return Err(PartitionError::corrupt_bucket_id(format!(
                "declared {} bytes, found {}",
                len,
                payload.remaining()
            )));
        }

        String::from_utf8(payload.to_vec())
            .map_err(|e| PartitionError::corrupt_bucket_id(format!("invalid UTF-8: {}", e)))
    }
}

/// Serialize a value and prefix it with the serializer's version and payload length
pub fn encode_versioned<T, S>(serializer: &S, value: &T) -> Vec<u8>
where
    S: VersionedSerializer<T> + ?Sized,
{
    let payload = serializer.serialize(value);
    let mut out = Vec::with_capacity(8 + payload.len());
    out.put_u32(serializer.version());
    out.put_u32(payload.len() as u32);
    out.put_slice(&payload);
    out
}

/// Read the version header and hand the payload to the serializer
pub fn decode_versioned<T, S>(serializer: &S, mut bytes: &[u8]) -> Result<T>
where
    S: VersionedSerializer<T> + ?Sized,
{
    if bytes.remaining() < 8 {
        return Err(PartitionError::corrupt_bucket_id(format!(
            "expected at least 8 header bytes, found {}",
            bytes.remaining()
        )));
    }

    let version = bytes.get_u32();
    let len = bytes.get_u32() as usize;
    if bytes.remaining() != len {
        return Err(PartitionError::corrupt_bucket_id(format!(
            "header declares {} payload bytes, found {}",
            len,
            bytes.remaining()
        )));
    }

    serializer.deserialize(version, bytes)
}

/// Encode a bucket id with the current string format
pub fn encode_bucket_id(bucket_id: &str) -> Vec<u8> {
    encode_versioned(&VersionedStringSerializer, &bucket_id.to_string())
}

/// Decode a bucket id written by [`encode_bucket_id`]
pub fn decode_bucket_id(bytes: &[u8]) -> Result<String> {
    decode_versioned(&VersionedStringSerializer, bytes)
}

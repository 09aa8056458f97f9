// Hex helpers for inspecting bucket ids stored in checkpoint metadata

use anyhow::{Context, Result};
use stream2buckets_core::{decode_bucket_id, encode_bucket_id};

/// Encode a bucket id into its versioned form, hex-encoded
pub fn encode_hex(bucket_id: &str) -> String {
    hex::encode(encode_bucket_id(bucket_id))
}

/// Decode a hex-encoded versioned bucket id
pub fn decode_hex(encoded: &str) -> Result<String> {
    let bytes = hex::decode(encoded.trim()).context("Bucket id is not valid hex")?;
    Ok(decode_bucket_id(&bytes)?)
}

//! base64 and SHA-256 helpers.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::errors::{AkError, Result};

/// Number of hex characters kept from a digest for pseudonyms and filenames.
const SHORT_HASH_LEN: usize = 16;

/// Encode bytes as standard base64.
pub fn base64_encode(data: &[u8]) -> String {
    BASE64.encode(data)
}

/// Decode standard base64.
pub fn base64_decode(input: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(input.trim())
        .map_err(|e| AkError::SerializationError(format!("invalid base64: {e}")))
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Pseudonym for a key name, as written to the audit log.
///
/// The first 16 hex characters of SHA-256(name). Deterministic, so the same
/// name can be correlated across entries without ever being written out.
pub fn hash_key_name(name: &str) -> String {
    short_hash(name.as_bytes())
}

/// First 16 hex characters of SHA-256(data).
pub(crate) fn short_hash(data: &[u8]) -> String {
    let mut hex = sha256_hex(data);
    hex.truncate(SHORT_HASH_LEN);
    hex
}

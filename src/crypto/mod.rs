//! Cryptographic plumbing for ak.
//!
//! This module provides:
//! - base64 / SHA-256 helpers used for audit pseudonyms and file naming (`encoding`)
//! - the `EncryptionBackend` adapter over gpg, plaintext, and an in-memory fake (`backend`)
//! - passphrase acquisition for the gpg backend (`passphrase`)

pub mod backend;
pub mod encoding;
pub mod passphrase;

pub use backend::{backend_for, EncryptionBackend, GpgBackend, MemoryBackend, PlainBackend};
pub use encoding::{base64_decode, base64_encode, hash_key_name, sha256_hex};

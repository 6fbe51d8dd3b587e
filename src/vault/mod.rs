//! Vault module: secret storage on disk.
//!
//! This module provides:
//! - owner-only, atomic file primitives (`secure_fs`)
//! - the `NAME=value` plaintext layout (`format`)
//! - `KeyStore` and the `VaultStore` facade over the legacy global vault (`store`)
//! - profiles and three-tier value resolution (`profile`)
//! - directory → profile bindings (`binding`)
//! - legacy migration and backend conversion (`migration`)
//! - display masking (`mask`)

pub mod binding;
pub mod format;
pub mod mask;
pub mod migration;
pub mod profile;
pub mod secure_fs;
pub mod store;

// Re-export the most commonly used items.
pub use binding::mapping_file_for_dir;
pub use mask::mask_value;
pub use migration::{ConversionReport, MigrationOutcome, MigrationState};
pub use profile::{
    profile_keys_path, profile_path, validate_key_name, validate_profile_name, ProfileResolution,
    ResolvedValue, SavedProfile, ValueSource, DEFAULT_PROFILE,
};
pub use store::{KeyStore, VaultStore};

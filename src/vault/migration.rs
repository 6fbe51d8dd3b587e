//! Legacy → profile migration, and conversion between backends.
//!
//! Older installs keep every secret in one global vault (`keys.env[.gpg]`).
//! Migration copies that vault into the `default` profile:
//!
//! 1. load the legacy vault
//! 2. add every legacy name to the `default` key list (existing order kept)
//! 3. write all pairs to the `default` key store
//!
//! The default key store is written last and doubles as the "migrated"
//! marker, so a crash before step 3 simply re-runs the migration. The legacy
//! file is never deleted.

use std::path::PathBuf;

use crate::errors::{AkError, Result};

use super::profile::{validate_key_name, DEFAULT_PROFILE};
use super::store::{KeyStore, VaultStore};

/// Whether the legacy vault still needs copying into `default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    /// Legacy vault exists and the default key store does not.
    Unmigrated,
    /// Nothing to do (already migrated, or no legacy vault).
    Migrated,
}

/// Result of [`VaultStore::ensure_migrated`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    NotNeeded,
    Migrated { keys: usize },
}

/// Result of [`VaultStore::convert_backend`].
#[derive(Debug, Default)]
pub struct ConversionReport {
    /// Number of keys in the converted legacy vault.
    pub vault_keys: usize,
    /// Profiles whose key stores were converted.
    pub profiles: Vec<String>,
    /// Source files removed after every write succeeded.
    pub removed: Vec<PathBuf>,
}

impl VaultStore {
    pub fn migration_state(&self) -> Result<MigrationState> {
        let marker = self.keys_path(DEFAULT_PROFILE)?;
        if self.has_global_vault() && !marker.exists() {
            Ok(MigrationState::Unmigrated)
        } else {
            Ok(MigrationState::Migrated)
        }
    }

    /// Migrate the legacy vault into `default` if that has not happened yet.
    ///
    /// Runs before every profile read, so it must stay a single existence
    /// check once migrated.
    pub fn ensure_migrated(&self) -> Result<MigrationOutcome> {
        if self.migration_state()? == MigrationState::Migrated {
            return Ok(MigrationOutcome::NotNeeded);
        }

        // 1. Load the legacy vault.
        let legacy = self.load_vault()?;

        // 2. Extend the default key list.
        let mut keys = self.read_profile_file(DEFAULT_PROFILE)?;
        for name in legacy.names() {
            if keys.contains(&name) {
                continue;
            }
            if validate_key_name(&name).is_err() {
                tracing::warn!(
                    key = %name,
                    "legacy key is not a valid identifier; copied to the default store but left out of its key list"
                );
                continue;
            }
            keys.push(name);
        }
        self.write_profile_file(DEFAULT_PROFILE, &keys)?;

        // 3. Copy every pair. This write marks the migration as done.
        let store: KeyStore = legacy.iter().collect();
        self.save_profile_keys_file(DEFAULT_PROFILE, &store)?;

        let names = legacy.names();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        self.audit.record("migrate", &refs);
        tracing::info!(keys = legacy.len(), "legacy vault migrated into the default profile");

        Ok(MigrationOutcome::Migrated { keys: legacy.len() })
    }

    /// Re-encrypt the legacy vault and every profile key store into
    /// `target`, which must use a different backend over the same directory.
    ///
    /// Every converted file is read back through `target` and compared
    /// before any source file is removed. Existing target files are never
    /// overwritten.
    pub fn convert_backend(&self, target: &VaultStore) -> Result<ConversionReport> {
        if self.suffix() == target.suffix() {
            return Err(AkError::CommandFailed(format!(
                "source and target both use the {} file layout",
                target.backend().name()
            )));
        }
        if !target.backend().is_available() {
            return Err(AkError::BackendUnavailable(format!(
                "{} backend is not available",
                target.backend().name()
            )));
        }

        self.ensure_migrated()?;

        // Collect everything first so nothing is written if a read fails.
        let mut jobs: Vec<(Option<String>, PathBuf, PathBuf, KeyStore)> = Vec::new();

        if let Some(vault) = self.read_store_file(&self.vault_path())? {
            jobs.push((None, self.vault_path(), target.vault_path(), vault));
        }
        for profile in self.list_profiles()? {
            let source = self.keys_path(&profile)?;
            if let Some(store) = self.read_store_file(&source)? {
                let dest = target.keys_path(&profile)?;
                jobs.push((Some(profile), source, dest, store));
            }
        }

        if let Some((_, _, dest, _)) = jobs.iter().find(|(_, _, dest, _)| dest.exists()) {
            return Err(AkError::CommandFailed(format!(
                "{} already exists; refusing to overwrite",
                dest.display()
            )));
        }

        let mut report = ConversionReport::default();

        for (profile, _, dest, store) in &jobs {
            target.write_store_file(dest, store)?;
            let readback = target.read_store_file(dest)?.unwrap_or_default();
            if &readback != store {
                return Err(AkError::EncryptionFailed(format!(
                    "{} did not read back identically",
                    dest.display()
                )));
            }
            match profile {
                Some(name) => report.profiles.push(name.clone()),
                None => report.vault_keys = store.len(),
            }
        }

        for (_, source, _, _) in &jobs {
            if super::secure_fs::remove_if_exists(source)? {
                report.removed.push(source.clone());
            }
        }

        target.audit.record("convert_backend", &[]);
        tracing::info!(
            from = self.backend().name(),
            to = target.backend().name(),
            files = jobs.len(),
            "backend conversion finished"
        );

        Ok(report)
    }
}

//! High-level vault operations used by CLI commands.
//!
//! `VaultStore` bundles the process [`Config`], the chosen encryption
//! backend and the audit log, so the rest of the application can work with
//! simple calls like `store.load_vault()` or `store.read_profile("work")`.
//!
//! This file covers the legacy global vault (`keys.env[.gpg]`) and the
//! shared encrypted-file helpers. Profile, binding and migration operations
//! live in sibling modules as further `impl VaultStore` blocks.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use zeroize::Zeroize;

use crate::audit::AuditLog;
use crate::config::Config;
use crate::crypto::{backend_for, EncryptionBackend};
use crate::errors::{AkError, Result};

use super::format::{parse_kv, serialize_kv};

/// Lookup used for the last resolution tier (process environment).
pub type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// In-memory secret map, sorted by name.
///
/// Used both for the legacy global vault and for per-profile key stores.
/// Values are wiped from memory when the store is dropped.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct KeyStore {
    entries: BTreeMap<String, String>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Insert or replace a value. Returns `true` if the name was new.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        match self.entries.insert(name.into(), value.into()) {
            Some(mut old) => {
                old.zeroize();
                false
            }
            None => true,
        }
    }

    /// Remove a value. Returns `true` if something was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.entries.remove(name) {
            Some(mut old) => {
                old.zeroize();
                true
            }
            None => false,
        }
    }

    /// All names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Names containing `query`, case-insensitive.
    pub fn search(&self, query: &str) -> Vec<String> {
        let needle = query.to_lowercase();
        self.entries
            .keys()
            .filter(|name| name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize to `NAME=value` lines.
    pub fn to_text(&self) -> String {
        serialize_kv(&self.entries)
    }

    /// Parse `NAME=value` lines.
    pub fn from_text(text: &str) -> Result<Self> {
        Ok(Self {
            entries: parse_kv(text)?,
        })
    }
}

impl Drop for KeyStore {
    fn drop(&mut self) {
        for value in self.entries.values_mut() {
            value.zeroize();
        }
    }
}

impl fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStore")
            .field("names", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KeyStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = Self::new();
        for (k, v) in iter {
            store.set(k, v);
        }
        store
    }
}

/// The main storage handle.
pub struct VaultStore {
    pub(super) config: Config,
    pub(super) backend: Box<dyn EncryptionBackend>,
    pub(super) audit: AuditLog,
    pub(super) environment: EnvLookup,
}

impl VaultStore {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Build a store using the backend selected by `config`.
    pub fn new(config: Config) -> Self {
        let backend = backend_for(&config);
        Self::with_backend(config, backend)
    }

    /// Build a store with an explicit backend (tests, backend conversion).
    pub fn with_backend(config: Config, backend: Box<dyn EncryptionBackend>) -> Self {
        let audit = AuditLog::from_config(&config);
        Self {
            config,
            backend,
            audit,
            environment: Box::new(|name| std::env::var(name).ok()),
        }
    }

    /// Replace the process-environment lookup used as the last fallback.
    pub fn with_environment<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.environment = Box::new(lookup);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &dyn EncryptionBackend {
        self.backend.as_ref()
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Suffix for encrypted artifacts, following the active backend.
    pub fn suffix(&self) -> &'static str {
        if self.backend.is_encrypted() {
            ".gpg"
        } else {
            ""
        }
    }

    /// Path of the legacy global vault for the active backend.
    pub fn vault_path(&self) -> PathBuf {
        self.config
            .config_dir
            .join(format!("keys.env{}", self.suffix()))
    }

    // ------------------------------------------------------------------
    // Legacy global vault
    // ------------------------------------------------------------------

    /// Whether the legacy vault file exists for the active backend.
    pub fn has_global_vault(&self) -> bool {
        self.vault_path().exists()
    }

    /// Load the legacy global vault. A missing file is an empty store.
    pub fn load_vault(&self) -> Result<KeyStore> {
        let store = self.read_store_file(&self.vault_path())?.unwrap_or_default();
        tracing::debug!(count = store.len(), "global vault loaded");
        Ok(store)
    }

    /// Replace the legacy global vault with `store`.
    pub fn save_vault(&self, store: &KeyStore) -> Result<()> {
        self.write_store_file(&self.vault_path(), store)?;
        tracing::debug!(count = store.len(), "global vault saved");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Encrypted key-store files
    // ------------------------------------------------------------------

    /// Decrypt and parse a key-store file. `Ok(None)` when it does not exist.
    pub(crate) fn read_store_file(&self, path: &Path) -> Result<Option<KeyStore>> {
        if !path.exists() {
            self.check_backend_mismatch(path)?;
            return Ok(None);
        }

        let plaintext = self.backend.decrypt_from_file(path)?;
        let text = std::str::from_utf8(&plaintext).map_err(|_| {
            AkError::InvalidVaultFormat(format!("{} is not valid UTF-8", path.display()))
        })?;

        KeyStore::from_text(text).map(Some)
    }

    /// Serialize, encrypt and atomically replace a key-store file.
    pub(crate) fn write_store_file(&self, path: &Path, store: &KeyStore) -> Result<()> {
        let mut text = store.to_text();
        let result = self.backend.encrypt_to_file(text.as_bytes(), path);
        text.zeroize();
        result
    }

    /// A missing file may still exist under the other backend's name.
    /// Reading it as empty would silently hide (and later overwrite) secrets.
    fn check_backend_mismatch(&self, path: &Path) -> Result<()> {
        let name = path.to_string_lossy();

        if self.backend.is_encrypted() {
            if let Some(plain) = name.strip_suffix(".gpg") {
                if Path::new(plain).exists() {
                    return Err(AkError::DecryptionFailed(format!(
                        "{plain} was written by the plain backend; run `ak migrate backend` to encrypt it"
                    )));
                }
            }
        } else {
            let encrypted = format!("{name}.gpg");
            if Path::new(&encrypted).exists() {
                return Err(AkError::DecryptionFailed(format!(
                    "{encrypted} was written by the gpg backend, which is not active (gpg missing or AK_DISABLE_GPG set)"
                )));
            }
        }

        Ok(())
    }
}

impl fmt::Debug for VaultStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultStore")
            .field("config_dir", &self.config.config_dir)
            .field("backend", &self.backend.name())
            .finish()
    }
}

//! Profiles: named, ordered lists of key names with their own key stores.
//!
//! On disk a profile `work` is two files under `profiles/`:
//!
//! - `work.profile`: one key name per line, in insertion order
//! - `work.keys[.gpg]`: the profile's own `NAME=value` store, encrypted
//!   like the global vault
//!
//! A value is resolved from the profile store first, then the legacy global
//! vault, then the process environment.

use std::fs;
use std::path::{Path, PathBuf};

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::codec::shell::export_line;
use crate::config::Config;
use crate::errors::{AkError, Result};

use super::secure_fs;
use super::store::{KeyStore, VaultStore};

/// The profile that always exists.
pub const DEFAULT_PROFILE: &str = "default";

const PROFILE_EXT: &str = "profile";
const MAX_PROFILE_NAME_LEN: usize = 64;
const MAX_KEY_NAME_LEN: usize = 256;

// ----------------------------------------------------------------------
// Name validation and paths
// ----------------------------------------------------------------------

/// Reject profile names that could escape the profiles directory or make
/// awkward filenames.
pub fn validate_profile_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| Err(AkError::InvalidProfileName(name.to_string(), reason.into()));

    if name.is_empty() {
        return invalid("name cannot be empty");
    }
    if name.len() > MAX_PROFILE_NAME_LEN {
        return invalid("name is longer than 64 characters");
    }
    if name.chars().any(char::is_control) {
        return invalid("name contains control characters");
    }
    if name.contains('/') || name.contains('\\') {
        return invalid("name contains a path separator");
    }
    if name.contains("..") {
        return invalid("name contains '..'");
    }
    if name.starts_with('.') {
        return invalid("name cannot start with '.'");
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return invalid("only letters, digits, '_', '-' and '.' are allowed");
    }
    Ok(())
}

/// Key names must be shell identifiers: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_key_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| Err(AkError::InvalidKeyName(name.to_string(), reason.into()));

    let mut chars = name.chars();
    match chars.next() {
        None => return invalid("name cannot be empty"),
        Some(c) if !(c.is_ascii_alphabetic() || c == '_') => {
            return invalid("must start with a letter or '_'")
        }
        _ => {}
    }
    if name.len() > MAX_KEY_NAME_LEN {
        return invalid("name is longer than 256 characters");
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return invalid("only letters, digits and '_' are allowed");
    }
    Ok(())
}

/// `profiles/<name>.profile`. Validates `name` before touching any path.
pub fn profile_path(config: &Config, name: &str) -> Result<PathBuf> {
    validate_profile_name(name)?;
    Ok(config.profiles_dir.join(format!("{name}.{PROFILE_EXT}")))
}

/// `profiles/<name>.keys[.gpg]`, suffix following the configured backend.
pub fn profile_keys_path(config: &Config, name: &str) -> Result<PathBuf> {
    keys_path_with_suffix(config, name, config.store_suffix())
}

fn keys_path_with_suffix(config: &Config, name: &str, suffix: &str) -> Result<PathBuf> {
    validate_profile_name(name)?;
    Ok(config.profiles_dir.join(format!("{name}.keys{suffix}")))
}

// ----------------------------------------------------------------------
// Resolution results
// ----------------------------------------------------------------------

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Profile,
    Vault,
    Environment,
}

impl ValueSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Vault => "vault",
            Self::Environment => "environment",
        }
    }
}

/// A resolved secret. The value is wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ResolvedValue {
    pub name: String,
    pub value: String,
    #[zeroize(skip)]
    pub source: ValueSource,
}

impl std::fmt::Debug for ResolvedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedValue")
            .field("name", &self.name)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Bulk resolution of a profile.
#[derive(Debug, Default)]
pub struct ProfileResolution {
    /// Resolved values, in profile order.
    pub values: Vec<ResolvedValue>,
    /// Names that resolved nowhere, in profile order.
    pub missing: Vec<String>,
    /// Names held in the profile store but not in its key list. These are
    /// never exported, usually legacy names that are not identifiers.
    pub unlisted: Vec<String>,
}

/// What `save_profile_from_vault` wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedProfile {
    /// Key list written to the profile.
    pub keys: Vec<String>,
    /// Names whose values were copied into the profile store.
    pub copied: Vec<String>,
}

// ----------------------------------------------------------------------
// Profile operations
// ----------------------------------------------------------------------

impl VaultStore {
    /// Key-store path for `name` under the active backend.
    pub(crate) fn keys_path(&self, name: &str) -> Result<PathBuf> {
        keys_path_with_suffix(&self.config, name, self.suffix())
    }

    /// All profile names, sorted. `default` is always present.
    pub fn list_profiles(&self) -> Result<Vec<String>> {
        self.ensure_migrated()?;
        self.ensure_default_profile()?;

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.config.profiles_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(PROFILE_EXT) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if validate_profile_name(stem).is_ok() {
                names.push(stem.to_string());
            }
        }

        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Whether a profile list file exists. `default` always exists.
    pub fn profile_exists(&self, name: &str) -> Result<bool> {
        let path = profile_path(&self.config, name)?;
        Ok(name == DEFAULT_PROFILE || path.exists())
    }

    /// Key names of a profile. A nonexistent profile is an empty list.
    pub fn read_profile(&self, name: &str) -> Result<Vec<String>> {
        validate_profile_name(name)?;
        self.ensure_migrated()?;
        self.read_profile_file(name)
    }

    /// Replace the key list of a profile (duplicates dropped, first kept).
    pub fn write_profile(&self, name: &str, keys: &[String]) -> Result<()> {
        validate_profile_name(name)?;
        self.ensure_migrated()?;
        self.write_profile_file(name, keys)
    }

    /// Create an empty profile. Returns `false` if it already existed.
    pub fn create_profile(&self, name: &str) -> Result<bool> {
        if profile_path(&self.config, name)?.exists() {
            return Ok(false);
        }
        self.write_profile(name, &[])?;
        self.audit.record("create_profile", &[name]);
        Ok(true)
    }

    /// Delete a profile's key list and key store. `default` cannot be deleted.
    pub fn delete_profile(&self, name: &str) -> Result<()> {
        validate_profile_name(name)?;
        if name == DEFAULT_PROFILE {
            return Err(AkError::InvalidProfileName(
                name.to_string(),
                "the default profile cannot be deleted".into(),
            ));
        }

        let list = profile_path(&self.config, name)?;
        if !list.exists() {
            return Err(AkError::ProfileNotFound(name.to_string()));
        }

        secure_fs::remove_if_exists(&list)?;
        // Remove the store under either backend's name so nothing is orphaned.
        secure_fs::remove_if_exists(&keys_path_with_suffix(&self.config, name, "")?)?;
        secure_fs::remove_if_exists(&keys_path_with_suffix(&self.config, name, ".gpg")?)?;

        tracing::info!(profile = name, "profile deleted");
        self.audit.record("rm_profile", &[name]);
        Ok(())
    }

    /// The profile's own key store. Missing file → empty store.
    pub fn load_profile_keys(&self, name: &str) -> Result<KeyStore> {
        validate_profile_name(name)?;
        self.ensure_migrated()?;
        self.load_profile_keys_file(name)
    }

    /// Replace the profile's own key store.
    pub fn save_profile_keys(&self, name: &str, store: &KeyStore) -> Result<()> {
        validate_profile_name(name)?;
        self.ensure_migrated()?;
        self.save_profile_keys_file(name, store)
    }

    /// Store `value` in the profile and append `key` to its list if absent.
    /// Returns `true` if the key was new to the profile list.
    pub fn add_profile_key(&self, profile: &str, key: &str, value: &str) -> Result<bool> {
        validate_profile_name(profile)?;
        validate_key_name(key)?;
        self.ensure_migrated()?;

        let mut store = self.load_profile_keys_file(profile)?;
        store.set(key, value);
        self.save_profile_keys_file(profile, &store)?;

        let mut keys = self.read_profile_file(profile)?;
        let added = !keys.iter().any(|k| k == key);
        if added {
            keys.push(key.to_string());
            self.write_profile_file(profile, &keys)?;
        }

        self.audit.record("add_profile", &[key]);
        Ok(added)
    }

    /// Remove `key` from the profile's list and store.
    /// Returns `true` if it was present in either.
    pub fn remove_profile_key(&self, profile: &str, key: &str) -> Result<bool> {
        validate_profile_name(profile)?;
        self.ensure_migrated()?;

        let mut keys = self.read_profile_file(profile)?;
        let before = keys.len();
        keys.retain(|k| k != key);
        let in_list = keys.len() != before;
        if in_list {
            self.write_profile_file(profile, &keys)?;
        }

        let mut store = self.load_profile_keys_file(profile)?;
        let in_store = store.remove(key);
        if in_store {
            self.save_profile_keys_file(profile, &store)?;
        }

        if in_list || in_store {
            self.audit.record("rm_profile_key", &[key]);
        }
        Ok(in_list || in_store)
    }

    /// Save a profile from the global vault.
    ///
    /// With no `names`, every vault key is used. The list is written and the
    /// values the vault holds are copied into the profile store, so the
    /// profile keeps working if the global vault goes away.
    pub fn save_profile_from_vault(&self, profile: &str, names: &[String]) -> Result<SavedProfile> {
        validate_profile_name(profile)?;
        for name in names {
            validate_key_name(name)?;
        }
        self.ensure_migrated()?;

        let vault = self.load_vault()?;
        let keys = if names.is_empty() {
            vault.names()
        } else {
            dedup_keep_first(names)
        };

        let mut store = self.load_profile_keys_file(profile)?;
        let mut copied = Vec::new();
        for key in &keys {
            if let Some(value) = vault.get(key) {
                store.set(key.as_str(), value);
                copied.push(key.clone());
            }
        }

        self.write_profile_file(profile, &keys)?;
        if !copied.is_empty() {
            self.save_profile_keys_file(profile, &store)?;
        }

        let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        self.audit.record("save_profile", &refs);
        tracing::info!(profile, keys = keys.len(), copied = copied.len(), "profile saved");

        Ok(SavedProfile { keys, copied })
    }

    /// Overwrite stale copies of `key` in every profile store that holds
    /// one. Called after the global vault value changes, so a profile store
    /// (which wins resolution) never shadows the update. Returns the
    /// profiles that were rewritten.
    pub fn refresh_profile_copies(&self, key: &str, value: &str) -> Result<Vec<String>> {
        validate_key_name(key)?;

        let mut refreshed = Vec::new();
        for profile in self.list_profiles()? {
            let mut store = self.load_profile_keys_file(&profile)?;
            if store.get(key).is_some_and(|current| current != value) {
                store.set(key, value);
                self.save_profile_keys_file(&profile, &store)?;
                refreshed.push(profile);
            }
        }

        if !refreshed.is_empty() {
            tracing::debug!(profiles = refreshed.len(), "profile copies refreshed");
        }
        Ok(refreshed)
    }

    /// Drop `key` from every profile's list and store. Called after the key
    /// leaves the global vault, so no profile keeps exporting a deleted
    /// secret. Returns the profiles that held it.
    pub fn forget_profile_copies(&self, key: &str) -> Result<Vec<String>> {
        let mut forgotten = Vec::new();
        for profile in self.list_profiles()? {
            if self.remove_profile_key(&profile, key)? {
                forgotten.push(profile);
            }
        }
        Ok(forgotten)
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Resolve one key for `profile`: profile store, then global vault,
    /// then the process environment.
    pub fn resolve_key(&self, profile: &str, key: &str) -> Result<Option<ResolvedValue>> {
        validate_profile_name(profile)?;
        self.ensure_migrated()?;

        let store = self.load_profile_keys_file(profile)?;
        let vault = self.load_vault()?;
        Ok(self.resolve_in(&store, &vault, key))
    }

    /// Resolve every key of `profile`, loading each store once.
    pub fn resolve_profile(&self, profile: &str) -> Result<ProfileResolution> {
        validate_profile_name(profile)?;
        self.ensure_migrated()?;

        let keys = self.read_profile_file(profile)?;
        let store = self.load_profile_keys_file(profile)?;
        let vault = self.load_vault()?;

        let mut resolution = ProfileResolution {
            unlisted: store.names().into_iter().filter(|n| !keys.contains(n)).collect(),
            ..Default::default()
        };
        for key in keys {
            match self.resolve_in(&store, &vault, &key) {
                Some(value) => resolution.values.push(value),
                None => resolution.missing.push(key),
            }
        }

        tracing::debug!(
            profile,
            resolved = resolution.values.len(),
            missing = resolution.missing.len(),
            unlisted = resolution.unlisted.len(),
            "profile resolved"
        );
        Ok(resolution)
    }

    /// `export NAME="value"` lines for every resolvable key of `profile`, in
    /// profile order. Unresolved keys are skipped and audited.
    pub fn make_exports(&self, profile: &str) -> Result<String> {
        let resolution = self.resolve_profile(profile)?;

        if !resolution.missing.is_empty() {
            let refs: Vec<&str> = resolution.missing.iter().map(String::as_str).collect();
            self.audit.record("export_missing", &refs);
        }

        let mut out = String::new();
        for value in &resolution.values {
            out.push_str(&export_line(&value.name, &value.value));
            out.push('\n');
        }
        Ok(out)
    }

    fn resolve_in(&self, store: &KeyStore, vault: &KeyStore, key: &str) -> Option<ResolvedValue> {
        let (value, source) = if let Some(v) = store.get(key) {
            (v.to_string(), ValueSource::Profile)
        } else if let Some(v) = vault.get(key) {
            (v.to_string(), ValueSource::Vault)
        } else {
            ((self.environment)(key)?, ValueSource::Environment)
        };

        Some(ResolvedValue {
            name: key.to_string(),
            value,
            source,
        })
    }

    // ------------------------------------------------------------------
    // File helpers (no migration check)
    // ------------------------------------------------------------------

    pub(crate) fn read_profile_file(&self, name: &str) -> Result<Vec<String>> {
        let path = profile_path(&self.config, name)?;
        read_name_list(&path)
    }

    pub(crate) fn write_profile_file(&self, name: &str, keys: &[String]) -> Result<()> {
        for key in keys {
            validate_key_name(key)?;
        }
        let path = profile_path(&self.config, name)?;
        write_name_list(&path, &dedup_keep_first(keys))?;
        tracing::debug!(profile = name, count = keys.len(), "profile list written");
        Ok(())
    }

    pub(crate) fn load_profile_keys_file(&self, name: &str) -> Result<KeyStore> {
        let path = self.keys_path(name)?;
        Ok(self.read_store_file(&path)?.unwrap_or_default())
    }

    pub(crate) fn save_profile_keys_file(&self, name: &str, store: &KeyStore) -> Result<()> {
        let path = self.keys_path(name)?;
        self.write_store_file(&path, store)
    }

    fn ensure_default_profile(&self) -> Result<()> {
        let path = profile_path(&self.config, DEFAULT_PROFILE)?;
        if !path.exists() {
            write_name_list(&path, &[])?;
            tracing::debug!("default profile created");
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------
// Name-list files (profiles and directory bindings)
// ----------------------------------------------------------------------

/// Read a one-name-per-line file. Missing file → empty list.
pub(crate) fn read_name_list(path: &Path) -> Result<Vec<String>> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Atomically write one name per line.
pub(crate) fn write_name_list(path: &Path, names: &[String]) -> Result<()> {
    let mut text = String::new();
    for name in names {
        text.push_str(name);
        text.push('\n');
    }
    secure_fs::atomic_write(path, text.as_bytes())
}

/// Drop repeated names, keeping the first occurrence.
pub(crate) fn dedup_keep_first(names: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !out.contains(name) {
            out.push(name.clone());
        }
    }
    out
}

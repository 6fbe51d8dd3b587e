//! Process configuration.
//!
//! A [`Config`] is built once at process entry and handed by reference to
//! every storage call. Nothing in the crate keeps a global copy, so tests can
//! run several independent configurations side by side.

pub mod settings;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;
use zeroize::Zeroizing;

use crate::crypto::backend::command_exists;
use crate::errors::{AkError, Result};
use crate::vault::secure_fs;

pub use settings::Settings;

/// Overrides the config directory.
pub const CONFIG_DIR_ENV: &str = "AK_CONFIG_DIR";
/// Forces the plaintext backend when set to anything but `0`/empty.
pub const DISABLE_GPG_ENV: &str = "AK_DISABLE_GPG";
/// Preset passphrase for the gpg backend (CI, scripts).
pub const PASSPHRASE_ENV: &str = "AK_PASSPHRASE";
/// Overrides the gpg program from settings.
pub const GPG_PROGRAM_ENV: &str = "AK_GPG";

const INSTANCE_ID_FILE: &str = "instance.id";
const INSTANCE_ID_LEN: usize = 24;
const INSTANCE_ID_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Immutable, process-scoped configuration.
#[derive(Clone)]
pub struct Config {
    /// Root directory holding every ak artifact.
    pub config_dir: PathBuf,
    /// Directory holding `*.profile` and `*.keys[.gpg]` files.
    pub profiles_dir: PathBuf,
    /// Directory holding directory-binding `*.mapping` files.
    pub persist_dir: PathBuf,
    /// Whether the gpg program answered the availability probe.
    pub gpg_available: bool,
    /// Plaintext backend forced by env or settings.
    pub force_plain: bool,
    /// Passphrase supplied up front instead of prompting.
    pub preset_passphrase: Option<Zeroizing<String>>,
    /// `None` disables auditing.
    pub audit_log_path: Option<PathBuf>,
    /// Random per-installation identifier recorded in audit lines.
    pub instance_id: String,
    pub settings: Settings,
}

impl Config {
    /// Build the configuration from the process environment.
    ///
    /// Resolves the config directory, loads `settings.toml`, applies the
    /// `AK_*` overrides and probes for the gpg program.
    pub fn from_env() -> Result<Self> {
        let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::config_dir()
                .map(|d| d.join("ak"))
                .ok_or_else(|| {
                    AkError::ConfigError(
                        "cannot determine a config directory; set AK_CONFIG_DIR".into(),
                    )
                })?,
        };

        let mut config = Self::at(&config_dir)?;

        if let Ok(program) = std::env::var(GPG_PROGRAM_ENV) {
            if !program.is_empty() {
                config.settings.gpg_program = program;
            }
        }

        let env_disables = std::env::var(DISABLE_GPG_ENV)
            .map(|v| !v.is_empty() && v != "0")
            .unwrap_or(false);
        config.force_plain = env_disables || config.settings.disable_gpg;
        config.gpg_available = command_exists(&config.settings.gpg_program);

        if let Ok(pass) = std::env::var(PASSPHRASE_ENV) {
            if !pass.is_empty() {
                config.preset_passphrase = Some(Zeroizing::new(pass));
            }
        }

        tracing::debug!(
            dir = %config.config_dir.display(),
            gpg = config.gpg_available,
            plain = config.force_plain,
            "configuration loaded"
        );

        Ok(config)
    }

    /// Build a plaintext-backend configuration rooted at `config_dir`.
    ///
    /// Creates the directory (0700) and the instance id if needed. No
    /// environment variables are consulted.
    pub fn at(config_dir: impl AsRef<Path>) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();
        secure_fs::ensure_secure_dir(&config_dir)?;

        let settings = Settings::load(&config_dir)?;
        let instance_id = load_or_create_instance_id(&config_dir)?;
        let audit_log_path = settings.audit.then(|| config_dir.join("audit.log"));

        Ok(Self {
            profiles_dir: config_dir.join("profiles"),
            persist_dir: config_dir.join("persist"),
            gpg_available: false,
            force_plain: settings.disable_gpg,
            preset_passphrase: None,
            audit_log_path,
            instance_id,
            settings,
            config_dir,
        })
    }

    /// Mark the gpg program as available (or not).
    pub fn with_gpg(mut self, available: bool) -> Self {
        self.gpg_available = available;
        self
    }

    /// Force the plaintext backend.
    pub fn with_force_plain(mut self, force_plain: bool) -> Self {
        self.force_plain = force_plain;
        self
    }

    /// Preset the passphrase so the gpg backend never prompts.
    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.preset_passphrase = Some(Zeroizing::new(passphrase.into()));
        self
    }

    /// Whether vault files are written through the encrypted backend.
    pub fn encrypted(&self) -> bool {
        self.gpg_available && !self.force_plain
    }

    /// Suffix appended to every encrypted artifact (`.gpg` or nothing).
    pub fn store_suffix(&self) -> &'static str {
        if self.encrypted() {
            ".gpg"
        } else {
            ""
        }
    }

    /// Path of the legacy global vault for the active backend.
    pub fn vault_path(&self) -> PathBuf {
        self.config_dir
            .join(format!("keys.env{}", self.store_suffix()))
    }

    /// Identifier of this vault in the OS keyring.
    pub fn vault_id(&self) -> String {
        self.config_dir.to_string_lossy().into_owned()
    }

    /// Name of the active backend, as shown by `ak backend`.
    pub fn backend_name(&self) -> &'static str {
        if self.encrypted() {
            "gpg"
        } else {
            "plain"
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("config_dir", &self.config_dir)
            .field("profiles_dir", &self.profiles_dir)
            .field("persist_dir", &self.persist_dir)
            .field("gpg_available", &self.gpg_available)
            .field("force_plain", &self.force_plain)
            .field(
                "preset_passphrase",
                &self.preset_passphrase.as_ref().map(|_| "<redacted>"),
            )
            .field("audit_log_path", &self.audit_log_path)
            .field("instance_id", &self.instance_id)
            .field("settings", &self.settings)
            .finish()
    }
}

/// Read `instance.id` from the config dir, creating it on first use.
pub fn load_or_create_instance_id(config_dir: &Path) -> Result<String> {
    let path = config_dir.join(INSTANCE_ID_FILE);

    if path.exists() {
        let id = fs::read_to_string(&path)?.trim().to_string();
        if !id.is_empty() {
            return Ok(id);
        }
    }

    let mut rng = rand::rng();
    let id: String = (0..INSTANCE_ID_LEN)
        .map(|_| INSTANCE_ID_CHARSET[rng.random_range(0..INSTANCE_ID_CHARSET.len())] as char)
        .collect();

    secure_fs::atomic_write(&path, id.as_bytes())?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn at_builds_plaintext_layout() {
        let tmp = TempDir::new().unwrap();
        let cfg = Config::at(tmp.path()).unwrap();

        assert!(!cfg.encrypted());
        assert_eq!(cfg.vault_path(), tmp.path().join("keys.env"));
        assert_eq!(cfg.profiles_dir, tmp.path().join("profiles"));
        assert_eq!(cfg.persist_dir, tmp.path().join("persist"));
        assert_eq!(cfg.audit_log_path, Some(tmp.path().join("audit.log")));
        assert_eq!(cfg.backend_name(), "plain");
    }

    #[test]
    fn encrypted_layout_uses_gpg_suffix() {
        let tmp = TempDir::new().unwrap();
        let cfg = Config::at(tmp.path()).unwrap().with_gpg(true);

        assert!(cfg.encrypted());
        assert_eq!(cfg.vault_path(), tmp.path().join("keys.env.gpg"));
        assert_eq!(cfg.backend_name(), "gpg");

        let forced = cfg.with_force_plain(true);
        assert!(!forced.encrypted());
    }

    #[test]
    fn instance_id_is_stable_across_loads() {
        let tmp = TempDir::new().unwrap();
        let first = Config::at(tmp.path()).unwrap().instance_id;
        let second = Config::at(tmp.path()).unwrap().instance_id;

        assert_eq!(first, second);
        assert_eq!(first.len(), INSTANCE_ID_LEN);
        assert!(first
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
    }

    #[test]
    fn separate_configs_get_separate_ids() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        let cfg_a = Config::at(a.path()).unwrap();
        let cfg_b = Config::at(b.path()).unwrap();
        assert_ne!(cfg_a.config_dir, cfg_b.config_dir);
    }

    #[test]
    fn debug_output_redacts_passphrase() {
        let tmp = TempDir::new().unwrap();
        let cfg = Config::at(tmp.path()).unwrap().with_passphrase("hunter2-secret");
        let shown = format!("{cfg:?}");
        assert!(!shown.contains("hunter2-secret"));
        assert!(shown.contains("<redacted>"));
    }

    #[test]
    fn audit_can_be_disabled_in_settings() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("settings.toml"), "audit = false\n").unwrap();
        let cfg = Config::at(tmp.path()).unwrap();
        assert!(cfg.audit_log_path.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn config_dir_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("ak");
        Config::at(&dir).unwrap();

        let mode = fs::metadata(&dir).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{AkError, Result};

/// User-level settings, loaded from `<config_dir>/settings.toml`.
///
/// Every field has a sensible default so ak works out-of-the-box
/// without any settings file at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Program invoked for the encrypted backend.
    #[serde(default = "default_gpg_program")]
    pub gpg_program: String,

    /// Symmetric cipher passed to `--cipher-algo`.
    #[serde(default = "default_cipher_algo")]
    pub cipher_algo: String,

    /// Force the plaintext backend even when gpg is installed.
    #[serde(default)]
    pub disable_gpg: bool,

    /// Append hashed audit entries to `audit.log`.
    #[serde(default = "default_audit")]
    pub audit: bool,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_gpg_program() -> String {
    "gpg".to_string()
}

fn default_cipher_algo() -> String {
    "AES256".to_string()
}

fn default_audit() -> bool {
    true
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            gpg_program: default_gpg_program(),
            cipher_algo: default_cipher_algo(),
            disable_gpg: false,
            audit: default_audit(),
        }
    }
}

impl Settings {
    /// Name of the settings file inside the config directory.
    pub const FILE_NAME: &'static str = "settings.toml";

    /// Load settings from `<config_dir>/settings.toml`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(config_dir: &Path) -> Result<Self> {
        let path = config_dir.join(Self::FILE_NAME);

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)?;

        toml::from_str(&contents).map_err(|e| {
            AkError::ConfigError(format!("Failed to parse {}: {e}", path.display()))
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.gpg_program, "gpg");
        assert_eq!(s.cipher_algo, "AES256");
        assert!(!s.disable_gpg);
        assert!(s.audit);
    }

    #[test]
    fn load_returns_defaults_when_no_file() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(Settings::load(tmp.path()).unwrap(), Settings::default());
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
gpg_program = "gpg2"
cipher_algo = "TWOFISH"
disable_gpg = true
audit = false
"#;
        fs::write(tmp.path().join("settings.toml"), config).unwrap();

        let s = Settings::load(tmp.path()).unwrap();
        assert_eq!(s.gpg_program, "gpg2");
        assert_eq!(s.cipher_algo, "TWOFISH");
        assert!(s.disable_gpg);
        assert!(!s.audit);
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("settings.toml"), "audit = false\n").unwrap();

        let s = Settings::load(tmp.path()).unwrap();
        assert!(!s.audit);
        assert_eq!(s.gpg_program, "gpg");
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("settings.toml"), "not valid {{toml").unwrap();
        assert!(Settings::load(tmp.path()).is_err());
    }
}

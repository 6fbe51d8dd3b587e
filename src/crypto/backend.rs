//! Encryption backend adapter.
//!
//! Vault files pass through an [`EncryptionBackend`] on every read and
//! write. Three implementations exist:
//!
//! - [`GpgBackend`] shells out to a GPG-compatible program for symmetric
//!   encryption. Plaintext goes in on stdin and ciphertext comes out on
//!   stdout, so no plaintext temp file is ever written.
//! - [`PlainBackend`] stores bytes as-is; the owner-only file mode is the
//!   only protection.
//! - [`MemoryBackend`] is a passphrase-checked fake used by tests so they
//!   never need gpg installed.
//!
//! The backend is chosen once from [`Config`] at startup and never changes
//! within a process.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::OnceLock;

use zeroize::Zeroizing;

use crate::config::Config;
use crate::errors::{AkError, Result};
use crate::vault::secure_fs;

use super::encoding::{base64_decode, base64_encode, short_hash};
use super::passphrase::obtain_passphrase;

/// Encrypts and decrypts whole vault files.
pub trait EncryptionBackend: Send + Sync {
    /// Short backend name (`gpg`, `plain`, `memory`).
    fn name(&self) -> &'static str;

    /// Whether stored bytes are ciphertext.
    fn is_encrypted(&self) -> bool;

    /// Whether the backend can run right now.
    fn is_available(&self) -> bool;

    /// Turn plaintext into stored bytes.
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Turn stored bytes back into plaintext.
    ///
    /// Must fail with [`AkError::DecryptionFailed`] rather than return
    /// partial or empty data.
    fn decrypt(&self, stored: &[u8]) -> Result<Zeroizing<Vec<u8>>>;

    /// Encrypt `plaintext` and atomically replace `path` with the result.
    fn encrypt_to_file(&self, plaintext: &[u8], path: &Path) -> Result<()> {
        let stored = self.encrypt(plaintext)?;
        secure_fs::atomic_write(path, &stored)
    }

    /// Read `path` and decrypt its contents.
    fn decrypt_from_file(&self, path: &Path) -> Result<Zeroizing<Vec<u8>>> {
        let stored = fs::read(path)?;
        self.decrypt(&stored)
    }
}

/// Pick the backend recorded in `config`.
pub fn backend_for(config: &Config) -> Box<dyn EncryptionBackend> {
    if config.encrypted() {
        Box::new(GpgBackend::from_config(config))
    } else {
        Box::new(PlainBackend)
    }
}

/// Probe whether `program --version` runs successfully.
pub fn command_exists(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Plaintext
// ---------------------------------------------------------------------------

/// Identity backend used when gpg is missing or disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainBackend;

impl EncryptionBackend for PlainBackend {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn is_encrypted(&self) -> bool {
        false
    }

    fn is_available(&self) -> bool {
        true
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        Ok(plaintext.to_vec())
    }

    fn decrypt(&self, stored: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new(stored.to_vec()))
    }
}

// ---------------------------------------------------------------------------
// GPG
// ---------------------------------------------------------------------------

/// Symmetric encryption through an external gpg process.
pub struct GpgBackend {
    program: String,
    cipher_algo: String,
    /// Where the short-lived passphrase file is created.
    scratch_dir: PathBuf,
    preset: Option<Zeroizing<String>>,
    /// Keyring entry name.
    vault_id: String,
    /// Ask for confirmation because nothing has been encrypted yet.
    confirm_new: bool,
    /// Resolved at most once per process.
    passphrase: OnceLock<Zeroizing<String>>,
}

impl GpgBackend {
    /// Build a gpg backend from the program, cipher and passphrase in `config`.
    pub fn from_config(config: &Config) -> Self {
        let confirm_new = !has_encrypted_artifacts(config);
        Self {
            program: config.settings.gpg_program.clone(),
            cipher_algo: config.settings.cipher_algo.clone(),
            scratch_dir: config.config_dir.clone(),
            preset: config.preset_passphrase.clone(),
            vault_id: config.vault_id(),
            confirm_new,
            passphrase: OnceLock::new(),
        }
    }

    fn passphrase(&self) -> Result<&Zeroizing<String>> {
        if let Some(pass) = self.passphrase.get() {
            return Ok(pass);
        }
        let pass = obtain_passphrase(self.preset.as_ref(), &self.vault_id, self.confirm_new)?;
        let _ = self.passphrase.set(pass);
        self.passphrase
            .get()
            .ok_or_else(|| AkError::EncryptionFailed("passphrase cache unavailable".into()))
    }

    /// Run gpg with `mode_args`, feeding `input` on stdin.
    fn run(&self, mode_args: &[&str], input: &[u8]) -> Result<Output> {
        let pass = self.passphrase()?;

        // Passphrase file is 0600 and removed when `pass_file` drops.
        secure_fs::ensure_secure_dir(&self.scratch_dir)?;
        let mut pass_file = tempfile::Builder::new()
            .prefix(".pass")
            .tempfile_in(&self.scratch_dir)?;
        pass_file.write_all(pass.as_bytes())?;
        pass_file.flush()?;

        let mut child = Command::new(&self.program)
            .args(["--batch", "--yes", "--quiet", "--pinentry-mode", "loopback"])
            .arg("--passphrase-file")
            .arg(pass_file.path())
            .args(mode_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                AkError::BackendUnavailable(format!("cannot run '{}': {e}", self.program))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| AkError::EncryptionFailed("gpg stdin unavailable".into()))?;

        // Feed stdin from a second thread so a large payload cannot deadlock
        // against gpg filling its stdout pipe.
        let (output, write_result) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(input));
            let output = child.wait_with_output();
            let write_result = writer.join().unwrap_or_else(|_| {
                Err(io::Error::new(io::ErrorKind::Other, "stdin writer panicked"))
            });
            (output, write_result)
        });

        let output = output?;
        tracing::debug!(program = %self.program, status = %output.status, "gpg finished");

        // A failed gpg usually closes stdin early; report its status first.
        if output.status.success() {
            write_result?;
        }
        Ok(output)
    }
}

impl EncryptionBackend for GpgBackend {
    fn name(&self) -> &'static str {
        "gpg"
    }

    fn is_encrypted(&self) -> bool {
        true
    }

    fn is_available(&self) -> bool {
        command_exists(&self.program)
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let output = self.run(
            &["--symmetric", "--cipher-algo", self.cipher_algo.as_str(), "--output", "-"],
            plaintext,
        )?;
        if !output.status.success() {
            return Err(AkError::EncryptionFailed(format!(
                "gpg exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(output.stdout)
    }

    fn decrypt(&self, stored: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let output = self.run(&["--decrypt"], stored)?;
        if !output.status.success() {
            return Err(AkError::DecryptionFailed(format!(
                "wrong passphrase or corrupted data (gpg exited with {}: {})",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(Zeroizing::new(output.stdout))
    }
}

/// Whether any gpg-suffixed vault file already exists under `config`.
fn has_encrypted_artifacts(config: &Config) -> bool {
    if config.config_dir.join("keys.env.gpg").exists() {
        return true;
    }
    fs::read_dir(&config.profiles_dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .any(|e| e.file_name().to_string_lossy().ends_with(".keys.gpg"))
        })
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// In-memory fake
// ---------------------------------------------------------------------------

const MEMORY_MAGIC: &str = "AKMEM1";

/// Passphrase-checked fake backend.
///
/// Stored form is `AKMEM1:<passphrase tag>:<base64 payload>`. It provides
/// no secrecy at all; it exists so storage logic can be exercised against an
/// "encrypted" backend, including wrong-passphrase failures, without gpg.
pub struct MemoryBackend {
    tag: String,
}

impl MemoryBackend {
    pub fn new(passphrase: &str) -> Self {
        Self {
            tag: short_hash(passphrase.as_bytes()),
        }
    }
}

impl EncryptionBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn is_encrypted(&self) -> bool {
        true
    }

    fn is_available(&self) -> bool {
        true
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        Ok(format!("{MEMORY_MAGIC}:{}:{}", self.tag, base64_encode(plaintext)).into_bytes())
    }

    fn decrypt(&self, stored: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let text = std::str::from_utf8(stored)
            .map_err(|_| AkError::DecryptionFailed("corrupted ciphertext".into()))?;

        let mut parts = text.splitn(3, ':');
        let (magic, tag, payload) = match (parts.next(), parts.next(), parts.next()) {
            (Some(m), Some(t), Some(p)) => (m, t, p),
            _ => return Err(AkError::DecryptionFailed("corrupted ciphertext".into())),
        };

        if magic != MEMORY_MAGIC {
            return Err(AkError::DecryptionFailed("corrupted ciphertext".into()));
        }
        if tag != self.tag {
            return Err(AkError::DecryptionFailed("wrong passphrase".into()));
        }

        base64_decode(payload)
            .map(Zeroizing::new)
            .map_err(|_| AkError::DecryptionFailed("corrupted ciphertext".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn plain_backend_is_identity() {
        let b = PlainBackend;
        let stored = b.encrypt(b"A=1\n").unwrap();
        assert_eq!(stored, b"A=1\n");
        assert_eq!(b.decrypt(&stored).unwrap().as_slice(), b"A=1\n");
        assert!(!b.is_encrypted());
    }

    #[test]
    fn memory_backend_roundtrip() {
        let b = MemoryBackend::new("correct horse");
        let stored = b.encrypt(b"API_KEY=abc\n").unwrap();
        assert!(!String::from_utf8_lossy(&stored).contains("API_KEY"));
        assert_eq!(b.decrypt(&stored).unwrap().as_slice(), b"API_KEY=abc\n");
    }

    #[test]
    fn memory_backend_wrong_passphrase_fails() {
        let stored = MemoryBackend::new("right").encrypt(b"A=1").unwrap();
        let err = MemoryBackend::new("wrong").decrypt(&stored).unwrap_err();
        assert!(matches!(err, AkError::DecryptionFailed(_)));
    }

    #[test]
    fn memory_backend_rejects_plaintext() {
        let err = MemoryBackend::new("p").decrypt(b"A=1\n").unwrap_err();
        assert!(matches!(err, AkError::DecryptionFailed(_)));
    }

    #[test]
    fn file_helpers_write_and_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keys.env.gpg");
        let b = MemoryBackend::new("p");

        b.encrypt_to_file(b"X=1\n", &path).unwrap();
        assert_eq!(b.decrypt_from_file(&path).unwrap().as_slice(), b"X=1\n");
    }

    #[test]
    fn missing_program_is_not_available() {
        assert!(!command_exists("ak-definitely-not-a-real-gpg-binary"));
    }

    #[test]
    fn backend_for_follows_config() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::at(dir.path()).unwrap();
        assert_eq!(backend_for(&cfg).name(), "plain");

        let cfg = cfg.with_gpg(true);
        assert_eq!(backend_for(&cfg).name(), "gpg");

        let cfg = cfg.with_force_plain(true);
        assert_eq!(backend_for(&cfg).name(), "plain");
    }
}

//! OS keyring integration for passphrase caching.
//!
//! Stores and retrieves the gpg backend passphrase from the operating
//! system's secure credential store:
//! - macOS: Keychain
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring / KDE Wallet)
//!
//! All operations fail gracefully. If the keyring is unavailable, the
//! error is returned and the caller falls back to a passphrase prompt.

use crate::errors::{AkError, Result};

/// Service name used in the OS keyring.
const SERVICE_NAME: &str = "ak";

/// One entry per config directory, so separate installs never share a
/// passphrase by accident.
fn entry(vault_id: &str) -> Result<keyring::Entry> {
    keyring::Entry::new(SERVICE_NAME, &format!("vault:{vault_id}"))
        .map_err(|e| AkError::KeyringError(format!("failed to create keyring entry: {e}")))
}

/// Store a passphrase in the OS keyring.
pub fn store_passphrase(vault_id: &str, passphrase: &str) -> Result<()> {
    entry(vault_id)?.set_password(passphrase).map_err(|e| {
        AkError::KeyringError(format!("failed to store passphrase in keyring: {e}"))
    })
}

/// Retrieve the passphrase. `None` if nothing is stored (rather than an error).
pub fn get_passphrase(vault_id: &str) -> Result<Option<String>> {
    match entry(vault_id)?.get_password() {
        Ok(pass) => Ok(Some(pass)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(AkError::KeyringError(format!(
            "failed to read from keyring: {e}"
        ))),
    }
}

/// Delete a stored passphrase. Deleting a missing entry succeeds.
pub fn delete_passphrase(vault_id: &str) -> Result<()> {
    match entry(vault_id)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(AkError::KeyringError(format!(
            "failed to delete from keyring: {e}"
        ))),
    }
}

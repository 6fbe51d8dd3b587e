//! `ak keyring`: save the gpg passphrase to the OS keyring.
//!
//! Once saved, the gpg backend unlocks without prompting. The passphrase
//! is checked against an existing encrypted file before it is stored.

use crate::cli::output;
use crate::cli::Cli;
use crate::config::Config;
use crate::crypto::{EncryptionBackend, GpgBackend};
use crate::errors::{AkError, Result};
use crate::keyring;

/// Execute the `keyring` command.
pub fn execute(cli: &Cli, delete: bool) -> Result<()> {
    let config = Config::from_env()?;
    let vault_id = config.vault_id();

    if delete {
        keyring::delete_passphrase(&vault_id)?;
        if cli.json {
            return output::json(&serde_json::json!({ "deleted": true }));
        }
        output::success("Passphrase removed from the OS keyring");
        return Ok(());
    }

    let passphrase = dialoguer::Password::new()
        .with_prompt("Vault passphrase")
        .with_confirmation("Confirm vault passphrase", "Passphrases do not match, try again")
        .interact()
        .map_err(|e| AkError::CommandFailed(format!("passphrase prompt: {e}")))?;
    let passphrase = zeroize::Zeroizing::new(passphrase);

    // Verify against an existing encrypted vault file, if there is one.
    let probe = config.config_dir.join("keys.env.gpg");
    if config.gpg_available && probe.exists() {
        let backend = GpgBackend::from_config(&config.clone().with_passphrase(passphrase.as_str()));
        backend.decrypt_from_file(&probe)?;
    }

    keyring::store_passphrase(&vault_id, &passphrase)?;

    if cli.json {
        return output::json(&serde_json::json!({ "stored": true }));
    }
    output::success("Passphrase saved to the OS keyring");
    Ok(())
}

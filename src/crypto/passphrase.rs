//! Passphrase acquisition for the gpg backend.
//!
//! Sources, in order:
//! 1. the preset passphrase from `AK_PASSPHRASE` (CI, scripts)
//! 2. the OS keyring (only with the `keyring-store` feature)
//! 3. an interactive no-echo prompt
//!
//! The prompt is the one blocking suspension point in the storage core.
//! Interrupting it aborts the whole command.

use std::io::{self, IsTerminal};

use zeroize::Zeroizing;

use crate::errors::{AkError, Result};

/// Obtain the vault passphrase.
///
/// `vault_id` names the keyring entry. `confirm` asks twice, used when no
/// encrypted file exists yet so a typo cannot lock the vault.
pub fn obtain_passphrase(
    preset: Option<&Zeroizing<String>>,
    vault_id: &str,
    confirm: bool,
) -> Result<Zeroizing<String>> {
    // 1. Preset passphrase.
    if let Some(pass) = preset {
        if !pass.is_empty() {
            return Ok(pass.clone());
        }
    }

    // 2. OS keyring.
    #[cfg(feature = "keyring-store")]
    match crate::keyring::get_passphrase(vault_id) {
        Ok(Some(pass)) => return Ok(Zeroizing::new(pass)),
        Ok(None) => {}
        Err(e) => tracing::debug!(error = %e, "keyring lookup failed, falling back to prompt"),
    }

    #[cfg(not(feature = "keyring-store"))]
    let _ = vault_id;

    // 3. Interactive prompt.
    if !io::stdin().is_terminal() {
        return Err(AkError::BackendUnavailable(
            "no passphrase available; set AK_PASSPHRASE or run interactively".into(),
        ));
    }

    let mut prompt = dialoguer::Password::new().with_prompt("Vault passphrase");
    if confirm {
        prompt = prompt.with_confirmation(
            "Confirm vault passphrase",
            "Passphrases do not match, try again",
        );
    }

    let pass = prompt
        .interact()
        .map_err(|e| AkError::CommandFailed(format!("passphrase prompt: {e}")))?;

    if pass.is_empty() {
        return Err(AkError::CommandFailed("empty passphrase not allowed".into()));
    }

    Ok(Zeroizing::new(pass))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_passphrase_wins() {
        let preset = Zeroizing::new("from-env".to_string());
        let pass = obtain_passphrase(Some(&preset), "vault", false).unwrap();
        assert_eq!(pass.as_str(), "from-env");
    }
}

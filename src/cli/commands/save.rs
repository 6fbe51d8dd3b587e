//! `ak save`: save a profile from keys in the global vault.
//!
//! Usage:
//!   ak save work OPENAI_API_KEY GITHUB_TOKEN
//!   ak save everything            # every key in the vault

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::errors::Result;

/// Execute the `save` command.
pub fn execute(cli: &Cli, profile: &str, names: &[String]) -> Result<()> {
    let store = open_store()?;
    let saved = store.save_profile_from_vault(profile, names)?;

    if cli.json {
        return output::json(&serde_json::json!({
            "profile": profile,
            "keys": saved.keys,
            "copied": saved.copied.len(),
        }));
    }

    output::success(&format!(
        "Saved profile '{profile}' ({} keys, {} values stored in the profile)",
        saved.keys.len(),
        saved.copied.len()
    ));

    let missing = saved.keys.len() - saved.copied.len();
    if missing > 0 {
        output::warning(&format!(
            "{missing} key(s) are not in the vault; they will resolve from the environment if set"
        ));
    }
    Ok(())
}

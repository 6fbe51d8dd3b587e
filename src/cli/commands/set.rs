//! `ak set`: add or update a secret in the global vault.
//!
//! Usage:
//!   ak set API_KEY sk-123            # inline value
//!   ak set API_KEY=sk-123            # inline assignment
//!   echo sk-123 | ak set API_KEY     # piped
//!   ak set API_KEY                   # interactive prompt
//!   ak set API_KEY -p work           # also add to profile `work`

use crate::cli::output;
use crate::cli::{open_store, read_secret_value, split_assignment, Cli};
use crate::errors::Result;
use crate::vault::validate_key_name;

/// Execute the `set` command.
pub fn execute(cli: &Cli, name: &str, value: Option<&str>, profile: Option<&str>) -> Result<()> {
    let (name, inline) = split_assignment(name, value);
    validate_key_name(&name)?;

    let secret = read_secret_value(&name, inline)?;

    let store = open_store()?;
    let mut vault = store.load_vault()?;
    let added = vault.set(name.as_str(), secret.as_str());
    store.save_vault(&vault)?;

    let action = if added { "add" } else { "update" };
    store.audit().record(action, &[name.as_str()]);

    // Profile stores win resolution, so older copies must follow the vault.
    let refreshed = store.refresh_profile_copies(&name, &secret)?;

    if let Some(profile) = profile {
        let new_in_profile = store.add_profile_key(profile, &name, &secret)?;
        if !cli.json {
            let what = if new_in_profile { "added to" } else { "updated in" };
            output::success(&format!("'{name}' {what} profile '{profile}'"));
        }
    }

    if cli.json {
        return output::json(&serde_json::json!({
            "name": name,
            "status": if added { "added" } else { "updated" },
            "profile": profile,
            "refreshed_profiles": refreshed,
            "total": vault.len(),
        }));
    }

    let verb = if added { "added" } else { "updated" };
    output::success(&format!("Secret '{name}' {verb} ({} total)", vault.len()));
    if !refreshed.is_empty() {
        output::info(&format!("Also updated in profile(s): {}", refreshed.join(", ")));
    }
    if profile.is_none() {
        output::tip("Group keys with: ak save <profile> [NAMES...]");
    }

    Ok(())
}

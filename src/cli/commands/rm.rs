//! `ak rm`: remove a secret, a key from a profile, or a whole profile.
//!
//! Usage:
//!   ak rm API_KEY                 # from the global vault and every profile
//!   ak rm API_KEY --profile work  # from profile `work` only
//!   ak rm --profile work          # delete profile `work`

use crate::cli::output;
use crate::cli::{confirm, open_store, Cli};
use crate::errors::{AkError, Result};

/// Execute the `rm` command.
pub fn execute(cli: &Cli, name: Option<&str>, profile: Option<&str>, force: bool) -> Result<()> {
    let store = open_store()?;

    match (name, profile) {
        (Some(name), None) => {
            let mut vault = store.load_vault()?;
            let in_vault = vault.remove(name);
            if in_vault {
                store.save_vault(&vault)?;
            }
            let profiles = store.forget_profile_copies(name)?;
            if !in_vault && profiles.is_empty() {
                return Err(AkError::KeyNotFound(name.to_string()));
            }
            store.audit().record("rm", &[name]);
            if !cli.json && !profiles.is_empty() {
                output::info(&format!("Also removed from profiles: {}", profiles.join(", ")));
            }
            report(cli, &format!("Removed '{name}'"))
        }
        (Some(name), Some(profile)) => {
            if !store.remove_profile_key(profile, name)? {
                return Err(AkError::KeyNotFound(format!("{name} in profile {profile}")));
            }
            report(cli, &format!("Removed '{name}' from profile '{profile}'"))
        }
        (None, Some(profile)) => {
            if !store.profile_exists(profile)? {
                return Err(AkError::ProfileNotFound(profile.to_string()));
            }
            if !confirm(&format!("Delete profile '{profile}' and its stored keys?"), force)? {
                output::info("Cancelled.");
                return Ok(());
            }
            store.delete_profile(profile)?;
            report(cli, &format!("Removed profile '{profile}'"))
        }
        (None, None) => Err(AkError::CommandFailed(
            "nothing to remove; give a NAME, --profile <PROFILE>, or both".into(),
        )),
    }
}

fn report(cli: &Cli, msg: &str) -> Result<()> {
    if cli.json {
        return output::json(&serde_json::json!({ "status": "removed", "message": msg }));
    }
    output::success(msg);
    Ok(())
}

//! `ak env`: print export lines for a profile.
//!
//! Usage:
//!   eval "$(ak env --profile work)"

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::errors::Result;

/// Execute the `env` command.
pub fn execute(_cli: &Cli, profile: &str) -> Result<()> {
    let store = open_store()?;

    if !store.profile_exists(profile)? {
        output::warning(&format!("Profile '{profile}' does not exist; nothing to export"));
    }

    let exports = store.make_exports(profile)?;
    let keys = store.read_profile(profile)?;
    let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    store.audit().record("env", &refs);

    print!("{exports}");
    Ok(())
}

//! `ak unload`: print unset lines for profile keys.
//!
//! Usage:
//!   eval "$(ak unload work)"
//!   eval "$(ak unload)"                 # every profile
//!   eval "$(ak unload work --persist)"  # also unbind from this directory

use std::collections::BTreeSet;

use crate::cli::output;
use crate::cli::{current_dir, open_store, Cli};
use crate::codec::render_unsets;
use crate::errors::{AkError, Result};

/// Execute the `unload` command.
pub fn execute(_cli: &Cli, profiles: &[String], persist: bool) -> Result<()> {
    let store = open_store()?;

    let targets = if profiles.is_empty() {
        store.list_profiles()?
    } else {
        profiles.to_vec()
    };

    let mut keys = BTreeSet::new();
    for profile in &targets {
        keys.extend(store.read_profile(profile)?);
    }

    if persist {
        let dir = current_dir()?;
        let removed = store.unbind_dir_profiles(&dir, profiles)?;
        if removed.is_empty() {
            output::warning(&AkError::BindingNotFound(dir).to_string());
        } else {
            output::success(&format!(
                "Unbound {} profile(s) from this directory",
                removed.len()
            ));
        }
    }

    let refs: Vec<&str> = targets.iter().map(String::as_str).collect();
    store.audit().record("unload", &refs);

    print!("{}", render_unsets(keys.iter().map(String::as_str)));
    Ok(())
}

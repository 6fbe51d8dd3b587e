//! `ak load`: print export lines for a profile or a single key.
//!
//! Usage:
//!   eval "$(ak load work)"
//!   eval "$(ak load OPENAI_API_KEY --persist)"
//!
//! With `--persist` the profile is also bound to the current directory so
//! `ak autoload` picks it up. A single key is persisted through a
//! `_key_<NAME>` profile holding just that key.

use crate::cli::output;
use crate::cli::{current_dir, open_store, Cli};
use crate::codec::export_line;
use crate::errors::{AkError, Result};
use crate::vault::{validate_profile_name, VaultStore};

/// Profile-name prefix used to persist a single key.
const KEY_PROFILE_PREFIX: &str = "_key_";

/// Execute the `load` command.
pub fn execute(_cli: &Cli, name: &str, persist: bool) -> Result<()> {
    let store = open_store()?;

    let exports = if is_profile(&store, name)? {
        let exports = store.make_exports(name)?;
        if persist {
            store.bind_dir_profile(&current_dir()?, name)?;
        }
        store.audit().record("load_profile", &[name]);
        exports
    } else {
        let vault = store.load_vault()?;
        let value = vault.get(name).ok_or_else(|| {
            AkError::KeyNotFound(format!("neither a profile nor a key named {name}"))
        })?;
        let exports = format!("{}\n", export_line(name, value));

        if persist {
            let key_profile = format!("{KEY_PROFILE_PREFIX}{name}");
            store.save_profile_from_vault(&key_profile, &[name.to_string()])?;
            store.bind_dir_profile(&current_dir()?, &key_profile)?;
        }
        store.audit().record("load_key", &[name]);
        exports
    };

    if persist {
        output::success(&format!("'{name}' will load automatically in this directory"));
    }

    print!("{exports}");
    Ok(())
}

fn is_profile(store: &VaultStore, name: &str) -> Result<bool> {
    if validate_profile_name(name).is_err() {
        return Ok(false);
    }
    store.profile_exists(name)
}

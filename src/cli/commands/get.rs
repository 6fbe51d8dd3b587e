//! `ak get`: print a single secret, masked unless `--full`.

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::errors::{AkError, Result};
use crate::vault::mask_value;

/// Execute the `get` command.
pub fn execute(cli: &Cli, name: &str, full: bool, profile: Option<&str>) -> Result<()> {
    let store = open_store()?;

    let (value, source) = match profile {
        Some(profile) => {
            let resolved = store
                .resolve_key(profile, name)?
                .ok_or_else(|| AkError::KeyNotFound(name.to_string()))?;
            (resolved.value.clone(), resolved.source.as_str())
        }
        None => {
            let vault = store.load_vault()?;
            let value = vault
                .get(name)
                .ok_or_else(|| AkError::KeyNotFound(name.to_string()))?
                .to_string();
            (value, "vault")
        }
    };

    store.audit().record("get", &[name]);

    let shown = if full { value.clone() } else { mask_value(&value) };

    if cli.json {
        return output::json(&serde_json::json!({
            "name": name,
            "value": shown,
            "masked": !full,
            "source": source,
        }));
    }

    println!("{shown}");
    Ok(())
}

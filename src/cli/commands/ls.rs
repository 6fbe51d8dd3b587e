//! `ak ls`: list secrets with masked values.

use crate::cli::output::{self, MaskedEntry};
use crate::cli::{open_store, Cli};
use crate::errors::Result;

/// Execute the `ls` command.
pub fn execute(cli: &Cli, profile: Option<&str>) -> Result<()> {
    let store = open_store()?;

    let entries: Vec<MaskedEntry> = match profile {
        Some(profile) => {
            let resolution = store.resolve_profile(profile)?;
            let mut entries: Vec<MaskedEntry> = resolution
                .values
                .iter()
                .map(|v| MaskedEntry::new(&v.name, &v.value))
                .collect();
            entries.extend(resolution.missing.iter().map(|name| MaskedEntry {
                name: name.clone(),
                masked: "(missing)".into(),
            }));
            entries
        }
        None => {
            let vault = store.load_vault()?;
            vault.iter().map(|(k, v)| MaskedEntry::new(k, v)).collect()
        }
    };

    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    store.audit().record("ls", &names);

    if cli.json {
        return output::json(&entries);
    }

    output::print_secrets_table(&entries);
    Ok(())
}

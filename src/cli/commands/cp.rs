//! `ak cp`: copy a secret to the system clipboard.

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::errors::{AkError, Result};

/// Execute the `cp` command.
pub fn execute(cli: &Cli, name: &str, profile: Option<&str>) -> Result<()> {
    let store = open_store()?;

    let value = match profile {
        Some(profile) => store
            .resolve_key(profile, name)?
            .map(|r| Zeroizing::new(r.value.clone())),
        None => store
            .load_vault()?
            .get(name)
            .map(|v| Zeroizing::new(v.to_string())),
    }
    .ok_or_else(|| AkError::KeyNotFound(name.to_string()))?;

    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| AkError::ClipboardError(e.to_string()))?;
    clipboard
        .set_text(value.as_str())
        .map_err(|e| AkError::ClipboardError(e.to_string()))?;

    store.audit().record("cp", &[name]);

    if cli.json {
        return output::json(&serde_json::json!({ "name": name, "status": "copied" }));
    }
    output::success(&format!("Copied '{name}' to clipboard"));
    Ok(())
}

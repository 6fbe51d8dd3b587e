//! `ak import`: import secrets from external files.
//!
//! Supported formats:
//! - `env`: shell-rc / `export NAME="value"` lines
//! - `dotenv`: `NAME=value` lines
//! - `json`: flat object with string values
//!
//! Imported pairs land in the global vault and in the target profile's key
//! store. `NAME=` lines are skipped unless `--keep-empty` is given, in which
//! case the empty string is stored as the value.

use std::fs;
use std::path::Path;

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::codec::{self, Format};
use crate::errors::{AkError, Result};
use crate::vault::validate_profile_name;

/// Execute the `import` command.
pub fn execute(
    cli: &Cli,
    profile: &str,
    format: Option<&str>,
    file: &Path,
    keep_empty: bool,
) -> Result<()> {
    validate_profile_name(profile)?;

    if !file.exists() {
        return Err(AkError::CommandFailed(format!(
            "import file not found: {}",
            file.display()
        )));
    }

    // Detect format from flag or file extension.
    let format = match format {
        Some(f) => f.parse::<Format>()?,
        None => detect_format(file),
    };

    let text = fs::read_to_string(file)
        .map_err(|e| AkError::ImportParse(format!("failed to read {}: {e}", file.display())))?;
    let parsed = codec::parse(format, &text)?;

    let (pairs, skipped): (Vec<_>, Vec<_>) =
        parsed.into_iter().partition(|(_, value)| keep_empty || !value.is_empty());

    if pairs.is_empty() {
        output::warning("No secrets found in the import file.");
        return Ok(());
    }

    let store = open_store()?;

    // 1. Global vault.
    let mut vault = store.load_vault()?;
    let mut added = 0;
    for (name, value) in &pairs {
        if vault.set(name.as_str(), value.as_str()) {
            added += 1;
        }
    }
    store.save_vault(&vault)?;
    for (name, value) in &pairs {
        store.refresh_profile_copies(name, value)?;
    }

    // 2. Profile key store and key list.
    let mut profile_store = store.load_profile_keys(profile)?;
    let mut keys = store.read_profile(profile)?;
    for (name, value) in &pairs {
        profile_store.set(name.as_str(), value.as_str());
        if !keys.contains(name) {
            keys.push(name.clone());
        }
    }
    store.save_profile_keys(profile, &profile_store)?;
    store.write_profile(profile, &keys)?;

    let names: Vec<&str> = pairs.iter().map(|(n, _)| n.as_str()).collect();
    store.audit().record("import", &names);

    if cli.json {
        let skipped: Vec<&str> = skipped.iter().map(|(n, _)| n.as_str()).collect();
        return output::json(&serde_json::json!({
            "profile": profile,
            "format": format.to_string(),
            "imported": names,
            "new": added,
            "skipped_empty": skipped,
        }));
    }

    for name in &names {
        output::info(&format!("  + {name}"));
    }
    for (name, _) in &skipped {
        output::warning(&format!("  skipped {name} (empty value)"));
    }
    if !skipped.is_empty() {
        output::tip("Re-run with --keep-empty to store empty values.");
    }
    output::success(&format!(
        "Imported {} secret(s) from {} into profile '{profile}' ({added} new in the vault)",
        names.len(),
        file.display()
    ));

    Ok(())
}

/// Detect the file format from its name.
fn detect_format(path: &Path) -> Format {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    if file_name.ends_with(".json") {
        Format::Json
    } else if file_name == ".env" || file_name.starts_with(".env.") || file_name.ends_with(".env")
    {
        Format::Dotenv
    } else {
        Format::Env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_format_from_extension() {
        assert_eq!(detect_format(Path::new("secrets.json")), Format::Json);
        assert_eq!(detect_format(Path::new("SECRETS.JSON")), Format::Json);
        assert_eq!(detect_format(Path::new(".env")), Format::Dotenv);
        assert_eq!(detect_format(Path::new(".env.local")), Format::Dotenv);
        assert_eq!(detect_format(Path::new("prod.env")), Format::Dotenv);
        assert_eq!(detect_format(Path::new(".bashrc")), Format::Env);
        assert_eq!(detect_format(Path::new("noext")), Format::Env);
    }
}

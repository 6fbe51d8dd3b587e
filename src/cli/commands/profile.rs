//! `ak profile`: create, delete and inspect profiles.

use crate::cli::output;
use crate::cli::{confirm, open_store, Cli, ProfileAction};
use crate::errors::{AkError, Result};
use crate::vault::{mask_value, ValueSource};

/// Execute a `profile` subcommand.
pub fn execute(cli: &Cli, action: &ProfileAction) -> Result<()> {
    match action {
        ProfileAction::Create { name } => create(cli, name),
        ProfileAction::Delete { name, force } => delete(cli, name, *force),
        ProfileAction::Show { name } => show(cli, name),
    }
}

fn create(cli: &Cli, name: &str) -> Result<()> {
    let store = open_store()?;
    let created = store.create_profile(name)?;

    if cli.json {
        return output::json(&serde_json::json!({ "profile": name, "created": created }));
    }
    if created {
        output::success(&format!("Created profile '{name}'"));
        output::tip(&format!("Add keys with: ak set <NAME> --profile {name}"));
    } else {
        output::info(&format!("Profile '{name}' already exists"));
    }
    Ok(())
}

fn delete(cli: &Cli, name: &str, force: bool) -> Result<()> {
    let store = open_store()?;
    if !store.profile_exists(name)? {
        return Err(AkError::ProfileNotFound(name.to_string()));
    }
    if !confirm(&format!("Delete profile '{name}' and its stored keys?"), force)? {
        output::info("Cancelled.");
        return Ok(());
    }

    store.delete_profile(name)?;

    if cli.json {
        return output::json(&serde_json::json!({ "profile": name, "deleted": true }));
    }
    output::success(&format!("Deleted profile '{name}'"));
    Ok(())
}

fn show(cli: &Cli, name: &str) -> Result<()> {
    let store = open_store()?;
    if !store.profile_exists(name)? {
        return Err(AkError::ProfileNotFound(name.to_string()));
    }

    let resolution = store.resolve_profile(name)?;
    let stored = if resolution.unlisted.is_empty() {
        None
    } else {
        Some(store.load_profile_keys(name)?)
    };
    let mut rows: Vec<(String, String, String)> = resolution
        .values
        .iter()
        .map(|v| (v.name.clone(), mask_value(&v.value), v.source.as_str().to_string()))
        .collect();
    rows.extend(
        resolution
            .missing
            .iter()
            .map(|m| (m.clone(), "(missing)".to_string(), "-".to_string())),
    );
    if let Some(stored) = &stored {
        rows.extend(resolution.unlisted.iter().map(|n| {
            let masked = stored.get(n).map(mask_value).unwrap_or_default();
            (n.clone(), masked, "unlisted".to_string())
        }));
    }

    let names: Vec<&str> = rows.iter().map(|r| r.0.as_str()).collect();
    store.audit().record("show_profile", &names);

    if cli.json {
        let keys: Vec<_> = rows
            .iter()
            .map(|(n, m, s)| serde_json::json!({ "name": n, "masked": m, "source": s }))
            .collect();
        return output::json(&serde_json::json!({ "profile": name, "keys": keys }));
    }

    let from_profile = resolution
        .values
        .iter()
        .filter(|v| v.source == ValueSource::Profile)
        .count();
    output::info(&format!(
        "Profile '{name}': {} key(s), {from_profile} stored in the profile, {} missing",
        resolution.values.len() + resolution.missing.len(),
        resolution.missing.len()
    ));
    if !resolution.unlisted.is_empty() {
        output::warning(&format!(
            "{} stored name(s) are not valid identifiers and are never exported: {}",
            resolution.unlisted.len(),
            resolution.unlisted.join(", ")
        ));
    }

    let mut table = comfy_table::Table::new();
    table.set_content_arrangement(comfy_table::ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Value", "Source"]);
    for (n, m, s) in &rows {
        table.add_row(vec![n.as_str(), m.as_str(), s.as_str()]);
    }
    println!("{table}");
    Ok(())
}

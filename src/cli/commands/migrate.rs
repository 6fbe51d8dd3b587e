//! `ak migrate`: legacy vault migration and backend conversion.
//!
//! Usage:
//!   ak migrate                      # copy the legacy vault into `default`
//!   ak migrate backend --to gpg     # re-encrypt plaintext files with gpg
//!   ak migrate backend --to plain   # decrypt gpg files to plaintext

use crate::cli::output;
use crate::cli::{open_store, BackendKind, Cli, MigrateAction};
use crate::config::Config;
use crate::crypto::{EncryptionBackend, GpgBackend, PlainBackend};
use crate::errors::Result;
use crate::vault::{MigrationOutcome, VaultStore};

/// Execute the `migrate` command.
pub fn execute(cli: &Cli, action: Option<&MigrateAction>) -> Result<()> {
    match action {
        None | Some(MigrateAction::Legacy) => legacy(cli),
        Some(MigrateAction::Backend { to }) => backend(cli, *to),
    }
}

fn legacy(cli: &Cli) -> Result<()> {
    let store = open_store()?;
    let outcome = store.ensure_migrated()?;

    if cli.json {
        let migrated = match outcome {
            MigrationOutcome::Migrated { keys } => keys,
            MigrationOutcome::NotNeeded => 0,
        };
        return output::json(&serde_json::json!({
            "migrated": matches!(outcome, MigrationOutcome::Migrated { .. }),
            "keys": migrated,
        }));
    }

    match outcome {
        MigrationOutcome::Migrated { keys } => {
            output::success(&format!(
                "Migrated {keys} key(s) from the global vault into profile 'default'"
            ));
            output::tip("The global vault is kept; remove it once you no longer need it.");
        }
        MigrationOutcome::NotNeeded => output::info("Nothing to migrate."),
    }
    Ok(())
}

fn backend(cli: &Cli, to: BackendKind) -> Result<()> {
    let config = Config::from_env()?;

    let gpg: Box<dyn EncryptionBackend> = Box::new(GpgBackend::from_config(&config));
    let plain: Box<dyn EncryptionBackend> = Box::new(PlainBackend);
    let (source_backend, target_backend) = match to {
        BackendKind::Gpg => (plain, gpg),
        BackendKind::Plain => (gpg, plain),
    };

    let source = VaultStore::with_backend(config.clone(), source_backend);
    let target = VaultStore::with_backend(config.clone(), target_backend);
    let report = source.convert_backend(&target)?;

    if cli.json {
        return output::json(&serde_json::json!({
            "backend": target.backend().name(),
            "vault_keys": report.vault_keys,
            "profiles": report.profiles,
            "removed": report.removed,
        }));
    }

    output::success(&format!(
        "Converted the global vault ({} key(s)) and {} profile store(s) to the {} backend",
        report.vault_keys,
        report.profiles.len(),
        target.backend().name()
    ));

    let active = config.backend_name();
    if active != target.backend().name() {
        output::warning(&format!("The active backend is still '{active}'."));
        match to {
            BackendKind::Plain => {
                output::tip("Set AK_DISABLE_GPG=1 or `disable_gpg = true` in settings.toml.")
            }
            BackendKind::Gpg => output::tip(
                "Install gpg and unset AK_DISABLE_GPG / `disable_gpg` in settings.toml.",
            ),
        }
    }
    Ok(())
}

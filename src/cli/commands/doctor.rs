//! `ak doctor`: check the installation and report problems.

use serde::Serialize;

use crate::cli::output;
use crate::cli::Cli;
use crate::config::Config;
use crate::errors::{AkError, Result};
use crate::vault::{MigrationState, VaultStore};

/// Outcome of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Status {
    Ok,
    Warn,
    Fail,
}

#[derive(Debug, Serialize)]
struct Check {
    name: &'static str,
    status: Status,
    detail: String,
}

impl Check {
    fn new(name: &'static str, status: Status, detail: impl Into<String>) -> Self {
        Self {
            name,
            status,
            detail: detail.into(),
        }
    }
}

/// Execute the `doctor` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let config = Config::from_env()?;
    let checks = run_checks(&config);
    let failures = checks.iter().filter(|c| c.status == Status::Fail).count();

    if cli.json {
        output::json(&checks)?;
    } else {
        print_checks(&checks);
    }

    if failures > 0 {
        return Err(AkError::CommandFailed(format!(
            "{failures} check(s) failed"
        )));
    }
    if !cli.json {
        output::success("All checks passed");
    }
    Ok(())
}

fn run_checks(config: &Config) -> Vec<Check> {
    let mut checks = Vec::new();

    checks.push(Check::new(
        "config dir",
        Status::Ok,
        config.config_dir.display().to_string(),
    ));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&config.config_dir)
            .map(|m| m.permissions().mode() & 0o777)
            .unwrap_or(0);
        let status = if mode & 0o077 == 0 {
            Status::Ok
        } else {
            Status::Warn
        };
        checks.push(Check::new("permissions", status, format!("{mode:o}")));
    }

    let gpg_detail = if config.gpg_available {
        format!("'{}' found", config.settings.gpg_program)
    } else {
        format!("'{}' not found", config.settings.gpg_program)
    };
    let gpg_status = if config.gpg_available || config.force_plain {
        Status::Ok
    } else {
        Status::Warn
    };
    checks.push(Check::new("gpg", gpg_status, gpg_detail));

    let backend_detail = if config.force_plain {
        format!("{} (forced)", config.backend_name())
    } else {
        config.backend_name().to_string()
    };
    checks.push(Check::new("backend", Status::Ok, backend_detail));

    let store = VaultStore::new(config.clone());

    match store.migration_state() {
        Ok(MigrationState::Unmigrated) => checks.push(Check::new(
            "migration",
            Status::Warn,
            "legacy vault not yet migrated; run `ak migrate`",
        )),
        Ok(MigrationState::Migrated) => {
            checks.push(Check::new("migration", Status::Ok, "up to date"))
        }
        Err(e) => checks.push(Check::new("migration", Status::Fail, e.to_string())),
    }

    match store.load_vault() {
        Ok(vault) => checks.push(Check::new(
            "vault",
            Status::Ok,
            format!("{} key(s)", vault.len()),
        )),
        Err(e) => checks.push(Check::new("vault", Status::Fail, e.to_string())),
    }

    match store.list_profiles() {
        Ok(profiles) => checks.push(Check::new(
            "profiles",
            Status::Ok,
            format!("{} profile(s)", profiles.len()),
        )),
        Err(e) => checks.push(Check::new("profiles", Status::Fail, e.to_string())),
    }

    let audit_detail = match &config.audit_log_path {
        Some(path) => path.display().to_string(),
        None => "disabled".to_string(),
    };
    checks.push(Check::new("audit log", Status::Ok, audit_detail));

    checks
}

fn print_checks(checks: &[Check]) {
    use comfy_table::{ContentArrangement, Table};
    use console::style;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Check", "Status", "Detail"]);

    for check in checks {
        let status = match check.status {
            Status::Ok => style("ok").green().to_string(),
            Status::Warn => style("warn").yellow().to_string(),
            Status::Fail => style("fail").red().to_string(),
        };
        table.add_row(vec![check.name.to_string(), status, check.detail.clone()]);
    }

    println!("{table}");
}

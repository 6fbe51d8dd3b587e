//! `ak audit`: display the audit log.
//!
//! Usage:
//!   ak audit               # show last 20 entries
//!   ak audit -n 50         # show last 50
//!   ak audit --since 7d    # entries from last 7 days
//!   ak audit --since 2026-01-01

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::audit::{AuditEntry, AuditLog};
use crate::cli::output;
use crate::cli::Cli;
use crate::config::Config;
use crate::errors::{AkError, Result};

/// Execute the `audit` command.
pub fn execute(cli: &Cli, last: usize, since: Option<&str>) -> Result<()> {
    let config = Config::from_env()?;
    let audit = AuditLog::from_config(&config);

    if !audit.is_enabled() {
        output::info("Auditing is disabled (`audit = false` in settings.toml).");
        return Ok(());
    }

    let since_dt = match since {
        Some(s) => Some(parse_since(s)?),
        None => None,
    };

    let entries = audit.tail(last, since_dt)?;

    if cli.json {
        return output::json(&entries);
    }

    if entries.is_empty() {
        output::info("No audit entries found.");
        return Ok(());
    }

    print_audit_table(&entries);

    Ok(())
}

/// Parse `--since`: a relative span (`30m`, `24h`, `7d`, `2w`) or a
/// calendar date (`2026-01-31`, midnight UTC).
fn parse_since(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    let invalid = || {
        AkError::CommandFailed(format!(
            "invalid --since '{input}': use 30m, 24h, 7d, 2w or YYYY-MM-DD"
        ))
    };

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .ok_or_else(invalid);
    }

    let unit = input.chars().last().ok_or_else(invalid)?;
    let amount: i64 = input[..input.len() - unit.len_utf8()]
        .parse()
        .ok()
        .filter(|n| *n >= 0)
        .ok_or_else(invalid)?;

    let span = match unit {
        'm' => Duration::minutes(amount),
        'h' => Duration::hours(amount),
        'd' => Duration::days(amount),
        'w' => Duration::weeks(amount),
        _ => return Err(invalid()),
    };

    Ok(Utc::now() - span)
}

/// Print audit entries in a formatted table.
fn print_audit_table(entries: &[AuditEntry]) {
    use comfy_table::{ContentArrangement, Table};
    use console::style;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Action", "Count", "Keys"]);

    for entry in entries {
        let time = entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
        let keys = if entry.keys.is_empty() {
            "-".to_string()
        } else {
            entry.keys.join(", ")
        };

        table.add_row(vec![
            time,
            colorize_action(&entry.action),
            entry.count.to_string(),
            keys,
        ]);
    }

    println!(
        "{}",
        style(format!("{} audit entries:", entries.len())).bold()
    );
    println!("{table}");
}

/// Colorize action names for display.
fn colorize_action(action: &str) -> String {
    use console::style;

    match action {
        "add" | "update" | "add_profile" | "save_profile" => style(action).blue().to_string(),
        "rm" | "rm_profile" | "unbind" => style(action).red().to_string(),
        "migrate" | "convert_backend" => style(action).yellow().to_string(),
        "export" | "import" | "export_missing" => style(action).cyan().to_string(),
        "load_profile" | "load_key" | "env" | "autoload" => style(action).green().to_string(),
        _ => action.to_string(),
    }
}

//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command. Status messages go to stderr
//! so that stdout stays clean for `eval "$(ak env ...)"`.

use comfy_table::{ContentArrangement, Table};
use console::style;
use serde::Serialize;

use crate::errors::{AkError, Result};
use crate::vault::mask_value;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    eprintln!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    eprintln!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    eprintln!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print `value` as pretty JSON on stdout.
pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AkError::SerializationError(format!("JSON output: {e}")))?;
    println!("{text}");
    Ok(())
}

/// Print an error as `{"error": "..."}` on stdout.
pub fn json_error(err: &AkError) {
    let body = serde_json::json!({ "error": err.to_string() });
    println!("{body}");
}

/// One row of `ak ls`.
#[derive(Debug, Serialize)]
pub struct MaskedEntry {
    pub name: String,
    pub masked: String,
}

impl MaskedEntry {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            masked: mask_value(value),
        }
    }
}

/// Print a table of secrets with masked values (Name, Value).
pub fn print_secrets_table(entries: &[MaskedEntry]) {
    if entries.is_empty() {
        info("No secrets stored yet.");
        tip("Run `ak set <NAME>` to add your first secret.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Value"]);

    for e in entries {
        table.add_row(vec![e.name.clone(), e.masked.clone()]);
    }

    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masked_entry_never_carries_the_value() {
        let e = MaskedEntry::new("API_KEY", "sk-abcdefgh12345678");
        assert_eq!(e.masked, "sk-abcde***5678");
        let json = serde_json::to_string(&e).unwrap();
        assert!(!json.contains("sk-abcdefgh12345678"));
    }
}

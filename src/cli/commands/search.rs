//! `ak search`: find secret names by case-insensitive substring.

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::errors::Result;

/// Execute the `search` command.
pub fn execute(cli: &Cli, pattern: &str) -> Result<()> {
    let store = open_store()?;
    let hits = store.load_vault()?.search(pattern);

    let refs: Vec<&str> = hits.iter().map(String::as_str).collect();
    store.audit().record("search", &refs);

    if cli.json {
        return output::json(&hits);
    }

    if hits.is_empty() {
        output::info(&format!("No secrets match '{pattern}'."));
    }
    for hit in &hits {
        println!("{hit}");
    }
    Ok(())
}

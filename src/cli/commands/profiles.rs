//! `ak profiles`: list profile names.

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::errors::Result;

/// Execute the `profiles` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let store = open_store()?;
    let profiles = store.list_profiles()?;

    if cli.json {
        return output::json(&profiles);
    }
    for name in &profiles {
        println!("{name}");
    }
    Ok(())
}

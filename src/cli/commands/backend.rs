//! `ak backend`: show the active encryption backend.

use crate::cli::output;
use crate::cli::Cli;
use crate::config::Config;
use crate::errors::Result;

/// Execute the `backend` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let config = Config::from_env()?;

    if cli.json {
        return output::json(&serde_json::json!({
            "backend": config.backend_name(),
            "gpg_available": config.gpg_available,
            "force_plain": config.force_plain,
            "gpg_program": config.settings.gpg_program,
        }));
    }

    println!("{}", config.backend_name());
    Ok(())
}

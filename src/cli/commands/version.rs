//! `ak version`: display version and the active backend.

use console::style;

use crate::config::Config;
use crate::errors::Result;

/// Execute the `version` command.
pub fn execute() -> Result<()> {
    println!("ak {}", env!("CARGO_PKG_VERSION"));

    match Config::from_env() {
        Ok(config) => println!(
            "{} {}",
            style("backend:").dim(),
            config.backend_name()
        ),
        Err(e) => tracing::debug!(error = %e, "no configuration for version output"),
    }

    Ok(())
}

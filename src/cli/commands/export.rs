//! `ak export`: export a profile's resolved secrets.
//!
//! Supported formats:
//! - `env` (default): `export NAME="value"` lines
//! - `dotenv`: `NAME=value` lines
//! - `json`: `{ "NAME": "value", ... }` in profile order

use std::path::Path;

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::codec::{self, Format};
use crate::errors::{AkError, Result};
use crate::vault::secure_fs;

/// Execute the `export` command.
pub fn execute(cli: &Cli, profile: &str, format: &str, output_path: Option<&Path>) -> Result<()> {
    let format: Format = format.parse()?;
    let store = open_store()?;

    let resolution = store.resolve_profile(profile)?;
    let pairs: Vec<(&str, &str)> = resolution
        .values
        .iter()
        .map(|v| (v.name.as_str(), v.value.as_str()))
        .collect();

    let content = zeroize::Zeroizing::new(codec::render(format, &pairs)?);

    let names: Vec<&str> = pairs.iter().map(|(n, _)| *n).collect();
    store.audit().record("export", &names);

    for missing in &resolution.missing {
        output::warning(&format!("{missing} has no value; skipped"));
    }

    // Write to file or stdout.
    match output_path {
        Some(dest) => {
            // Safety: refuse to write into the vault directory.
            let config_dir = &store.config().config_dir;
            let absolute = if dest.is_absolute() {
                dest.to_path_buf()
            } else {
                std::env::current_dir()?.join(dest)
            };
            if absolute.starts_with(config_dir) {
                return Err(AkError::CommandFailed(format!(
                    "refusing to export into the vault directory {}",
                    config_dir.display()
                )));
            }

            secure_fs::atomic_write(&absolute, content.as_bytes())?;

            if cli.json {
                return output::json(&serde_json::json!({
                    "profile": profile,
                    "format": format.to_string(),
                    "path": absolute,
                    "count": names.len(),
                }));
            }
            output::success(&format!(
                "Exported {} secret(s) to {} (format: {format})",
                names.len(),
                absolute.display()
            ));
        }
        None => {
            // Raw output only, no success message.
            print!("{}", content.as_str());
        }
    }

    Ok(())
}

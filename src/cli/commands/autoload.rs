//! `ak autoload`: export every profile bound to a directory.
//!
//! Meant for a shell `cd` hook:
//!
//! ```sh
//! cd() { builtin cd "$@" && eval "$(ak autoload)"; }
//! ```

use std::path::Path;

use crate::cli::{current_dir, open_store, Cli};
use crate::errors::Result;

/// Execute the `autoload` command.
pub fn execute(_cli: &Cli, dir: Option<&Path>) -> Result<()> {
    let cwd = current_dir()?;
    let dir = match dir {
        Some(d) if d.is_absolute() => d.to_path_buf(),
        Some(d) => cwd.join(d),
        None => cwd,
    };

    let store = open_store()?;
    let profiles = store.read_dir_profiles(&dir)?;
    if profiles.is_empty() {
        return Ok(());
    }

    let mut exports = String::new();
    for profile in &profiles {
        exports.push_str(&store.make_exports(profile)?);
    }

    let refs: Vec<&str> = profiles.iter().map(String::as_str).collect();
    store.audit().record("autoload", &refs);
    tracing::debug!(dir = %dir.display(), profiles = profiles.len(), "autoload");

    print!("{exports}");
    Ok(())
}

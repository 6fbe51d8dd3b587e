//! CLI module: clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Config;
use crate::errors::{AkError, Result};
use crate::vault::VaultStore;

/// ak: local secret and API-key manager.
#[derive(Parser)]
#[command(
    name = "ak",
    about = "Local secret and API-key manager with encrypted profiles",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Print machine-readable JSON instead of tables and messages
    #[arg(long, global = true)]
    pub json: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Store a secret (NAME VALUE, NAME=VALUE, piped stdin, or a prompt)
    #[command(alias = "add")]
    Set {
        /// Secret name, or NAME=VALUE
        name: String,
        /// Secret value (omit for stdin or an interactive prompt)
        value: Option<String>,
        /// Also add the key to this profile
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Print a secret (masked unless --full)
    Get {
        /// Secret name
        name: String,
        /// Print the full value
        #[arg(long)]
        full: bool,
        /// Resolve through this profile (profile store, vault, environment)
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// List secrets with masked values
    #[command(alias = "list")]
    Ls {
        /// List the keys of this profile instead of the global vault
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Remove a secret, a key from a profile, or a whole profile
    Rm {
        /// Secret name (omit with --profile to delete the profile)
        name: Option<String>,
        /// Profile to remove from (or to delete)
        #[arg(short, long)]
        profile: Option<String>,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Find secret names containing a pattern (case-insensitive)
    Search {
        pattern: String,
    },

    /// Copy a secret to the clipboard
    Cp {
        name: String,
        /// Resolve through this profile
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Save a profile from vault keys (all keys if none are named)
    Save {
        profile: String,
        names: Vec<String>,
    },

    /// List profiles
    Profiles,

    /// Manage profiles (create, delete, show)
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Print export lines for a profile or a single key (use with eval)
    Load {
        /// Profile or key name
        name: String,
        /// Also bind it to the current directory
        #[arg(long)]
        persist: bool,
    },

    /// Print unset lines for profiles (all profiles if none are named)
    Unload {
        profiles: Vec<String>,
        /// Also remove them from the current directory's bindings
        #[arg(long)]
        persist: bool,
    },

    /// Print export lines for a profile (use with eval)
    Env {
        #[arg(short, long, default_value = "default")]
        profile: String,
    },

    /// Print export lines for every profile bound to a directory
    Autoload {
        /// Directory (defaults to the current directory)
        dir: Option<PathBuf>,
    },

    /// Import secrets from a file into a profile
    Import {
        /// Target profile
        #[arg(short, long, default_value = "default")]
        profile: String,
        /// File format: env, dotenv or json (detected from the extension if omitted)
        #[arg(short, long)]
        format: Option<String>,
        /// File to import
        #[arg(short = 'i', long)]
        file: PathBuf,
        /// Store empty values instead of skipping them
        #[arg(long)]
        keep_empty: bool,
    },

    /// Export a profile's resolved secrets
    Export {
        #[arg(short, long, default_value = "default")]
        profile: String,
        /// Output format: env (default), dotenv or json
        #[arg(short, long, default_value = "env")]
        format: String,
        /// Output file path (prints to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Migrate the legacy vault into profiles, or convert between backends
    Migrate {
        #[command(subcommand)]
        action: Option<MigrateAction>,
    },

    /// Show the active encryption backend
    Backend,

    /// Check the installation and report problems
    Doctor,

    /// View the audit log
    Audit {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "20")]
        last: usize,
        /// Show entries since a span ago (30m, 24h, 7d, 2w) or a date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,
    },

    /// Save the gpg passphrase to the OS keyring (auto-unlock)
    #[cfg(feature = "keyring-store")]
    Keyring {
        /// Remove the passphrase from the keyring instead of saving it
        #[arg(long)]
        delete: bool,
    },

    /// Generate shell completion scripts
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },

    /// Show version
    Version,
}

/// Profile subcommands.
#[derive(clap::Subcommand)]
pub enum ProfileAction {
    /// Create an empty profile
    Create { name: String },

    /// Delete a profile and its key store
    Delete {
        name: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Show a profile's keys and where each value resolves from
    Show { name: String },
}

/// Migrate subcommands.
#[derive(clap::Subcommand)]
pub enum MigrateAction {
    /// Copy the legacy global vault into the default profile (the default)
    Legacy,

    /// Re-encrypt every vault file with another backend
    Backend {
        /// Target backend
        #[arg(long, value_enum)]
        to: BackendKind,
    },
}

/// Backends selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BackendKind {
    Gpg,
    Plain,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Build the process configuration and a store over it.
pub fn open_store() -> Result<VaultStore> {
    let config = Config::from_env()?;
    Ok(VaultStore::new(config))
}

/// Absolute current directory, for directory bindings.
pub fn current_dir() -> Result<PathBuf> {
    Ok(std::env::current_dir()?)
}

/// Split `NAME=VALUE` when no separate value was given.
pub fn split_assignment(name: &str, value: Option<&str>) -> (String, Option<String>) {
    match (value, name.split_once('=')) {
        (None, Some((n, v))) if !n.is_empty() => (n.to_string(), Some(v.to_string())),
        _ => (name.to_string(), value.map(str::to_string)),
    }
}

/// Obtain a secret value from, in order: the command line, piped stdin,
/// or an interactive no-echo prompt.
pub fn read_secret_value(name: &str, inline: Option<String>) -> Result<Zeroizing<String>> {
    if let Some(v) = inline {
        // Source 1: Inline value on the command line.
        output::warning("Value provided on the command line; it may appear in shell history.");
        return Ok(Zeroizing::new(v));
    }

    if !io::stdin().is_terminal() {
        // Source 2: Piped input (stdin is not a terminal).
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        let trimmed = buf.trim_end_matches(|c: char| c == '\n' || c == '\r').to_string();
        return Ok(Zeroizing::new(trimmed));
    }

    // Source 3: Interactive secure prompt (default).
    let value = dialoguer::Password::new()
        .with_prompt(format!("Enter value for {name}"))
        .interact()
        .map_err(|e| AkError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(Zeroizing::new(value))
}

/// Ask for confirmation unless `force` is set. Non-interactive sessions
/// must pass `--force`.
pub fn confirm(prompt: &str, force: bool) -> Result<bool> {
    if force {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        return Err(AkError::CommandFailed(
            "confirmation required; re-run with --force".into(),
        ));
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|_| AkError::UserCancelled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn split_assignment_forms() {
        assert_eq!(
            split_assignment("API_KEY=abc=def", None),
            ("API_KEY".to_string(), Some("abc=def".to_string()))
        );
        assert_eq!(
            split_assignment("API_KEY", Some("v")),
            ("API_KEY".to_string(), Some("v".to_string()))
        );
        assert_eq!(split_assignment("API_KEY", None), ("API_KEY".to_string(), None));
        assert_eq!(split_assignment("=x", None), ("=x".to_string(), None));
    }

    #[test]
    fn parses_global_json_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["ak", "ls", "--json"]).unwrap();
        assert!(cli.json);
    }

    #[test]
    fn completions_shell_is_validated() {
        assert!(Cli::try_parse_from(["ak", "completions", "zsh"]).is_ok());
        assert!(Cli::try_parse_from(["ak", "completions", "csh"]).is_err());
    }

    #[test]
    fn migrate_backend_takes_target() {
        let cli = Cli::try_parse_from(["ak", "migrate", "backend", "--to", "plain"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Migrate {
                action: Some(MigrateAction::Backend { to: BackendKind::Plain })
            }
        ));
    }
}

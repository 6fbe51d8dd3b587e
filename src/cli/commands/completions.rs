//! `ak completions`: print a shell completion script.
//!
//! Usage:
//!   ak completions bash > ~/.local/share/bash-completion/completions/ak
//!   ak completions zsh > "${fpath[1]}/_ak"
//!   ak completions fish > ~/.config/fish/completions/ak.fish

use std::io;

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::Result;

/// Execute the `completions` command.
pub fn execute(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}

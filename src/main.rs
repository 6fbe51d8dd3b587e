use clap::Parser;
use tracing_subscriber::EnvFilter;

use akvault::cli::commands;
use akvault::cli::{output, Cli, Commands};

/// Environment variable holding the log filter (e.g. `AK_LOG=akvault=debug`).
const LOG_ENV: &str = "AK_LOG";

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Set {
            ref name,
            ref value,
            ref profile,
        } => commands::set::execute(&cli, name, value.as_deref(), profile.as_deref()),
        Commands::Get {
            ref name,
            full,
            ref profile,
        } => commands::get::execute(&cli, name, full, profile.as_deref()),
        Commands::Ls { ref profile } => commands::ls::execute(&cli, profile.as_deref()),
        Commands::Rm {
            ref name,
            ref profile,
            force,
        } => commands::rm::execute(&cli, name.as_deref(), profile.as_deref(), force),
        Commands::Search { ref pattern } => commands::search::execute(&cli, pattern),
        Commands::Cp {
            ref name,
            ref profile,
        } => commands::cp::execute(&cli, name, profile.as_deref()),
        Commands::Save {
            ref profile,
            ref names,
        } => commands::save::execute(&cli, profile, names),
        Commands::Profiles => commands::profiles::execute(&cli),
        Commands::Profile { ref action } => commands::profile::execute(&cli, action),
        Commands::Load { ref name, persist } => commands::load::execute(&cli, name, persist),
        Commands::Unload {
            ref profiles,
            persist,
        } => commands::unload::execute(&cli, profiles, persist),
        Commands::Env { ref profile } => commands::env::execute(&cli, profile),
        Commands::Autoload { ref dir } => commands::autoload::execute(&cli, dir.as_deref()),
        Commands::Import {
            ref profile,
            ref format,
            ref file,
            keep_empty,
        } => commands::import_cmd::execute(&cli, profile, format.as_deref(), file, keep_empty),
        Commands::Export {
            ref profile,
            ref format,
            ref output,
        } => commands::export::execute(&cli, profile, format, output.as_deref()),
        Commands::Migrate { ref action } => commands::migrate::execute(&cli, action.as_ref()),
        Commands::Backend => commands::backend::execute(&cli),
        Commands::Doctor => commands::doctor::execute(&cli),
        Commands::Audit { last, ref since } => {
            commands::audit_cmd::execute(&cli, last, since.as_deref())
        }
        #[cfg(feature = "keyring-store")]
        Commands::Keyring { delete } => commands::keyring_cmd::execute(&cli, delete),
        Commands::Completions { shell } => commands::completions::execute(shell),
        Commands::Version => commands::version::execute(),
    };

    if let Err(e) = result {
        if cli.json {
            output::json_error(&e);
        } else if e.is_not_found() {
            output::warning(&e.to_string());
        } else {
            output::error(&e.to_string());
        }
        std::process::exit(1);
    }
}

/// Log to stderr, filtered by `AK_LOG` (warnings only by default).
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("akvault=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

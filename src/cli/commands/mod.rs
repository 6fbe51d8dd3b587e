//! One module per subcommand, each exposing `execute`.

pub mod audit_cmd;
pub mod autoload;
pub mod backend;
pub mod completions;
pub mod cp;
pub mod doctor;
pub mod env;
pub mod export;
pub mod get;
pub mod import_cmd;
#[cfg(feature = "keyring-store")]
pub mod keyring_cmd;
pub mod load;
pub mod ls;
pub mod migrate;
pub mod profile;
pub mod profiles;
pub mod rm;
pub mod save;
pub mod search;
pub mod set;
pub mod unload;
pub mod version;

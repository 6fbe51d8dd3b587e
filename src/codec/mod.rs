//! Import/export codec.
//!
//! - `.env` and shell-rc parsing (`env_file`)
//! - flat JSON objects (`json`)
//! - `export`/`unset`/dotenv rendering (`shell`)

pub mod env_file;
pub mod json;
pub mod shell;

use std::fmt;
use std::str::FromStr;

pub use env_file::{dedup_last_wins, parse_env_file, parse_env_line};
pub use json::{parse_json_min, render_json};
pub use shell::{escape_shell_value, export_line, render_dotenv, render_exports, render_unsets};

use crate::errors::{AkError, Result};

/// File formats accepted by `ak import` and produced by `ak export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `export NAME="value"` lines (import also accepts plain `NAME=value`).
    Env,
    /// `NAME=value` lines.
    Dotenv,
    Json,
}

impl FromStr for Format {
    type Err = AkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "env" | "sh" | "shell" => Ok(Self::Env),
            "dotenv" | ".env" => Ok(Self::Dotenv),
            "json" => Ok(Self::Json),
            other => Err(AkError::ImportParse(format!(
                "unsupported format '{other}' (expected env, dotenv or json)"
            ))),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Env => "env",
            Self::Dotenv => "dotenv",
            Self::Json => "json",
        })
    }
}

/// Parse `text` in `format` into pairs, duplicates collapsed (last wins).
pub fn parse(format: Format, text: &str) -> Result<Vec<(String, String)>> {
    let pairs = match format {
        Format::Env | Format::Dotenv => parse_env_file(text.as_bytes())?,
        Format::Json => parse_json_min(text)?,
    };
    Ok(dedup_last_wins(pairs))
}

/// Render pairs in `format`.
pub fn render<'a>(format: Format, pairs: &[(&'a str, &'a str)]) -> Result<String> {
    match format {
        Format::Env => Ok(render_exports(pairs.iter().copied())),
        Format::Dotenv => Ok(render_dotenv(pairs.iter().copied())),
        Format::Json => render_json(pairs.iter().copied()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_str() {
        assert_eq!("env".parse::<Format>().unwrap(), Format::Env);
        assert_eq!("DOTENV".parse::<Format>().unwrap(), Format::Dotenv);
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
        assert!("yaml".parse::<Format>().is_err());
    }

    #[test]
    fn parse_applies_last_one_wins() {
        let pairs = parse(Format::Dotenv, "A=1\nA=2\n").unwrap();
        assert_eq!(pairs, vec![("A".to_string(), "2".to_string())]);
    }

    #[test]
    fn json_duplicate_keys_keep_last() {
        let pairs = parse(Format::Json, r#"{"A": "1", "A": "2"}"#).unwrap();
        assert_eq!(pairs, vec![("A".to_string(), "2".to_string())]);
    }
}

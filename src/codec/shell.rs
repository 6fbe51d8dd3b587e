//! Shell and dotenv rendering.
//!
//! Output of `ak env` / `ak load` is meant for `eval "$(ak ...)"`, so every
//! value is double-quoted with `\`, `"`, `$` and backtick escaped. Nothing
//! inside a value is ever expanded by the shell.

use std::fmt::Write;

/// Escape a value for use inside double quotes in a POSIX shell.
pub fn escape_shell_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '$' => out.push_str("\\$"),
            '`' => out.push_str("\\`"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

/// `export NAME="value"` (no trailing newline).
pub fn export_line(name: &str, value: &str) -> String {
    format!("export {name}=\"{}\"", escape_shell_value(value))
}

/// One `export` line per pair, each newline-terminated.
pub fn render_exports<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut out = String::new();
    for (name, value) in pairs {
        let _ = writeln!(out, "{}", export_line(name, value));
    }
    out
}

/// One `unset NAME` line per name.
pub fn render_unsets<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for name in names {
        let _ = writeln!(out, "unset {name}");
    }
    out
}

/// `NAME=value` lines, quoting only values that need it.
pub fn render_dotenv<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut out = String::new();
    for (name, value) in pairs {
        if needs_quoting(value) {
            let _ = writeln!(out, "{name}=\"{}\"", escape_shell_value(value));
        } else {
            let _ = writeln!(out, "{name}={value}");
        }
    }
    out
}

fn needs_quoting(value: &str) -> bool {
    value.is_empty()
        || value.trim() != value
        || value.chars().any(|c| {
            c.is_whitespace() || matches!(c, '"' | '\'' | '\\' | '$' | '`' | '#' | '=')
        })
}

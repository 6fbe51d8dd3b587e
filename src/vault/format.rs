//! Plaintext layout of vault and profile key-store files.
//!
//! One assignment per line, before encryption:
//!
//! ```text
//! NAME=value
//! ```
//!
//! Values are escaped so that every value fits on one line:
//! `\` → `\\`, `"` → `\"`, newline → `\n`, carriage return → `\r`.
//! Values are never wrapped in quotes here; the quoted `export NAME="..."`
//! form belongs to the shell renderer in `codec::shell`.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::errors::{AkError, Result};

/// Escape a value for a single `NAME=value` line.
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

/// Reverse [`escape_value`].
///
/// Also accepts `\$` and `` \` `` (emitted by the shell renderer) so quoted
/// export lines can be read back. Unknown escapes are kept verbatim.
pub fn unescape_value(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('$') => out.push('$'),
            Some('`') => out.push('`'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Serialize pairs as `NAME=value` lines, sorted by name.
pub fn serialize_kv(entries: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (name, value) in entries {
        let _ = writeln!(out, "{name}={}", escape_value(value));
    }
    out
}

/// Parse `NAME=value` lines.
///
/// Blank lines and `#` comments are skipped. A line without `=` or with an
/// empty name means the file is not a vault (or decrypted to garbage) and
/// is rejected rather than skipped. Later duplicates replace earlier ones.
pub fn parse_kv(text: &str) -> Result<BTreeMap<String, String>> {
    let mut entries = BTreeMap::new();

    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let (name, value) = line.split_once('=').ok_or_else(|| {
            AkError::InvalidVaultFormat(format!("line {}: expected NAME=value", idx + 1))
        })?;

        if name.is_empty() {
            return Err(AkError::InvalidVaultFormat(format!(
                "line {}: empty name",
                idx + 1
            )));
        }

        entries.insert(name.to_string(), unescape_value(value));
    }

    Ok(entries)
}

//! `.env` / shell-profile parsing for `ak import`.
//!
//! Accepts the lines people actually have in `.env` files and shell rc
//! files, and quietly skips everything that is not a plain assignment.

use std::collections::HashMap;
use std::io::BufRead;

use crate::errors::Result;
use crate::vault::format::unescape_value;
use crate::vault::validate_key_name;

/// Line prefixes of shell code that is not an assignment.
const SHELL_PREFIXES: &[&str] = &[
    "alias ", "function ", "if ", "case ", "for ", "while ", "until ",
];
/// Fragments that mark the name side of a line as shell code.
const SHELL_FRAGMENTS: &[&str] = &["[[", "$("];

/// Parse a single line into a (key, value) pair.
///
/// Returns `None` for blank lines, comments, shell constructs, lines
/// without `=` and invalid identifiers. Handles an `export ` prefix and one
/// layer of quotes: double-quoted values are unescaped, single-quoted values
/// are taken literally.
pub fn parse_env_line(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();

    // Skip empty lines and comments.
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    if SHELL_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
        return None;
    }

    // Strip optional `export ` prefix.
    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed).trim_start();

    let (key, value) = trimmed.split_once('=')?;
    if SHELL_FRAGMENTS.iter().any(|f| key.contains(f)) {
        return None;
    }
    let key = key.trim();
    if validate_key_name(key).is_err() {
        return None;
    }

    let value = value.trim();
    if runs_command(value) {
        return None;
    }
    Some((key.to_string(), unquote(value)))
}

/// True when the shell would run a command while assigning `value`:
/// an unescaped `$(` outside single quotes.
fn runs_command(value: &str) -> bool {
    if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        return false;
    }
    let mut escaped = false;
    let mut prev_dollar = false;
    for c in value.chars() {
        if escaped {
            escaped = false;
            prev_dollar = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '(' if prev_dollar => return true,
            _ => {}
        }
        prev_dollar = c == '$';
    }
    false
}

fn unquote(value: &str) -> String {
    if value.len() >= 2 {
        if let Some(inner) = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
            return unescape_value(inner);
        }
        if let Some(inner) = value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')) {
            return inner.to_string();
        }
    }
    value.to_string()
}

/// Parse every assignment in `reader`, in file order, duplicates kept.
pub fn parse_env_file(reader: impl BufRead) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    for line in reader.lines() {
        if let Some(pair) = parse_env_line(&line?) {
            pairs.push(pair);
        }
    }
    Ok(pairs)
}

/// Collapse duplicates: the last value wins, the first position is kept.
pub fn dedup_last_wins(pairs: Vec<(String, String)>) -> Vec<(String, String)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<(String, String)> = Vec::with_capacity(pairs.len());

    for (key, value) in pairs {
        match index.get(&key) {
            Some(&i) => out[i].1 = value,
            None => {
                index.insert(key.clone(), out.len());
                out.push((key, value));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(k: &str, v: &str) -> Option<(String, String)> {
        Some((k.to_string(), v.to_string()))
    }

    #[test]
    fn parse_simple_key_value() {
        assert_eq!(parse_env_line("KEY=value"), pair("KEY", "value"));
    }

    #[test]
    fn parse_export_prefix() {
        assert_eq!(
            parse_env_line("export DATABASE_URL=postgres://localhost/db"),
            pair("DATABASE_URL", "postgres://localhost/db")
        );
    }

    #[test]
    fn parse_value_with_equals() {
        assert_eq!(parse_env_line("KEY=val=ue"), pair("KEY", "val=ue"));
    }

    #[test]
    fn double_quotes_are_unescaped() {
        assert_eq!(
            parse_env_line(r#"KEY="say \"hi\"\nbye""#),
            pair("KEY", "say \"hi\"\nbye")
        );
    }

    #[test]
    fn single_quotes_are_literal() {
        assert_eq!(parse_env_line(r"KEY='a\nb'"), pair("KEY", r"a\nb"));
    }

    #[test]
    fn parse_empty_value() {
        assert_eq!(parse_env_line("KEY="), pair("KEY", ""));
        assert_eq!(parse_env_line(r#"KEY="""#), pair("KEY", ""));
    }

    #[test]
    fn lone_quote_is_kept() {
        assert_eq!(parse_env_line(r#"KEY=""#), pair("KEY", "\""));
    }

    #[test]
    fn skips_comments_blanks_and_junk() {
        for line in ["# comment", "", "   ", "NOEQUALS", "1BAD=x", "BAD-NAME=x", "=value"] {
            assert_eq!(parse_env_line(line), None, "{line:?}");
        }
    }

    #[test]
    fn skips_shell_constructs() {
        for line in [
            "alias ll='ls -la'",
            "function greet() {",
            "if [ -f ~/.bashrc ]; then",
            "case $x in",
            "for i in 1 2 3; do",
            "while true; do",
            "X=$(date)",
            "[[ -n $Y ]] && Z=1",
        ] {
            assert_eq!(parse_env_line(line), None, "{line:?}");
        }
    }

    #[test]
    fn escaped_substitution_in_values_is_data() {
        assert_eq!(parse_env_line(r#"export CMD="\$(whoami)""#), pair("CMD", "$(whoami)"));
        assert_eq!(parse_env_line(r#"TEST="[[ x ]]""#), pair("TEST", "[[ x ]]"));
        assert_eq!(parse_env_line("LIT='$(date)'"), pair("LIT", "$(date)"));
    }

    #[test]
    fn live_substitution_in_values_is_skipped() {
        assert_eq!(parse_env_line(r#"X="$(date)""#), None);
        assert_eq!(parse_env_line(r#"X="\\$(date)""#), None);
    }

    #[test]
    fn keywords_inside_names_are_not_constructs() {
        assert_eq!(parse_env_line("file_path=/tmp/x"), pair("file_path", "/tmp/x"));
        assert_eq!(parse_env_line("format=json"), pair("format", "json"));
    }

    #[test]
    fn trims_whitespace() {
        assert_eq!(parse_env_line("  KEY  =  value  "), pair("KEY", "value"));
    }

    #[test]
    fn file_keeps_order_and_duplicates() {
        let input = "A=1\n# c\nB=2\nexport A=3\n";
        let pairs = parse_env_file(input.as_bytes()).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "2".to_string()),
                ("A".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn last_one_wins() {
        let pairs = parse_env_file("A=1\nB=2\nA=3\n".as_bytes()).unwrap();
        let deduped = dedup_last_wins(pairs);
        assert_eq!(
            deduped,
            vec![
                ("A".to_string(), "3".to_string()),
                ("B".to_string(), "2".to_string()),
            ]
        );
    }
}

/// Mask a secret for display.
///
/// - empty → `(empty)`
/// - 12 characters or fewer → one `*` per character
/// - longer → first 8 characters, `***`, last 4 characters
pub fn mask_value(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();

    if chars.is_empty() {
        return "(empty)".to_string();
    }
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }

    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}***{tail}")
}

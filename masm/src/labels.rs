//! The symbol table built during pass 1 and consulted during pass 2.

use std::collections::BTreeMap;

/// Maps a label name to the 12-bit address it was bound to.
pub type LabelMap = BTreeMap<String, u16>;

/// `true` if `name` matches `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_label(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_letters_digits_and_underscore() {
        assert!(is_valid_label("LOOP_1"));
        assert!(is_valid_label("_x"));
    }

    #[test]
    fn rejects_leading_digit() {
        assert!(!is_valid_label("1LOOP"));
    }

    #[test]
    fn rejects_empty_and_punctuation() {
        assert!(!is_valid_label(""));
        assert!(!is_valid_label("A-B"));
    }
}

//! Per-line tokenizing.
//!
//! The assembly language is one statement per line: an optional `LABEL,`
//! prefix, whitespace-separated tokens, and an optional `/` comment running
//! to end of line. There is no nested grammar, so this is a hand-rolled
//! `split_whitespace` tokenizer rather than a grammar-file parser — see
//! `labels.rs` and `error.rs` for the rest of the pattern this follows.

/// One non-blank, comment-stripped source line, split into its label (if
/// any) and its statement's whitespace-separated tokens.
pub struct Tokenized<'a> {
    pub label: Option<&'a str>,
    pub tokens: Vec<&'a str>,
}

/// Strips a `/`-to-end-of-line comment and trailing/leading whitespace.
fn strip_comment(line: &str) -> &str {
    match line.find('/') {
        Some(idx) => line[..idx].trim(),
        None => line.trim(),
    }
}

/// Tokenizes one source line. Returns `None` for a blank or comment-only
/// line. A label is recognized by a comma before the first whitespace run;
/// the label text itself is returned unvalidated — `labels::is_valid_label`
/// checks its shape.
pub fn tokenize(line: &str) -> Option<Tokenized<'_>> {
    let stripped = strip_comment(line);
    if stripped.is_empty() {
        return None;
    }

    let (label, rest) = match stripped.find(',') {
        Some(idx) => (Some(stripped[..idx].trim()), stripped[idx + 1..].trim()),
        None => (None, stripped),
    };

    Some(Tokenized {
        label,
        tokens: rest.split_whitespace().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_label_and_tokens() {
        let t = tokenize("A, DEC 5").unwrap();
        assert_eq!(t.label, Some("A"));
        assert_eq!(t.tokens, vec!["DEC", "5"]);
    }

    #[test]
    fn strips_trailing_comment() {
        let t = tokenize("ORG 100 / start here").unwrap();
        assert_eq!(t.label, None);
        assert_eq!(t.tokens, vec!["ORG", "100"]);
    }

    #[test]
    fn blank_and_comment_only_lines_are_none() {
        assert!(tokenize("").is_none());
        assert!(tokenize("   ").is_none());
        assert!(tokenize("/ just a comment").is_none());
    }

    #[test]
    fn no_label_when_no_comma() {
        let t = tokenize("HLT").unwrap();
        assert_eq!(t.label, None);
        assert_eq!(t.tokens, vec!["HLT"]);
    }
}

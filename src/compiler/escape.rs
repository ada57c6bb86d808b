//! Native query syntax escaping
//!
//! Every field name and term that reaches the native query passes through
//! here. The wildcards `*` and `?` are left alone so that masked CQL terms
//! keep working.

/// Characters with a meaning in the native query syntax
const RESERVED: &[char] = &[
    '\\', '+', '-', '!', '(', ')', ':', '^', '[', ']', '"', '{', '}', '~', '|', '&', '/',
];

/// Words the native parser reads as boolean operators when they stand alone
const OPERATOR_WORDS: &[&str] = &["AND", "OR", "NOT"];

/// Backslash-escape reserved characters
///
/// A value that is exactly an operator word gets its first letter escaped,
/// which makes the native parser read it as a plain term.
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 1);
    if OPERATOR_WORDS.contains(&value) {
        escaped.push('\\');
    }
    for c in value.chars() {
        if RESERVED.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Escape a term, wrapping it in quotes when it contains whitespace
pub fn quote_if_whitespace(value: &str) -> String {
    if value.chars().any(char::is_whitespace) {
        format!("\"{}\"", escape(value))
    } else {
        escape(value)
    }
}

//! Declared field types
//!
//! A source document declares one of three types for each logical field.
//! The type decides which physical variants the expander produces.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Values longer than this many characters are inferred to be `text`
pub const TEXT_INFERENCE_THRESHOLD: usize = 64;

/// Declared type of a logical field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Short exact-matchable value
    ///
    /// Produces a presence flag plus exact, facet, sort and stemmed variants.
    Keyword,

    /// Free text
    ///
    /// Indexed with positions and offsets, plus a stemmed copy and an
    /// untokenized stored snapshot for highlighting.
    Text,

    /// Opaque payload that is stored but never searched
    Record,
}

impl FieldType {
    /// Parse a declared type name, case-insensitively
    ///
    /// Returns `None` for names the expander does not know.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "keyword" => Some(FieldType::Keyword),
            "text" => Some(FieldType::Text),
            "record" => Some(FieldType::Record),
            _ => None,
        }
    }

    /// Guess a type for a value that came without a declaration
    pub fn infer(value: &str) -> Self {
        if value.chars().count() > TEXT_INFERENCE_THRESHOLD {
            FieldType::Text
        } else {
            FieldType::Keyword
        }
    }

    /// Lowercase type name as used in source documents
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Keyword => "keyword",
            FieldType::Text => "text",
            FieldType::Record => "record",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(FieldType::parse("keyword"), Some(FieldType::Keyword));
        assert_eq!(FieldType::parse(" TEXT "), Some(FieldType::Text));
        assert_eq!(FieldType::parse("Record"), Some(FieldType::Record));
        assert_eq!(FieldType::parse("geo_point"), None);
        assert_eq!(FieldType::parse(""), None);
    }

    #[test]
    fn test_infer_threshold() {
        let short = "a".repeat(TEXT_INFERENCE_THRESHOLD);
        let long = "a".repeat(TEXT_INFERENCE_THRESHOLD + 1);
        assert_eq!(FieldType::infer(&short), FieldType::Keyword);
        assert_eq!(FieldType::infer(&long), FieldType::Text);
    }

    #[test]
    fn test_infer_counts_characters() {
        // 64 two-byte characters stay a keyword
        let accented = "é".repeat(TEXT_INFERENCE_THRESHOLD);
        assert_eq!(FieldType::infer(&accented), FieldType::Keyword);
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&FieldType::Keyword).unwrap();
        assert_eq!(json, "\"keyword\"");
        let parsed: FieldType = serde_json::from_str("\"record\"").unwrap();
        assert_eq!(parsed, FieldType::Record);
    }
}

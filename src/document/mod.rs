//! Index entries and document expansion
//!
//! A source record is turned into an [`IndexEntry`]: an ordered list of
//! physical fields ready for the index engine.

mod expander;

pub use expander::{normalize_sort_key, DocumentExpander, ExpansionStrategy, SourceField};

use serde::{Deserialize, Serialize};

/// Term vector detail kept for a field
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermVector {
    #[default]
    No,
    Yes,
    /// Positions and offsets, needed for highlighting
    WithPositionsOffsets,
}

impl TermVector {
    pub fn has_positions(&self) -> bool {
        matches!(self, TermVector::WithPositionsOffsets)
    }
}

/// One physical field of an index entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexField {
    pub name: String,
    pub value: String,
    pub stored: bool,
    pub indexed: bool,
    pub tokenized: bool,
    #[serde(default)]
    pub term_vector: TermVector,
}

impl IndexField {
    /// Indexed and tokenized, not stored
    pub fn tokenized(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            stored: false,
            indexed: true,
            tokenized: true,
            term_vector: TermVector::No,
        }
    }

    /// Indexed as a single term, not stored
    pub fn untokenized(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tokenized: false,
            ..Self::tokenized(name, value)
        }
    }

    /// Stored only, never searched
    pub fn stored_only(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            stored: true,
            indexed: false,
            tokenized: false,
            ..Self::tokenized(name, value)
        }
    }

    /// Mark the field as stored
    pub fn with_stored(mut self, stored: bool) -> Self {
        self.stored = stored;
        self
    }

    /// Set the term vector detail
    pub fn with_term_vector(mut self, term_vector: TermVector) -> Self {
        self.term_vector = term_vector;
        self
    }
}

/// Ordered multiset of physical fields for one source record
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    fields: Vec<IndexField>,
}

impl IndexEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: IndexField) {
        self.fields.push(field);
    }

    pub fn fields(&self) -> &[IndexField] {
        &self.fields
    }

    /// First value of a physical field
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// Every value of a physical field, in insertion order
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.name == name)
            .map(|f| f.value.as_str())
            .collect()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Extend<IndexField> for IndexEntry {
    fn extend<I: IntoIterator<Item = IndexField>>(&mut self, iter: I) {
        self.fields.extend(iter);
    }
}

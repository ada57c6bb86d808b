//! Field analyzers
//!
//! Turns the physical fields of an [`IndexEntry`](crate::document::IndexEntry)
//! into index terms. The analysis applied to a field follows from its
//! variant suffix: exact and facet copies are single keyword terms, stemmed
//! copies go through stopword removal and stemming, and configured date
//! fields are normalized to `yyyyMMdd`.

mod date;

pub use date::normalize_date;

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::config::TokenizerConfig;
use crate::document::{IndexEntry, IndexField};
use crate::schema::{FieldSchema, VariantKind};
use crate::tokenizer::{fold_accents, Token, Tokenizer};

/// How a field's value is broken into terms
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Analysis {
    /// Whole value is one term
    Keyword,
    /// Stopwords removed, words stemmed
    Stemmed,
    /// First line parsed as a date
    Date,
    /// Word tokenization with lowercasing and accent folding
    Standard,
}

/// One term occurrence produced for the index engine
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Posting {
    pub field: String,
    pub term: String,
    /// Word position, kept for positional term vectors
    pub position: Option<u32>,
    /// Byte offsets into the value, kept for positional term vectors
    pub offsets: Option<(usize, usize)>,
}

/// Suffix-aware analyzer
pub struct Analyzer {
    schema: Arc<FieldSchema>,
    standard: Tokenizer,
    stemming: Tokenizer,
    date_fields: HashSet<String>,
    case_insensitive: bool,
}

impl Analyzer {
    pub fn new(schema: Arc<FieldSchema>) -> Self {
        Self {
            schema,
            standard: Tokenizer::new(&TokenizerConfig::default()),
            stemming: Tokenizer::new(&TokenizerConfig::stemming()),
            date_fields: HashSet::new(),
            case_insensitive: false,
        }
    }

    /// Replace the tokenizer used for standard fields
    pub fn with_tokenizer_config(mut self, config: &TokenizerConfig) -> Self {
        self.standard = Tokenizer::new(config);
        self
    }

    /// Base fields whose values are dates
    pub fn with_date_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.date_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Lowercase and accent-fold keyword terms too
    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    /// Analysis applied to a physical field name
    pub fn analysis_for(&self, field: &str) -> Analysis {
        match self.schema.variant_kind(field) {
            Some(VariantKind::Exact) | Some(VariantKind::Facet) => Analysis::Keyword,
            Some(VariantKind::Stemmed) => Analysis::Stemmed,
            Some(_) => Analysis::Keyword,
            None if self.date_fields.contains(field) => Analysis::Date,
            None => Analysis::Standard,
        }
    }

    /// Terms for one value of a physical field
    pub fn analyze(&self, field: &str, value: &str) -> Vec<Token> {
        match self.analysis_for(field) {
            Analysis::Keyword => self.keyword(value),
            Analysis::Stemmed => self.stemming.tokenize_with_offsets(value),
            Analysis::Standard => self.standard.tokenize_with_offsets(value),
            Analysis::Date => match normalize_date(value) {
                Some(term) => vec![Token {
                    term,
                    position: 0,
                    start_offset: 0,
                    end_offset: value.len(),
                }],
                None => {
                    debug!(field = field, value = value, "Unparsable date, no terms produced");
                    Vec::new()
                }
            },
        }
    }

    /// Postings for every indexed field of an entry
    pub fn analyze_entry(&self, entry: &IndexEntry) -> Vec<Posting> {
        entry
            .fields()
            .iter()
            .filter(|field| field.indexed)
            .flat_map(|field| self.analyze_field(field))
            .collect()
    }

    fn analyze_field(&self, field: &IndexField) -> Vec<Posting> {
        let tokens = if field.tokenized {
            self.analyze(&field.name, &field.value)
        } else {
            self.keyword(&field.value)
        };
        let positional = field.term_vector.has_positions();

        tokens
            .into_iter()
            .map(|token| Posting {
                field: field.name.clone(),
                term: token.term,
                position: positional.then_some(token.position),
                offsets: positional.then_some((token.start_offset, token.end_offset)),
            })
            .collect()
    }

    fn keyword(&self, value: &str) -> Vec<Token> {
        let term = if self.case_insensitive {
            fold_accents(&value.to_lowercase())
        } else {
            value.to_string()
        };
        vec![Token {
            term,
            position: 0,
            start_offset: 0,
            end_offset: value.len(),
        }]
    }
}

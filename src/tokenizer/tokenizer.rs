use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use stop_words::{get, LANGUAGE};
use tracing::warn;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::TokenizerConfig;

/// A term with its position and byte offsets in the source text
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub term: String,
    /// Word position, counting filtered words
    pub position: u32,
    pub start_offset: usize,
    pub end_offset: usize,
}

/// Text tokenizer with stemming, stopword removal and accent folding
pub struct Tokenizer {
    config: TokenizerConfig,
    stemmer: Option<Stemmer>,
    stopwords: HashSet<String>,
}

impl Tokenizer {
    /// Create a new tokenizer from configuration
    pub fn new(config: &TokenizerConfig) -> Self {
        let (algorithm, stopword_language) = language_support(&config.language);

        let stemmer = if config.stem {
            Some(Stemmer::create(algorithm))
        } else {
            None
        };

        let stopwords = if config.remove_stopwords {
            get(stopword_language)
                .into_iter()
                .map(|s| s.to_lowercase())
                .collect()
        } else {
            HashSet::new()
        };

        Self {
            config: config.clone(),
            stemmer,
            stopwords,
        }
    }

    /// Tokenize text into a vector of terms
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.tokenize_with_offsets(text)
            .into_iter()
            .map(|token| token.term)
            .collect()
    }

    /// Tokenize text, keeping positions and offsets for term vectors
    ///
    /// Positions are 0-indexed and count every word, including the ones
    /// dropped as stopwords or for their length.
    pub fn tokenize_with_offsets(&self, text: &str) -> Vec<Token> {
        let mut results = Vec::new();

        for (pos, (start, word)) in text.unicode_word_indices().enumerate() {
            let token = self.normalize(word);

            let length = token.chars().count();
            if length < self.config.min_token_length || length > self.config.max_token_length {
                continue;
            }

            if self.stopwords.contains(&token) {
                continue;
            }

            let term = match &self.stemmer {
                Some(stemmer) => stemmer.stem(&token).to_string(),
                None => token,
            };

            results.push(Token {
                term,
                position: pos as u32,
                start_offset: start,
                end_offset: start + word.len(),
            });
        }

        results
    }

    /// Apply the case and accent settings to a single word or value
    pub fn normalize(&self, word: &str) -> String {
        let mut token = if self.config.lowercase {
            word.to_lowercase()
        } else {
            word.to_string()
        };
        if self.config.fold_accents {
            token = fold_accents(&token);
        }
        token
    }
}

/// Strip diacritics: decompose, then drop combining marks
pub fn fold_accents(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).nfc().collect()
}

fn language_support(language: &str) -> (Algorithm, LANGUAGE) {
    match language.to_ascii_lowercase().as_str() {
        "english" | "en" => (Algorithm::English, LANGUAGE::English),
        "french" | "fr" => (Algorithm::French, LANGUAGE::French),
        "german" | "de" => (Algorithm::German, LANGUAGE::German),
        "spanish" | "es" => (Algorithm::Spanish, LANGUAGE::Spanish),
        "italian" | "it" => (Algorithm::Italian, LANGUAGE::Italian),
        "portuguese" | "pt" => (Algorithm::Portuguese, LANGUAGE::Portuguese),
        "dutch" | "nl" => (Algorithm::Dutch, LANGUAGE::Dutch),
        "swedish" | "sv" => (Algorithm::Swedish, LANGUAGE::Swedish),
        "russian" | "ru" => (Algorithm::Russian, LANGUAGE::Russian),
        other => {
            warn!(language = other, "Unsupported tokenizer language, using English");
            (Algorithm::English, LANGUAGE::English)
        }
    }
}

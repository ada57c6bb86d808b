//! Word tokenization shared by the field analyzers

#[allow(clippy::module_inception)]
mod tokenizer;

pub use tokenizer::{fold_accents, Token, Tokenizer};

//! CQL search surface for a multi-representation field index
//!
//! - [`schema`]: logical field aliases and physical variant names
//! - [`document`]: fans source values out into physical fields
//! - [`compiler`]: compiles CQL trees into native boolean queries
//! - [`sru`]: pages through remote SRU result sets

pub mod analysis;
pub mod compiler;
pub mod config;
pub mod cql;
pub mod document;
pub mod error;
pub mod metrics;
pub mod schema;
pub mod sru;
pub mod tokenizer;

pub use analysis::{Analyzer, Posting};
pub use compiler::{compile, sort_fields, QueryCompiler, SortField, SortKey};
pub use config::{IteratorConfig, SchemaConfig, SuffixConfig, TokenizerConfig};
pub use cql::{CqlNode, CqlParser};
pub use document::{DocumentExpander, ExpansionStrategy, IndexEntry, IndexField};
pub use error::{Result, SearchError};
pub use metrics::SearchMetrics;
pub use schema::{FieldSchema, FieldType, VariantKind};
pub use sru::{HttpTransport, PageTransport, RecordSlot, SearchParams, SruResultIterator};
pub use tokenizer::Tokenizer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Field schema
//!
//! This module defines how logical fields map onto the index:
//! - Declared field types (keyword, text, record)
//! - Physical variant naming through a configurable suffix convention
//! - Alias resolution, from static configuration or a live field catalogue

mod field_schema;
mod field_type;

pub use field_schema::{FieldCatalog, FieldSchema, VariantKind};
pub use field_type::{FieldType, TEXT_INFERENCE_THRESHOLD};

//! CQL query text parsing
//!
//! Turns query text such as `dc.title any "moon cow" and dc.date cql.within
//! "1990 2000"` into a [`CqlNode`] tree for the compiler.

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{BooleanOp, CqlNode, Modifier, Relation, SERVER_CHOICE, SERVER_CHOICE_RELATION};
pub use parser::CqlParser;

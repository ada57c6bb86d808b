//! CQL abstract syntax tree
//!
//! A parsed query is a tree of boolean nodes over `qualifier relation term`
//! clauses. The tree is built once, compiled once and then dropped.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualifier given to a term that names no index
pub const SERVER_CHOICE: &str = "cql.serverChoice";

/// Relation given to a term that names no relation
pub const SERVER_CHOICE_RELATION: &str = "scr";

/// Boolean operator joining two subqueries
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BooleanOp {
    And,
    Or,
    Not,
    Prox,
    /// Operator the compiler has no translation for
    Other(String),
}

impl BooleanOp {
    /// Parse an operator name, case-insensitively
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "and" => BooleanOp::And,
            "or" => BooleanOp::Or,
            "not" => BooleanOp::Not,
            "prox" => BooleanOp::Prox,
            _ => BooleanOp::Other(name.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            BooleanOp::And => "and",
            BooleanOp::Or => "or",
            BooleanOp::Not => "not",
            BooleanOp::Prox => "prox",
            BooleanOp::Other(name) => name,
        }
    }
}

/// `/name`, `/name=value` or `/name<value` modifier
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    pub name: String,
    pub comparator: Option<String>,
    pub value: Option<String>,
}

impl Modifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comparator: None,
            value: None,
        }
    }

    pub fn with_value(mut self, comparator: impl Into<String>, value: impl Into<String>) -> Self {
        self.comparator = Some(comparator.into());
        self.value = Some(value.into());
        self
    }
}

/// Relation between an index and a term, with its modifiers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub base: String,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
}

impl Relation {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            modifiers: Vec::new(),
        }
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    /// Check for a modifier by name, case-insensitively
    pub fn has_modifier(&self, name: &str) -> bool {
        self.modifiers
            .iter()
            .any(|m| m.name.eq_ignore_ascii_case(name))
    }
}

/// Query tree node
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CqlNode {
    Boolean {
        op: BooleanOp,
        #[serde(default)]
        modifiers: Vec<Modifier>,
        left: Box<CqlNode>,
        right: Box<CqlNode>,
    },
    Term {
        qualifier: String,
        relation: Relation,
        term: String,
    },
}

impl CqlNode {
    /// A `qualifier relation term` clause without modifiers
    pub fn term(qualifier: impl Into<String>, relation: impl Into<String>, term: impl Into<String>) -> Self {
        CqlNode::Term {
            qualifier: qualifier.into(),
            relation: Relation::new(relation),
            term: term.into(),
        }
    }

    /// A bare term searched in the server's default indexes
    pub fn server_choice(term: impl Into<String>) -> Self {
        Self::term(SERVER_CHOICE, SERVER_CHOICE_RELATION, term)
    }

    pub fn boolean(op: BooleanOp, left: CqlNode, right: CqlNode) -> Self {
        CqlNode::Boolean {
            op,
            modifiers: Vec::new(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(left: CqlNode, right: CqlNode) -> Self {
        Self::boolean(BooleanOp::And, left, right)
    }

    pub fn or(left: CqlNode, right: CqlNode) -> Self {
        Self::boolean(BooleanOp::Or, left, right)
    }

    pub fn not(left: CqlNode, right: CqlNode) -> Self {
        Self::boolean(BooleanOp::Not, left, right)
    }

    /// Number of term clauses in the tree
    pub fn term_count(&self) -> usize {
        match self {
            CqlNode::Boolean { left, right, .. } => left.term_count() + right.term_count(),
            CqlNode::Term { .. } => 1,
        }
    }
}

fn write_modifiers(f: &mut fmt::Formatter<'_>, modifiers: &[Modifier]) -> fmt::Result {
    for modifier in modifiers {
        write!(f, "/{}", modifier.name)?;
        if let (Some(comparator), Some(value)) = (&modifier.comparator, &modifier.value) {
            write!(f, "{}{}", comparator, quote(value))?;
        }
    }
    Ok(())
}

/// Quote a term so the parser reads it back unchanged
fn quote(term: &str) -> String {
    let mut quoted = String::with_capacity(term.len() + 2);
    quoted.push('"');
    for ch in term.chars() {
        if ch == '"' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}

impl fmt::Display for CqlNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CqlNode::Boolean {
                op,
                modifiers,
                left,
                right,
            } => {
                write!(f, "({} {}", left, op.name())?;
                write_modifiers(f, modifiers)?;
                write!(f, " {})", right)
            }
            CqlNode::Term {
                qualifier,
                relation,
                term,
            } => {
                write!(f, "{} {}", qualifier, relation.base)?;
                write_modifiers(f, &relation.modifiers)?;
                write!(f, " {}", quote(term))
            }
        }
    }
}

//! CQL to native query compilation
//!
//! Walks a [`CqlNode`] tree and emits a boolean query string in the index
//! engine's Lucene-style syntax:
//!
//! ```text
//! title = moon            (title:moon)
//! title exact "moon cow"  (title.exact:"moon cow")
//! title any "moon cow"    ((title:moon OR title:cow))
//! date within "1990 2000" (date:[1990 TO 2000])
//! a and b                 ((a) AND (b))
//! ```
//!
//! Compilation never fails. Relations and booleans without a translation
//! become inert placeholder text so one bad clause cannot abort a query.

pub mod escape;
pub mod sort;

pub use sort::{render_sort_keys, sort_fields, MissingValue, SortField, SortKey};

use std::sync::Arc;
use tracing::debug;

use crate::cql::{BooleanOp, CqlNode, CqlParser, Relation};
use crate::error::Result;
use crate::metrics::SearchMetrics;
use crate::schema::{FieldSchema, VariantKind};
use escape::{escape, quote_if_whitespace};

/// Qualifier naming a prior result set; continuation is the transport's job
pub const RESULT_SET_ID_INDEX: &str = "cql.resultSetId";

/// Relation modifier that retargets a clause at the stemmed variant
pub const STEM_MODIFIER: &str = "stem";

/// Compile a query tree against a schema
pub fn compile(node: &CqlNode, schema: &FieldSchema) -> String {
    match node {
        CqlNode::Boolean {
            op, left, right, ..
        } => compile_boolean(op, left, right, schema),
        CqlNode::Term {
            qualifier,
            relation,
            term,
        } => compile_term(qualifier, relation, term, schema),
    }
}

fn compile_boolean(op: &BooleanOp, left: &CqlNode, right: &CqlNode, schema: &FieldSchema) -> String {
    let left = compile(left, schema);
    let right = compile(right, schema);

    if right.is_empty() {
        return left;
    }
    if left.is_empty() {
        // an exclusion with nothing to exclude from applies to every record
        if *op == BooleanOp::Not {
            return format!("(*:* NOT {})", right);
        }
        return right;
    }

    let joiner = match op {
        BooleanOp::And => " AND ".to_string(),
        BooleanOp::Or => " OR ".to_string(),
        BooleanOp::Not => " NOT ".to_string(),
        other => format!(" UnknownBoolean({}) ", other.name()),
    };
    format!("({}{}{})", left, joiner, right)
}

fn compile_term(qualifier: &str, relation: &Relation, term: &str, schema: &FieldSchema) -> String {
    if qualifier.eq_ignore_ascii_case(RESULT_SET_ID_INDEX) {
        return String::new();
    }

    let clauses: Vec<String> = schema
        .resolve_alias(qualifier)
        .iter()
        .map(|field| compile_relation(field, relation, term, schema))
        .filter(|clause| !clause.is_empty())
        .collect();

    if clauses.is_empty() {
        String::new()
    } else {
        format!("({})", clauses.join(" OR "))
    }
}

fn compile_relation(field: &str, relation: &Relation, term: &str, schema: &FieldSchema) -> String {
    let stemmed = relation.has_modifier(STEM_MODIFIER);
    let target = |field: &str| {
        if stemmed {
            schema.variant_name(field, VariantKind::Stemmed)
        } else {
            field.to_string()
        }
    };

    match relation.base.to_ascii_lowercase().as_str() {
        "=" | "scr" => {
            let value = quote_if_whitespace(term);
            if field.is_empty() {
                value
            } else {
                format!("{}:{}", escape(&target(field)), value)
            }
        }
        "exact" | "==" => format!(
            "{}:{}",
            escape(&schema.variant_name(field, VariantKind::Exact)),
            quote_if_whitespace(term)
        ),
        "any" => token_group(&target(field), term, " OR "),
        "all" => token_group(&target(field), term, " AND "),
        "within" | "cql.within" => {
            let bounds: Vec<&str> = term.split_whitespace().collect();
            match bounds.as_slice() {
                [lower, upper] => format!(
                    "{}:[{} TO {}]",
                    escape(field),
                    escape(lower),
                    escape(upper)
                ),
                _ => {
                    debug!(field = field, term = term, "Range term without exactly two bounds");
                    String::new()
                }
            }
        }
        _ => format!("Unsupported Relation: {}", relation.base),
    }
}

fn token_group(field: &str, term: &str, joiner: &str) -> String {
    let field = escape(field);
    let parts: Vec<String> = term
        .split_whitespace()
        .map(|token| format!("{}:{}", field, escape(token)))
        .collect();
    format!("({})", parts.join(joiner))
}

/// Query compiler bound to a schema
///
/// Stateless apart from its shared schema; one value can serve any number
/// of threads.
#[derive(Clone)]
pub struct QueryCompiler {
    schema: Arc<FieldSchema>,
    metrics: Option<Arc<SearchMetrics>>,
}

impl QueryCompiler {
    pub fn new(schema: Arc<FieldSchema>) -> Self {
        Self {
            schema,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<SearchMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Compile a parsed query
    pub fn compile(&self, node: &CqlNode) -> String {
        let native = compile(node, &self.schema);
        if let Some(metrics) = &self.metrics {
            metrics.record_compile();
        }
        debug!(query = %node, native = %native, "Compiled query");
        native
    }

    /// Parse CQL text and compile it
    pub fn compile_str(&self, text: &str) -> Result<String> {
        let node = CqlParser::parse(text)?;
        Ok(self.compile(&node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchemaConfig;
    use crate::cql::Modifier;

    fn schema() -> FieldSchema {
        FieldSchema::new(
            &SchemaConfig::new()
                .field("title")
                .field("subject")
                .synonym("dc.title", ["title", "alt.title"]),
        )
    }

    #[test]
    fn test_equals_relation() {
        let schema = schema();
        assert_eq!(compile(&CqlNode::term("title", "=", "moon"), &schema), "(title:moon)");
        assert_eq!(
            compile(&CqlNode::term("title", "scr", "moon cow"), &schema),
            "(title:\"moon cow\")"
        );
    }

    #[test]
    fn test_empty_qualifier_has_no_prefix() {
        assert_eq!(compile(&CqlNode::term("", "=", "moon"), &schema()), "(moon)");
    }

    #[test]
    fn test_exact_relation() {
        let schema = schema();
        assert_eq!(
            compile(&CqlNode::term("title", "exact", "Moon Cow"), &schema),
            "(title.exact:\"Moon Cow\")"
        );
        assert_eq!(
            compile(&CqlNode::term("title", "==", "x"), &schema),
            "(title.exact:x)"
        );
    }

    #[test]
    fn test_any_and_all() {
        let schema = schema();
        assert_eq!(
            compile(&CqlNode::term("title", "any", "moon cow"), &schema),
            "((title:moon OR title:cow))"
        );
        assert_eq!(
            compile(&CqlNode::term("title", "all", "moon cow"), &schema),
            "((title:moon AND title:cow))"
        );
        assert_eq!(compile(&CqlNode::term("title", "any", "   "), &schema), "(())");
    }

    #[test]
    fn test_within() {
        let schema = schema();
        assert_eq!(
            compile(&CqlNode::term("date", "cql.within", "1990 2000"), &schema),
            "(date:[1990 TO 2000])"
        );
        assert_eq!(compile(&CqlNode::term("date", "within", "1990"), &schema), "");
        assert_eq!(compile(&CqlNode::term("date", "within", "1 2 3"), &schema), "");
    }

    #[test]
    fn test_alias_fans_out_with_or() {
        assert_eq!(
            compile(&CqlNode::term("DC.TITLE", "=", "moon"), &schema()),
            "(title:moon OR alt.title:moon)"
        );
        assert_eq!(
            compile(&CqlNode::server_choice("moon"), &schema()),
            "(title:moon OR subject:moon)"
        );
    }

    #[test]
    fn test_booleans() {
        let schema = schema();
        let query = CqlNode::not(
            CqlNode::and(CqlNode::term("a", "=", "1"), CqlNode::term("b", "=", "2")),
            CqlNode::term("c", "=", "3"),
        );
        assert_eq!(compile(&query, &schema), "(((a:1) AND (b:2)) NOT (c:3))");

        let prox = CqlNode::boolean(BooleanOp::Prox, CqlNode::term("a", "=", "1"), CqlNode::term("b", "=", "2"));
        assert_eq!(compile(&prox, &schema), "((a:1) UnknownBoolean(prox) (b:2))");
    }

    #[test]
    fn test_unsupported_relation() {
        assert_eq!(
            compile(&CqlNode::term("title", "<", "m"), &schema()),
            "(Unsupported Relation: <)"
        );
    }

    #[test]
    fn test_result_set_qualifier_contributes_nothing() {
        let schema = schema();
        let query = CqlNode::and(
            CqlNode::term("cql.resultSetId", "=", "abc"),
            CqlNode::term("title", "=", "moon"),
        );
        assert_eq!(compile(&query, &schema), "(title:moon)");
        assert_eq!(compile(&CqlNode::term("CQL.RESULTSETID", "=", "abc"), &schema), "");
    }

    #[test]
    fn test_not_with_empty_left_side_keeps_exclusion() {
        let schema = schema();
        let excluded = CqlNode::term("title", "=", "moon");

        let after_result_set = CqlNode::not(CqlNode::term("cql.resultSetId", "=", "abc"), excluded.clone());
        assert_eq!(compile(&after_result_set, &schema), "(*:* NOT (title:moon))");

        let after_bad_range = CqlNode::not(CqlNode::term("date", "cql.within", "1990"), excluded);
        assert_eq!(compile(&after_bad_range, &schema), "(*:* NOT (title:moon))");
    }

    #[test]
    fn test_not_with_empty_right_side_keeps_left() {
        let query = CqlNode::not(
            CqlNode::term("title", "=", "moon"),
            CqlNode::term("cql.resultSetId", "=", "abc"),
        );
        assert_eq!(compile(&query, &schema()), "(title:moon)");
    }

    #[test]
    fn test_operator_words_in_token_groups() {
        assert_eq!(
            compile(&CqlNode::term("title", "any", "cats OR dogs"), &schema()),
            "((title:cats OR title:\\OR OR title:dogs))"
        );
    }

    #[test]
    fn test_stem_modifier() {
        let node = CqlNode::Term {
            qualifier: "title".to_string(),
            relation: Relation::new("any").with_modifier(Modifier::new("stem")),
            term: "running dogs".to_string(),
        };
        assert_eq!(
            compile(&node, &schema()),
            "((title.stemmed:running OR title.stemmed:dogs))"
        );
    }

    #[test]
    fn test_escaping() {
        assert_eq!(
            compile(&CqlNode::term("a:b", "=", "c(d)"), &schema()),
            "(a\\:b:c\\(d\\))"
        );
    }

    #[test]
    fn test_compile_str() {
        let compiler = QueryCompiler::new(Arc::new(schema()));
        assert_eq!(
            compiler.compile_str("title any \"moon cow\" and subject = dogs").unwrap(),
            "(((title:moon OR title:cow)) AND (subject:dogs))"
        );
        assert!(compiler.compile_str("title any").is_err());
    }
}

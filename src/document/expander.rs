//! Fan a logical field value out into its physical variants

use roxmltree::{Document, Node};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{IndexEntry, IndexField, TermVector};
use crate::error::{Result, SearchError};
use crate::metrics::SearchMetrics;
use crate::schema::{FieldSchema, FieldType, VariantKind};

/// How source documents describe their fields
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionStrategy {
    /// `<field name=".." type="..">value</field>` elements expanded into
    /// physical variants by declared type
    #[default]
    CqlStyle,
    /// `<IndexField IFname=".." store=".." index=".." termVector="..">`
    /// elements taken verbatim with their own indexing flags
    GSearchStyle,
}

/// A logical field as it appears in a source record
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceField {
    pub name: String,
    pub value: Option<String>,
    /// Declared type name; `None` or empty means infer from the value
    pub declared_type: Option<String>,
}

impl SourceField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            declared_type: None,
        }
    }

    pub fn with_type(mut self, declared_type: impl Into<String>) -> Self {
        self.declared_type = Some(declared_type.into());
        self
    }
}

/// Builds index entries from source records
#[derive(Clone)]
pub struct DocumentExpander {
    schema: Arc<FieldSchema>,
    strategy: ExpansionStrategy,
    metrics: Option<Arc<SearchMetrics>>,
}

impl DocumentExpander {
    pub fn new(schema: Arc<FieldSchema>) -> Self {
        Self {
            schema,
            strategy: ExpansionStrategy::default(),
            metrics: None,
        }
    }

    pub fn with_strategy(mut self, strategy: ExpansionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<SearchMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn strategy(&self) -> ExpansionStrategy {
        self.strategy
    }

    /// Physical fields for one logical value
    ///
    /// A missing or empty declared type is inferred from the value. An
    /// unrecognized type produces no fields and logs a warning.
    ///
    /// The keyword sort variant is always included here; use
    /// [`expand_into`](Self::expand_into) to keep only the first sort value
    /// of a repeatable field.
    pub fn expand(&self, name: &str, raw: Option<&str>, declared: Option<&str>) -> Vec<IndexField> {
        match self.resolve_type(name, raw, declared) {
            Some(field_type) => self.expand_typed(name, raw, field_type, true),
            None => Vec::new(),
        }
    }

    /// Expand one logical value onto an entry under construction
    ///
    /// The sort variant is only added if the entry has no sort value for
    /// this base field yet.
    pub fn expand_into(
        &self,
        entry: &mut IndexEntry,
        name: &str,
        raw: Option<&str>,
        declared: Option<&str>,
    ) {
        let field_type = match self.resolve_type(name, raw, declared) {
            Some(field_type) => field_type,
            None => return,
        };
        let sort_name = self.schema.variant_name(name, VariantKind::Sort);
        let include_sort = !entry.has_field(&sort_name);
        if !include_sort {
            debug!(field = name, "Sort value already set, keeping the first one");
        }
        entry.extend(self.expand_typed(name, raw, field_type, include_sort));
    }

    /// Expand every source field of a record into a fresh entry
    pub fn expand_all<'a, I>(&self, fields: I) -> IndexEntry
    where
        I: IntoIterator<Item = &'a SourceField>,
    {
        let mut entry = IndexEntry::new();
        for field in fields {
            self.expand_into(
                &mut entry,
                &field.name,
                field.value.as_deref(),
                field.declared_type.as_deref(),
            );
        }
        entry
    }

    /// Convert a source XML document using the configured strategy
    pub fn convert(&self, xml: &str) -> Result<IndexEntry> {
        let doc = Document::parse(xml)
            .map_err(|e| SearchError::Document(format!("Malformed source XML: {}", e)))?;
        let root = doc.root_element();

        let entry = match self.strategy {
            ExpansionStrategy::CqlStyle => self.convert_cql_style(xml, root),
            ExpansionStrategy::GSearchStyle => convert_gsearch_style(root),
        };
        debug!(
            strategy = ?self.strategy,
            fields = entry.len(),
            "Converted source document"
        );
        Ok(entry)
    }

    fn convert_cql_style(&self, xml: &str, root: Node) -> IndexEntry {
        let mut sources = Vec::new();
        for node in root
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "field")
        {
            let name = match node.attribute("name") {
                Some(name) if !name.trim().is_empty() => name.trim(),
                _ => {
                    warn!("Source field without a name, skipping it");
                    continue;
                }
            };
            let declared = node.attribute("type").map(str::to_string);
            let is_record = declared
                .as_deref()
                .and_then(FieldType::parse)
                .map(|t| t == FieldType::Record)
                .unwrap_or(false);
            let value = if is_record {
                inner_xml(xml, node)
            } else {
                text_content(node).trim().to_string()
            };
            sources.push(SourceField {
                name: name.to_string(),
                value: Some(value),
                declared_type: declared,
            });
        }
        self.expand_all(&sources)
    }

    fn resolve_type(&self, name: &str, raw: Option<&str>, declared: Option<&str>) -> Option<FieldType> {
        match declared.map(str::trim).filter(|d| !d.is_empty()) {
            None => Some(FieldType::infer(raw.unwrap_or(""))),
            Some(declared) => {
                let parsed = FieldType::parse(declared);
                if parsed.is_none() {
                    warn!(
                        field = name,
                        declared_type = declared,
                        "Unrecognized field type, skipping field"
                    );
                    if let Some(metrics) = &self.metrics {
                        metrics.record_skipped();
                    }
                }
                parsed
            }
        }
    }

    fn expand_typed(
        &self,
        name: &str,
        raw: Option<&str>,
        field_type: FieldType,
        include_sort: bool,
    ) -> Vec<IndexField> {
        let schema = &self.schema;
        let value = raw.unwrap_or("");
        let mut fields = Vec::new();

        match field_type {
            FieldType::Record => {
                fields.push(IndexField::stored_only(name, value));
            }
            FieldType::Keyword => {
                let present = schema.variant_name(name, VariantKind::Present);
                if value.trim().is_empty() {
                    fields.push(IndexField::untokenized(present, "0"));
                } else {
                    fields.push(IndexField::untokenized(present, "1"));
                    fields.push(IndexField::tokenized(name, value));
                    if include_sort {
                        fields.push(IndexField::untokenized(
                            schema.variant_name(name, VariantKind::Sort),
                            normalize_sort_key(value),
                        ));
                    }
                    fields.push(
                        IndexField::untokenized(schema.variant_name(name, VariantKind::Facet), value)
                            .with_stored(true),
                    );
                    fields.push(
                        IndexField::untokenized(schema.variant_name(name, VariantKind::Exact), value)
                            .with_stored(true),
                    );
                    fields.push(
                        IndexField::tokenized(schema.variant_name(name, VariantKind::Stemmed), value)
                            .with_stored(true),
                    );
                }
            }
            FieldType::Text => {
                fields.push(
                    IndexField::tokenized(name, value)
                        .with_term_vector(TermVector::WithPositionsOffsets),
                );
                fields.push(
                    IndexField::tokenized(schema.variant_name(name, VariantKind::Stemmed), value)
                        .with_stored(true),
                );
                fields.push(IndexField::stored_only(
                    schema.variant_name(name, VariantKind::Stored),
                    value,
                ));
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_fields(field_type.as_str(), fields.len());
        }
        fields
    }
}

/// Sort comparison key: lowercase, letters and digits only
pub fn normalize_sort_key(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

fn convert_gsearch_style(root: Node) -> IndexEntry {
    let mut entry = IndexEntry::new();
    for node in root
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "IndexField")
    {
        let name = match node.attribute("IFname") {
            Some(name) if !name.is_empty() => name,
            _ => {
                warn!("IndexField without IFname, skipping it");
                continue;
            }
        };
        let value = text_content(node);
        if value.trim().is_empty() {
            info!(field = name, "Empty IndexField, skipping it");
            continue;
        }

        let stored = node
            .attribute("store")
            .map(|s| s.eq_ignore_ascii_case("yes") || s.eq_ignore_ascii_case("compress"))
            .unwrap_or(false);
        let (indexed, tokenized) = match node.attribute("index").map(str::to_ascii_uppercase) {
            Some(index) => match index.as_str() {
                "UN_TOKENIZED" | "NO_NORMS" => (true, false),
                "NO" => (false, false),
                _ => (true, true),
            },
            None => (true, true),
        };
        let term_vector = match node.attribute("termVector").map(str::to_ascii_uppercase) {
            Some(tv) if tv == "YES" => TermVector::Yes,
            Some(tv) if tv == "WITH_POSITIONS_OFFSETS" => TermVector::WithPositionsOffsets,
            _ => TermVector::No,
        };

        entry.add(IndexField {
            name: name.to_string(),
            value,
            stored,
            indexed,
            tokenized,
            term_vector,
        });
    }
    entry
}

fn text_content(node: Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

/// Raw markup between an element's start and end tags
fn inner_xml(xml: &str, node: Node) -> String {
    match (node.first_child(), node.last_child()) {
        (Some(first), Some(last)) => xml[first.range().start..last.range().end].trim().to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SchemaConfig, SuffixConfig};

    fn expander() -> DocumentExpander {
        DocumentExpander::new(Arc::new(FieldSchema::default()))
    }

    #[test]
    fn test_keyword_expansion_order() {
        let fields = expander().expand("subject", Some("Paris"), Some("keyword"));
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "subject.present",
                "subject",
                "subject.sort",
                "subject.facet",
                "subject.exact",
                "subject.stemmed"
            ]
        );
        assert_eq!(fields[0].value, "1");
        assert_eq!(fields[2].value, "paris");
        assert!(fields[1].tokenized && !fields[1].stored);
        assert!(!fields[3].tokenized && fields[3].stored);
        assert!(fields[5].tokenized && fields[5].stored);
    }

    #[test]
    fn test_blank_keyword_only_sets_presence() {
        for raw in [Some(""), Some("   "), None] {
            let fields = expander().expand("subject", raw, Some("keyword"));
            assert_eq!(fields.len(), 1);
            assert_eq!(fields[0].name, "subject.present");
            assert_eq!(fields[0].value, "0");
        }
    }

    #[test]
    fn test_text_expansion() {
        let fields = expander().expand("abstract", Some("The cow jumped"), Some("text"));
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].term_vector, TermVector::WithPositionsOffsets);
        assert_eq!(fields[1].name, "abstract.stemmed");
        assert!(fields[1].stored && fields[1].tokenized);
        assert_eq!(fields[2].name, "abstract.stored");
        assert!(fields[2].stored && !fields[2].tokenized);
    }

    #[test]
    fn test_record_expansion() {
        let fields = expander().expand("mods", Some("<mods/>"), Some("record"));
        assert_eq!(fields, vec![IndexField::stored_only("mods", "<mods/>")]);
    }

    #[test]
    fn test_type_inference() {
        let short = expander().expand("x", Some("short"), None);
        assert_eq!(short.len(), 6);
        let long_value = "word ".repeat(20);
        let long = expander().expand("x", Some(&long_value), Some(""));
        assert_eq!(long.len(), 3);
    }

    #[test]
    fn test_unknown_type_is_skipped() {
        let metrics = Arc::new(SearchMetrics::new().unwrap());
        let expander = expander().with_metrics(metrics.clone());
        assert!(expander.expand("x", Some("value"), Some("geo")).is_empty());
        assert_eq!(metrics.fields_skipped.get(), 1.0);
    }

    #[test]
    fn test_sort_first_value_wins() {
        let expander = expander();
        let mut entry = IndexEntry::new();
        expander.expand_into(&mut entry, "subject", Some("Dogs"), Some("keyword"));
        expander.expand_into(&mut entry, "subject", Some("Cats"), Some("keyword"));
        assert_eq!(entry.get_all("subject.sort"), vec!["dogs"]);
        assert_eq!(entry.get_all("subject.exact"), vec!["Dogs", "Cats"]);
    }

    #[test]
    fn test_normalize_sort_key() {
        assert_eq!(normalize_sort_key("The Cat's Hat, 2nd ed."), "thecatshat2nded");
        assert_eq!(normalize_sort_key("Ärger_über"), "ärgerüber");
    }

    #[test]
    fn test_unconfigured_suffixes_collapse() {
        let schema = FieldSchema::new(&SchemaConfig::new().with_suffixes(SuffixConfig::none()));
        let expander = DocumentExpander::new(Arc::new(schema));
        let fields = expander.expand("subject", Some("Paris"), Some("keyword"));
        assert!(fields.iter().all(|f| f.name == "subject"));
    }

    #[test]
    fn test_convert_cql_style() {
        let xml = r#"<doc>
            <field name="dc.title" type="keyword">Moon Cow</field>
            <field name="dc.title" type="keyword">Another Title</field>
            <field name="mods" type="record"><mods><title>Moon</title></mods></field>
            <field name="dc.format" type="geo">skipped</field>
        </doc>"#;
        let entry = expander().convert(xml).unwrap();
        assert_eq!(entry.get("dc.title.sort"), Some("mooncow"));
        assert_eq!(entry.get_all("dc.title.sort").len(), 1);
        assert_eq!(entry.get("mods"), Some("<mods><title>Moon</title></mods>"));
        assert!(!entry.has_field("dc.format"));
    }

    #[test]
    fn test_convert_gsearch_style() {
        let xml = r#"<IndexDocument PID="demo:1">
            <IndexField IFname="dc.title" index="TOKENIZED" store="YES" termVector="YES">Moon</IndexField>
            <IndexField IFname="PID" index="UN_TOKENIZED" store="compress">demo:1</IndexField>
            <IndexField IFname="hidden" index="NO" store="yes">x</IndexField>
            <IndexField IFname="empty" index="TOKENIZED">  </IndexField>
        </IndexDocument>"#;
        let entry = expander()
            .with_strategy(ExpansionStrategy::GSearchStyle)
            .convert(xml)
            .unwrap();
        assert_eq!(entry.len(), 3);
        let fields = entry.fields();
        assert!(fields[0].tokenized && fields[0].stored);
        assert_eq!(fields[0].term_vector, TermVector::Yes);
        assert!(fields[1].indexed && !fields[1].tokenized && fields[1].stored);
        assert!(!fields[2].indexed);
    }

    #[test]
    fn test_convert_malformed_xml() {
        assert!(matches!(
            expander().convert("<doc><field>"),
            Err(SearchError::Document(_))
        ));
    }
}

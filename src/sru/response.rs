//! searchRetrieveResponse parsing

use roxmltree::{Document, Node};
use serde::Serialize;

use crate::error::{Result, SearchError};

/// SRW response namespace
pub const SRW_NS: &str = "http://www.loc.gov/zing/srw/";

/// SRW diagnostic namespace
pub const DIAGNOSTIC_NS: &str = "http://www.loc.gov/zing/srw/diagnostic/";

/// Diagnostic reported when a result set identifier is no longer valid
pub const DIAGNOSTIC_RESULT_SET_DOES_NOT_EXIST: &str = "info:srw/diagnostic/1/51";

/// Server-reported diagnostic
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub uri: String,
    pub details: Option<String>,
    pub message: Option<String>,
}

impl Diagnostic {
    pub fn is_result_set_expired(&self) -> bool {
        self.uri.trim() == DIAGNOSTIC_RESULT_SET_DOES_NOT_EXIST
    }
}

/// Hit count for one facet value
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FacetValue {
    pub value: String,
    pub hits: u64,
}

/// Facet counts for one field
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FacetField {
    pub name: String,
    pub values: Vec<FacetValue>,
}

/// One parsed page of results
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SearchPage {
    /// Total hits for the whole result set
    pub total: u64,
    pub result_set_id: Option<String>,
    /// Record payloads as raw XML, `None` where the payload is absent
    pub records: Vec<Option<String>>,
    pub diagnostics: Vec<Diagnostic>,
    pub facets: Vec<FacetField>,
}

impl SearchPage {
    /// Parse a searchRetrieveResponse document
    pub fn parse(xml: &str) -> Result<Self> {
        let doc = Document::parse(xml)
            .map_err(|e| SearchError::ResponseParse(format!("Invalid XML: {}", e)))?;
        let root = doc.root_element();
        if !is_srw(root, "searchRetrieveResponse") {
            return Err(SearchError::ResponseParse(format!(
                "Unexpected root element <{}>",
                root.tag_name().name()
            )));
        }

        let diagnostics = parse_diagnostics(root);
        if let Some(expired) = diagnostics.iter().find(|d| d.is_result_set_expired()) {
            return Err(SearchError::ResultSetExpired {
                diagnostic: expired.uri.clone(),
            });
        }

        let total = match srw_child_text(root, "numberOfRecords") {
            Some(text) => text.trim().parse::<u64>().map_err(|_| {
                SearchError::ResponseParse(format!("Invalid numberOfRecords '{}'", text.trim()))
            })?,
            None => {
                let reason = diagnostics
                    .first()
                    .map(|d| format!(" (diagnostic {})", d.uri))
                    .unwrap_or_default();
                return Err(SearchError::ResponseParse(format!(
                    "Response has no numberOfRecords{}",
                    reason
                )));
            }
        };

        let result_set_id = srw_child_text(root, "resultSetId")
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        let records = root
            .children()
            .filter(|n| is_srw(*n, "records"))
            .flat_map(|records| records.children().filter(|n| is_srw(*n, "record")))
            .map(|record| record_payload(xml, record))
            .collect();

        let facets = root
            .children()
            .filter(|n| is_srw(*n, "extraResponseData"))
            .flat_map(|extra| extra.descendants())
            .filter(|n| n.is_element() && n.tag_name().name().ends_with("facetInformation"))
            .flat_map(|info| info.children().filter(|n| is_named(*n, "field")))
            .map(parse_facet_field)
            .collect();

        Ok(Self {
            total,
            result_set_id,
            records,
            diagnostics,
            facets,
        })
    }
}

/// First diagnostic URI in a response body, even one that failed to parse
/// as a page
pub fn first_diagnostic(xml: &str) -> Option<String> {
    let doc = Document::parse(xml).ok()?;
    parse_diagnostics(doc.root_element())
        .into_iter()
        .next()
        .map(|d| d.uri)
}

fn parse_diagnostics(root: Node) -> Vec<Diagnostic> {
    root.children()
        .filter(|n| is_srw(*n, "diagnostics"))
        .flat_map(|diags| diags.children().filter(|n| is_named(*n, "diagnostic")))
        .filter_map(|diag| {
            let uri = child_text(diag, "uri")?;
            Some(Diagnostic {
                uri: uri.trim().to_string(),
                details: child_text(diag, "details"),
                message: child_text(diag, "message"),
            })
        })
        .collect()
}

fn parse_facet_field(field: Node) -> FacetField {
    let values = field
        .children()
        .filter(|n| is_named(*n, "value"))
        .map(|value| FacetValue {
            value: value.text().unwrap_or("").trim().to_string(),
            hits: value
                .attribute("hits")
                .and_then(|h| h.trim().parse().ok())
                .unwrap_or(0),
        })
        .collect();
    FacetField {
        name: field.attribute("name").unwrap_or("").to_string(),
        values,
    }
}

/// Raw XML of the first element inside `recordData`, or its text
fn record_payload(xml: &str, record: Node) -> Option<String> {
    let data = record.children().find(|n| is_srw(*n, "recordData"))?;
    if let Some(element) = data.children().find(|n| n.is_element()) {
        return Some(xml[element.range()].to_string());
    }
    let text: String = data
        .children()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Element with this local name in the SRW namespace, or in none
fn is_srw(node: Node, name: &str) -> bool {
    is_named(node, name) && matches!(node.tag_name().namespace(), None | Some(SRW_NS))
}

fn is_named(node: Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

fn srw_child_text(node: Node, name: &str) -> Option<String> {
    node.children()
        .find(|n| is_srw(*n, name))
        .map(|n| n.text().unwrap_or("").to_string())
}

fn child_text(node: Node, name: &str) -> Option<String> {
    node.children()
        .find(|n| is_named(*n, name))
        .map(|n| n.text().unwrap_or("").trim().to_string())
}

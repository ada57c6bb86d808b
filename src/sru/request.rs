//! searchRetrieve request construction

use super::cursor::Cursor;
use crate::config::IteratorConfig;

/// Everything about a search that stays fixed while paging
#[derive(Clone, Debug)]
pub struct SearchParams {
    pub base_url: String,
    /// Original CQL query text
    pub query: String,
    /// Requested record schema identifier
    pub record_schema: Option<String>,
    /// Rendered `sortKeys` value
    pub sort_keys: Option<String>,
    pub config: IteratorConfig,
}

impl SearchParams {
    pub fn new(base_url: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            query: query.into(),
            record_schema: None,
            sort_keys: None,
            config: IteratorConfig::default(),
        }
    }

    pub fn with_record_schema(mut self, record_schema: impl Into<String>) -> Self {
        self.record_schema = Some(record_schema.into());
        self
    }

    pub fn with_sort_keys(mut self, sort_keys: impl Into<String>) -> Self {
        let sort_keys = sort_keys.into();
        self.sort_keys = if sort_keys.trim().is_empty() {
            None
        } else {
            Some(sort_keys)
        };
        self
    }

    pub fn with_config(mut self, config: IteratorConfig) -> Self {
        self.config = config;
        self
    }
}

/// Query that continues a server-side result set
pub fn continuation_query(result_set_id: &str) -> String {
    format!(
        "cql.resultSetId=\"{}\"",
        result_set_id.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

/// Build the URL for one page request
///
/// With `use_result_set` and a known result set identifier the request
/// continues that result set; otherwise the original query is resubmitted
/// with an explicit start offset.
pub fn request_url(params: &SearchParams, cursor: &Cursor, use_result_set: bool) -> String {
    let query = match (&cursor.result_set_id, use_result_set) {
        (Some(id), true) => continuation_query(id),
        _ => params.query.clone(),
    };

    let mut pairs = vec![
        format!("query={}", urlencoding::encode(&query)),
        format!("version={}", urlencoding::encode(&params.config.version)),
        "operation=searchRetrieve".to_string(),
        format!("maximumRecords={}", cursor.page_size),
        format!("startRecord={}", cursor.start_record()),
    ];
    if let Some(schema) = &params.record_schema {
        pairs.push(format!("recordSchema={}", urlencoding::encode(schema)));
    }
    pairs.push(format!(
        "recordPacking={}",
        urlencoding::encode(&params.config.record_packing)
    ));
    if let Some(ttl) = params.config.result_set_ttl {
        pairs.push(format!("resultSetTTL={}", ttl));
    }
    if let Some(sort_keys) = &params.sort_keys {
        pairs.push(format!("sortKeys={}", urlencoding::encode(sort_keys)));
    }

    let separator = if params.base_url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", params.base_url, separator, pairs.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SearchParams {
        SearchParams::new("http://example.org/sru", "dc.title any \"moon cow\"")
    }

    #[test]
    fn test_first_page_url() {
        let url = request_url(&params(), &Cursor::start(25), true);
        assert_eq!(
            url,
            "http://example.org/sru?query=dc.title%20any%20%22moon%20cow%22&version=1.1\
             &operation=searchRetrieve&maximumRecords=25&startRecord=1&recordPacking=xml\
             &resultSetTTL=15"
        );
    }

    #[test]
    fn test_continuation_url() {
        let cursor = Cursor::start(25)
            .with_result_set(Some("abc".to_string()))
            .at(25);
        let url = request_url(&params(), &cursor, true);
        assert!(url.contains("query=cql.resultSetId%3D%22abc%22"));
        assert!(url.contains("startRecord=26"));

        // the retry resubmits the original query at the same offset
        let retry = request_url(&params(), &cursor, false);
        assert!(retry.contains("query=dc.title%20any"));
        assert!(retry.contains("startRecord=26"));
    }

    #[test]
    fn test_optional_parameters() {
        let params = SearchParams::new("http://example.org/sru?x-pretty=1", "moon")
            .with_record_schema("info:srw/schema/1/dc-v1.1")
            .with_sort_keys("title.sort,,0 date.sort")
            .with_config(IteratorConfig::default().with_result_set_ttl(None));
        let url = request_url(&params, &Cursor::start(10), false);
        assert!(url.starts_with("http://example.org/sru?x-pretty=1&query=moon"));
        assert!(url.contains("recordSchema=info%3Asrw%2Fschema%2F1%2Fdc-v1.1"));
        assert!(url.contains("sortKeys=title.sort%2C%2C0%20date.sort"));
        assert!(!url.contains("resultSetTTL"));
        assert!(url.contains("maximumRecords=10"));
    }

    #[test]
    fn test_blank_sort_keys_are_dropped() {
        let params = params().with_sort_keys("  ");
        assert!(params.sort_keys.is_none());
    }
}

//! SRU sort keys
//!
//! A sort key list looks like `dc.title,,1 dc.date,,0,0,lowValue`: space
//! separated keys, each `path[,schema[,ascending[,caseSensitive[,missingValue]]]]`.
//! Keys name logical fields and are resolved through the schema to the
//! physical sort and presence variants.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SearchError};
use crate::schema::{FieldSchema, VariantKind};

/// Where records without a value for the key end up
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingValue {
    /// Sort after every present value
    #[default]
    HighValue,
    /// Sort before every present value
    LowValue,
    Omit,
    Abort,
    /// Sort as if the record had this value
    Value(String),
}

impl MissingValue {
    fn parse(text: &str) -> Self {
        match text {
            "highValue" => MissingValue::HighValue,
            "lowValue" => MissingValue::LowValue,
            "omit" => MissingValue::Omit,
            "abort" => MissingValue::Abort,
            other => MissingValue::Value(other.to_string()),
        }
    }

    fn as_str(&self) -> &str {
        match self {
            MissingValue::HighValue => "highValue",
            MissingValue::LowValue => "lowValue",
            MissingValue::Omit => "omit",
            MissingValue::Abort => "abort",
            MissingValue::Value(value) => value,
        }
    }
}

/// One SRU sort key
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub path: String,
    pub schema: Option<String>,
    pub ascending: bool,
    pub case_sensitive: bool,
    pub missing_value: MissingValue,
}

impl SortKey {
    /// Ascending, case-insensitive key with missing values last
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            schema: None,
            ascending: true,
            case_sensitive: false,
            missing_value: MissingValue::HighValue,
        }
    }

    pub fn descending(mut self) -> Self {
        self.ascending = false;
        self
    }

    pub fn with_missing_value(mut self, missing_value: MissingValue) -> Self {
        self.missing_value = missing_value;
        self
    }

    /// Parse one `path[,schema[,ascending[,caseSensitive[,missingValue]]]]` key
    pub fn parse(text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.split(',').collect();
        if parts.len() > 5 {
            return Err(SearchError::QueryParse(format!(
                "Sort key has too many components: {}",
                text
            )));
        }

        let path = parts[0].trim();
        if path.is_empty() {
            return Err(SearchError::QueryParse(format!(
                "Sort key without a path: {}",
                text
            )));
        }

        let mut key = SortKey::new(path);
        if let Some(schema) = parts.get(1).filter(|s| !s.is_empty()) {
            key.schema = Some(schema.to_string());
        }
        if let Some(flag) = parts.get(2).filter(|s| !s.is_empty()) {
            key.ascending = parse_flag(flag, "ascending")?;
        }
        if let Some(flag) = parts.get(3).filter(|s| !s.is_empty()) {
            key.case_sensitive = parse_flag(flag, "caseSensitive")?;
        }
        if let Some(missing) = parts.get(4).filter(|s| !s.is_empty()) {
            key.missing_value = MissingValue::parse(missing);
        }
        Ok(key)
    }

    /// Parse a space separated key list; an empty list means relevance order
    pub fn parse_list(text: &str) -> Result<Vec<Self>> {
        text.split_whitespace().map(Self::parse).collect()
    }

    /// Same key pointed at another path
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..self.clone()
        }
    }
}

fn parse_flag(flag: &str, name: &str) -> Result<bool> {
    match flag {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(SearchError::QueryParse(format!(
            "Sort key {} flag must be 0 or 1, got '{}'",
            name, other
        ))),
    }
}

impl fmt::Display for SortKey {
    /// Shortest SRU form that parses back to the same key
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = [
            self.path.clone(),
            self.schema.clone().unwrap_or_default(),
            if self.ascending { "1" } else { "0" }.to_string(),
            if self.case_sensitive { "1" } else { "0" }.to_string(),
            self.missing_value.as_str().to_string(),
        ];
        let used = if self.missing_value != MissingValue::HighValue {
            5
        } else if self.case_sensitive {
            4
        } else if !self.ascending {
            3
        } else if self.schema.is_some() {
            2
        } else {
            1
        };
        f.write_str(&parts[..used].join(","))
    }
}

/// Physical field the index engine sorts on
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    pub descending: bool,
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "{} desc", self.field)
        } else {
            write!(f, "{} asc", self.field)
        }
    }
}

/// Translate sort keys into physical sort fields
///
/// When missing values sort high, each field is preceded by its presence
/// flag (`1` present, `0` missing). The flag runs against the key's
/// direction: records without a value come last in ascending order and
/// first in descending order.
pub fn sort_fields(keys: &[SortKey], schema: &FieldSchema) -> Vec<SortField> {
    let mut fields = Vec::new();
    for key in keys {
        for base in schema.resolve_alias(&key.path) {
            if key.missing_value == MissingValue::HighValue {
                fields.push(SortField {
                    field: schema.variant_name(&base, VariantKind::Present),
                    descending: key.ascending,
                });
            }
            fields.push(SortField {
                field: schema.variant_name(&base, VariantKind::Sort),
                descending: !key.ascending,
            });
        }
    }
    fields
}

/// Render logical sort keys as an SRU `sortKeys` value over physical sort
/// fields
pub fn render_sort_keys(keys: &[SortKey], schema: &FieldSchema) -> String {
    keys.iter()
        .flat_map(|key| {
            schema
                .resolve_alias(&key.path)
                .into_iter()
                .map(move |base| key.with_path(schema.variant_name(&base, VariantKind::Sort)))
        })
        .map(|key| key.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchemaConfig;

    #[test]
    fn test_parse_defaults() {
        let key = SortKey::parse("dc.title").unwrap();
        assert_eq!(key, SortKey::new("dc.title"));
        assert!(key.ascending);
        assert!(!key.case_sensitive);
        assert_eq!(key.missing_value, MissingValue::HighValue);
    }

    #[test]
    fn test_parse_full() {
        let key = SortKey::parse("dc.date,marc,0,1,lowValue").unwrap();
        assert_eq!(key.schema.as_deref(), Some("marc"));
        assert!(!key.ascending);
        assert!(key.case_sensitive);
        assert_eq!(key.missing_value, MissingValue::LowValue);

        let key = SortKey::parse("dc.date,,,,1900").unwrap();
        assert_eq!(key.missing_value, MissingValue::Value("1900".to_string()));
    }

    #[test]
    fn test_parse_list() {
        let keys = SortKey::parse_list("title,,0  date").unwrap();
        assert_eq!(keys.len(), 2);
        assert!(!keys[0].ascending);
        assert!(SortKey::parse_list("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert!(SortKey::parse(",marc").is_err());
        assert!(SortKey::parse("title,,yes").is_err());
        assert!(SortKey::parse("a,b,1,1,x,y").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for text in ["title", "title,marc", "title,,0", "title,,1,1", "title,,1,0,omit"] {
            let key = SortKey::parse(text).unwrap();
            assert_eq!(key.to_string(), text);
        }
    }

    /// Orders `(present, value)` rows the way the index engine would
    fn order_rows<'a>(fields: &[SortField], rows: &[(&'a str, &'a str)]) -> Vec<&'a str> {
        let mut rows = rows.to_vec();
        rows.sort_by(|a, b| {
            let mut ordering = std::cmp::Ordering::Equal;
            for (i, field) in fields.iter().enumerate() {
                let (x, y) = if i == 0 { (a.0, b.0) } else { (a.1, b.1) };
                let cmp = if field.descending { y.cmp(x) } else { x.cmp(y) };
                ordering = ordering.then(cmp);
            }
            ordering
        });
        rows.into_iter().map(|(_, value)| value).collect()
    }

    const ROWS: &[(&str, &str)] = &[("0", ""), ("1", "pear"), ("1", "apple")];

    #[test]
    fn test_ascending_key_puts_missing_values_last() {
        let schema = FieldSchema::default();
        let fields = sort_fields(&[SortKey::new("title")], &schema);
        assert_eq!(
            fields,
            vec![
                SortField {
                    field: "title.present".to_string(),
                    descending: true
                },
                SortField {
                    field: "title.sort".to_string(),
                    descending: false
                },
            ]
        );
        assert_eq!(order_rows(&fields, ROWS), vec!["apple", "pear", ""]);
    }

    #[test]
    fn test_descending_key_puts_missing_values_first() {
        let schema = FieldSchema::default();
        let fields = sort_fields(&[SortKey::new("title").descending()], &schema);
        assert_eq!(
            fields,
            vec![
                SortField {
                    field: "title.present".to_string(),
                    descending: false
                },
                SortField {
                    field: "title.sort".to_string(),
                    descending: true
                },
            ]
        );
        assert_eq!(order_rows(&fields, ROWS), vec!["", "pear", "apple"]);
    }

    #[test]
    fn test_sort_fields_without_presence() {
        let schema = FieldSchema::default();
        let key = SortKey::new("title").with_missing_value(MissingValue::LowValue);
        let fields = sort_fields(&[key], &schema);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field, "title.sort");
        assert!(!fields[0].descending);
    }

    #[test]
    fn test_sort_fields_resolve_aliases() {
        let schema = FieldSchema::new(&SchemaConfig::new().synonym("name", ["creator", "contributor"]));
        let fields = sort_fields(&[SortKey::new("name")], &schema);
        let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(
            names,
            vec!["creator.present", "creator.sort", "contributor.present", "contributor.sort"]
        );
    }

    #[test]
    fn test_render_sort_keys() {
        let schema = FieldSchema::default();
        let keys = SortKey::parse_list("title,,0 date").unwrap();
        assert_eq!(render_sort_keys(&keys, &schema), "title.sort,,0 date.sort");
    }
}

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::{Result, SearchError};

const EXACT_SUFFIX_PROPERTY: &str = "exactSuffix";
const PRESENT_SUFFIX_PROPERTY: &str = "isSetSuffix";
const SORT_SUFFIX_PROPERTY: &str = "sortSuffix";
const STEMMED_SUFFIX_PROPERTY: &str = "stemmedSuffix";
const FACET_SUFFIX_PROPERTY: &str = "facetSuffix";
const STORED_SUFFIX_PROPERTY: &str = "storedSuffix";
const FIELD_LISTING_PROPERTY: &str = "fields";
const INDEX_SYNONYM_PREFIX: &str = "indexSynonym.";

/// Suffixes appended to a base field name for each physical representation
///
/// A `None` suffix disables that representation: the variant name collapses
/// to the base field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuffixConfig {
    #[serde(default)]
    pub exact: Option<String>,
    #[serde(default)]
    pub present: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub stemmed: Option<String>,
    #[serde(default)]
    pub facet: Option<String>,
    #[serde(default)]
    pub stored: Option<String>,
}

impl Default for SuffixConfig {
    fn default() -> Self {
        Self {
            exact: Some(".exact".to_string()),
            present: Some(".present".to_string()),
            sort: Some(".sort".to_string()),
            stemmed: Some(".stemmed".to_string()),
            facet: Some(".facet".to_string()),
            stored: Some(".stored".to_string()),
        }
    }
}

impl SuffixConfig {
    /// A configuration with every representation disabled
    pub fn none() -> Self {
        Self {
            exact: None,
            present: None,
            sort: None,
            stemmed: None,
            facet: None,
            stored: None,
        }
    }

    /// Read suffixes from deployment properties; absent keys disable the
    /// corresponding representation.
    pub fn from_properties(props: &HashMap<String, String>) -> Self {
        let get = |key: &str| props.get(key).map(|v| v.trim().to_string());
        Self {
            exact: get(EXACT_SUFFIX_PROPERTY),
            present: get(PRESENT_SUFFIX_PROPERTY),
            sort: get(SORT_SUFFIX_PROPERTY),
            stemmed: get(STEMMED_SUFFIX_PROPERTY),
            facet: get(FACET_SUFFIX_PROPERTY),
            stored: get(STORED_SUFFIX_PROPERTY),
        }
    }
}

fn default_anywhere_aliases() -> Vec<String> {
    vec![
        "cql.anywhere".to_string(),
        "cql.allIndexes".to_string(),
        "cql.anyIndexes".to_string(),
        "cql.serverChoice".to_string(),
    ]
}

/// Field schema configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default)]
    pub suffixes: SuffixConfig,

    /// Enumerated base fields searched by the "anywhere" aliases
    #[serde(default)]
    pub fields: Vec<String>,

    /// Alias -> base fields
    #[serde(default)]
    pub synonyms: BTreeMap<String, Vec<String>>,

    /// Spellings of the reserved alias that expands to every base field
    #[serde(default = "default_anywhere_aliases")]
    pub anywhere_aliases: Vec<String>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            suffixes: SuffixConfig::default(),
            fields: Vec::new(),
            synonyms: BTreeMap::new(),
            anywhere_aliases: default_anywhere_aliases(),
        }
    }
}

impl SchemaConfig {
    /// Create a configuration with the standard suffixes and no fields
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the suffix convention
    pub fn with_suffixes(mut self, suffixes: SuffixConfig) -> Self {
        self.suffixes = suffixes;
        self
    }

    /// Add an enumerated base field
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(name.into());
        self
    }

    /// Map an alias onto one or more base fields
    pub fn synonym<I, S>(mut self, alias: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.synonyms
            .insert(alias.into(), fields.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the reserved "anywhere" alias spellings
    pub fn with_anywhere_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.anywhere_aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// Build a configuration from deployment properties
    pub fn from_properties(props: &HashMap<String, String>) -> Self {
        let fields = props
            .get(FIELD_LISTING_PROPERTY)
            .map(|v| split_field_list(v))
            .unwrap_or_default();

        let synonyms = props
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(INDEX_SYNONYM_PREFIX)
                    .map(|alias| (alias.to_string(), split_field_list(value)))
            })
            .collect();

        Self {
            suffixes: SuffixConfig::from_properties(props),
            fields,
            synonyms,
            anywhere_aliases: default_anywhere_aliases(),
        }
    }

    /// Parse `key=value` properties text
    pub fn from_properties_str(text: &str) -> Self {
        Self::from_properties(&parse_properties(text))
    }

    /// Load a configuration file; `.json` files are read as JSON, anything
    /// else as properties.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Ok(serde_json::from_str(&text)?)
        } else {
            Ok(Self::from_properties_str(&text))
        }
    }
}

/// Split a listed value on an optional comma followed by whitespace
pub(crate) fn split_field_list(value: &str) -> Vec<String> {
    value
        .split_whitespace()
        .map(|part| part.strip_suffix(',').unwrap_or(part))
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Minimal properties reader: `key=value` or `key: value`, `#`/`!` comments
pub fn parse_properties(text: &str) -> HashMap<String, String> {
    let mut props = HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let split_at = line.find(['=', ':']);
        let (key, value) = match split_at {
            Some(idx) => (&line[..idx], &line[idx + 1..]),
            None => (line, ""),
        };
        props.insert(key.trim().to_string(), value.trim().to_string());
    }
    props
}

/// Tokenizer configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenizerConfig {
    pub lowercase: bool,
    pub remove_stopwords: bool,
    pub stem: bool,
    #[serde(default)]
    pub fold_accents: bool,
    pub min_token_length: usize,
    pub max_token_length: usize,
    pub language: String,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            remove_stopwords: false,
            stem: false,
            fold_accents: true,
            min_token_length: 1,
            max_token_length: 255,
            language: "english".to_string(),
        }
    }
}

impl TokenizerConfig {
    /// Settings for `.stemmed` fields: English stopwords and stemming
    pub fn stemming() -> Self {
        Self {
            remove_stopwords: true,
            stem: true,
            ..Default::default()
        }
    }
}

/// Settings for paging through a remote result set
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IteratorConfig {
    pub page_size: usize,
    /// Seconds the server should retain the result set; `None` omits the
    /// parameter from requests.
    pub result_set_ttl: Option<u32>,
    pub version: String,
    pub record_packing: String,
}

impl Default for IteratorConfig {
    fn default() -> Self {
        Self {
            page_size: 25,
            result_set_ttl: Some(15),
            version: "1.1".to_string(),
            record_packing: "xml".to_string(),
        }
    }
}

impl IteratorConfig {
    /// Set the page size
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Set the result set time-to-live
    pub fn with_result_set_ttl(mut self, ttl: Option<u32>) -> Self {
        self.result_set_ttl = ttl;
        self
    }
}

impl std::str::FromStr for SchemaConfig {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim_start();
        if trimmed.starts_with('{') {
            Ok(serde_json::from_str(trimmed)?)
        } else {
            Ok(Self::from_properties_str(s))
        }
    }
}

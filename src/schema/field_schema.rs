//! Logical field aliases and physical variant names
//!
//! Every logical field is stored under several physical names: the base
//! name plus one suffixed variant per representation. `FieldSchema` owns the
//! suffix convention and the alias table. It is immutable once built, so a
//! single value can be shared by the compiler, the expander and the result
//! iterator.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use tracing::{debug, warn};

use crate::config::{SchemaConfig, SuffixConfig};

/// Physical representation of a logical field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantKind {
    /// Untokenized copy for exact matching
    Exact,
    /// `"1"`/`"0"` flag recording whether the field had a value
    Present,
    /// Normalized sort key
    Sort,
    /// Stemmed copy for root-form matching
    Stemmed,
    /// Untokenized stored copy for facet counts
    Facet,
    /// Untokenized stored snapshot for highlighting
    Stored,
}

impl VariantKind {
    /// All kinds, in configuration order
    pub const ALL: [VariantKind; 6] = [
        VariantKind::Exact,
        VariantKind::Present,
        VariantKind::Sort,
        VariantKind::Stemmed,
        VariantKind::Facet,
        VariantKind::Stored,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VariantKind::Exact => "exact",
            VariantKind::Present => "present",
            VariantKind::Sort => "sort",
            VariantKind::Stemmed => "stemmed",
            VariantKind::Facet => "facet",
            VariantKind::Stored => "stored",
        }
    }

    fn configured(self, suffixes: &SuffixConfig) -> Option<&str> {
        let suffix = match self {
            VariantKind::Exact => &suffixes.exact,
            VariantKind::Present => &suffixes.present,
            VariantKind::Sort => &suffixes.sort,
            VariantKind::Stemmed => &suffixes.stemmed,
            VariantKind::Facet => &suffixes.facet,
            VariantKind::Stored => &suffixes.stored,
        };
        suffix.as_deref()
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of field names for a live index
///
/// The discovery constructor scans a catalogue instead of relying on a
/// static field listing.
pub trait FieldCatalog {
    fn field_names(&self) -> Vec<String>;
}

impl<T: AsRef<str>> FieldCatalog for [T] {
    fn field_names(&self) -> Vec<String> {
        self.iter().map(|name| name.as_ref().to_string()).collect()
    }
}

impl<T: AsRef<str>> FieldCatalog for Vec<T> {
    fn field_names(&self) -> Vec<String> {
        self.as_slice().field_names()
    }
}

/// Alias resolver and variant namer
#[derive(Clone, Debug)]
pub struct FieldSchema {
    /// Validated suffixes, one per enabled kind
    suffixes: Vec<(VariantKind, String)>,
    /// Lowercased spellings of the reserved "anywhere" alias
    anywhere_aliases: HashSet<String>,
    /// Base fields an "anywhere" alias expands to
    anywhere_fields: Vec<String>,
    /// Lowercased alias -> base fields
    synonyms: HashMap<String, Vec<String>>,
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self::new(&SchemaConfig::default())
    }
}

impl FieldSchema {
    /// Build a schema whose "anywhere" set is the configured field listing
    pub fn new(config: &SchemaConfig) -> Self {
        let suffixes = validate_suffixes(&config.suffixes);
        let mut schema = Self {
            suffixes,
            anywhere_aliases: config
                .anywhere_aliases
                .iter()
                .map(|alias| alias.to_lowercase())
                .collect(),
            anywhere_fields: Vec::new(),
            synonyms: build_synonyms(config),
        };

        let mut seen = HashSet::new();
        for field in &config.fields {
            if schema.variant_kind(field).is_some() {
                warn!(
                    field = %field,
                    "Configured field carries a variant suffix, excluding it from the anywhere set"
                );
                continue;
            }
            if seen.insert(field.clone()) {
                schema.anywhere_fields.push(field.clone());
            }
        }

        debug!(
            fields = schema.anywhere_fields.len(),
            synonyms = schema.synonyms.len(),
            "Field schema built from static configuration"
        );
        schema
    }

    /// Build a schema whose "anywhere" set is discovered from a live index
    ///
    /// Every discovered name ending in a configured suffix is a derived
    /// variant, not a base field, and is left out.
    pub fn discover<C: FieldCatalog + ?Sized>(config: &SchemaConfig, catalog: &C) -> Self {
        let mut schema = Self::new(&SchemaConfig {
            fields: Vec::new(),
            ..config.clone()
        });

        let discovered: BTreeSet<String> = catalog
            .field_names()
            .into_iter()
            .filter(|name| schema.variant_kind(name).is_none())
            .collect();
        schema.anywhere_fields = discovered.into_iter().collect();

        debug!(
            fields = schema.anywhere_fields.len(),
            "Field schema built from index catalogue"
        );
        schema
    }

    /// Resolve a query-time index name to the base fields it stands for
    ///
    /// Lookup is case-insensitive. A name that is neither a synonym nor a
    /// reserved alias resolves to itself, so the result is never empty.
    pub fn resolve_alias(&self, token: &str) -> Vec<String> {
        let key = token.to_lowercase();
        if let Some(fields) = self.synonyms.get(&key) {
            return fields.clone();
        }
        if self.anywhere_aliases.contains(&key) && !self.anywhere_fields.is_empty() {
            return self.anywhere_fields.clone();
        }
        vec![token.to_string()]
    }

    /// Check if a token is one of the reserved "anywhere" spellings
    pub fn is_anywhere_alias(&self, token: &str) -> bool {
        self.anywhere_aliases.contains(&token.to_lowercase())
    }

    /// Base fields searched by the "anywhere" aliases
    pub fn anywhere_fields(&self) -> &[String] {
        &self.anywhere_fields
    }

    /// Configured suffix for a kind, if that representation is enabled
    pub fn suffix(&self, kind: VariantKind) -> Option<&str> {
        self.suffixes
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, suffix)| suffix.as_str())
    }

    /// Physical name of the `kind` variant of a field
    ///
    /// Any variant suffix already present is replaced, which makes the
    /// operation idempotent. When the kind has no configured suffix the
    /// variant collapses to the base field.
    pub fn variant_name(&self, name: &str, kind: VariantKind) -> String {
        let base = self.strip_variant(name);
        match self.suffix(kind) {
            Some(suffix) => format!("{}{}", base, suffix),
            None => base.to_string(),
        }
    }

    /// Remove at most one variant suffix, preferring the longest match
    pub fn strip_variant<'a>(&self, name: &'a str) -> &'a str {
        match self.matching_suffix(name) {
            Some((_, suffix)) => &name[..name.len() - suffix.len()],
            None => name,
        }
    }

    /// Kind of variant a physical name denotes, if any
    pub fn variant_kind(&self, name: &str) -> Option<VariantKind> {
        self.matching_suffix(name).map(|(kind, _)| kind)
    }

    fn matching_suffix(&self, name: &str) -> Option<(VariantKind, &str)> {
        self.suffixes
            .iter()
            .filter(|(_, suffix)| name.len() > suffix.len() && name.ends_with(suffix.as_str()))
            .max_by_key(|(_, suffix)| suffix.len())
            .map(|(kind, suffix)| (*kind, suffix.as_str()))
    }
}

/// Drop empty and duplicate suffixes, warning about overlaps
fn validate_suffixes(config: &SuffixConfig) -> Vec<(VariantKind, String)> {
    let mut accepted: Vec<(VariantKind, String)> = Vec::new();

    for kind in VariantKind::ALL {
        let suffix = match kind.configured(config) {
            Some(suffix) => suffix,
            None => continue,
        };
        if suffix.is_empty() {
            warn!(kind = %kind, "Empty variant suffix, disabling representation");
            continue;
        }
        if let Some((owner, _)) = accepted.iter().find(|(_, s)| s == suffix) {
            warn!(
                kind = %kind,
                suffix = suffix,
                owner = %owner,
                "Variant suffix already in use, disabling representation"
            );
            continue;
        }
        for (other, existing) in &accepted {
            if existing.ends_with(suffix) || suffix.ends_with(existing.as_str()) {
                warn!(
                    kind = %kind,
                    other = %other,
                    "Variant suffixes overlap, the longest match wins when stripping"
                );
            }
        }
        accepted.push((kind, suffix.to_string()));
    }

    accepted
}

fn build_synonyms(config: &SchemaConfig) -> HashMap<String, Vec<String>> {
    config
        .synonyms
        .iter()
        .filter_map(|(alias, fields)| {
            let mut seen = HashSet::new();
            let fields: Vec<String> = fields
                .iter()
                .filter(|field| seen.insert(field.as_str()))
                .cloned()
                .collect();
            if fields.is_empty() {
                warn!(alias = %alias, "Synonym maps to no fields, ignoring it");
                None
            } else {
                Some((alias.to_lowercase(), fields))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FieldSchema {
        FieldSchema::new(
            &SchemaConfig::new()
                .field("dc.title")
                .field("dc.subject")
                .field("dc.creator")
                .synonym("title", ["dc.title", "dc.alternative"]),
        )
    }

    #[test]
    fn test_unknown_alias_passes_through() {
        assert_eq!(schema().resolve_alias("dc.Date"), vec!["dc.Date"]);
    }

    #[test]
    fn test_synonym_resolution_is_case_insensitive() {
        let schema = schema();
        assert_eq!(
            schema.resolve_alias("TITLE"),
            vec!["dc.title", "dc.alternative"]
        );
    }

    #[test]
    fn test_anywhere_aliases() {
        let schema = schema();
        for alias in ["cql.anywhere", "cql.serverChoice", "CQL.ALLINDEXES", "cql.anyIndexes"] {
            assert_eq!(
                schema.resolve_alias(alias),
                vec!["dc.title", "dc.subject", "dc.creator"],
                "alias {}",
                alias
            );
        }
        assert!(schema.is_anywhere_alias("Cql.Anywhere"));
    }

    #[test]
    fn test_anywhere_without_fields_passes_through() {
        let schema = FieldSchema::default();
        assert_eq!(schema.resolve_alias("cql.anywhere"), vec!["cql.anywhere"]);
    }

    #[test]
    fn test_suffixed_configured_fields_excluded() {
        let schema = FieldSchema::new(&SchemaConfig::new().field("title").field("title.exact"));
        assert_eq!(schema.anywhere_fields(), &["title".to_string()]);
    }

    #[test]
    fn test_variant_names() {
        let schema = FieldSchema::default();
        assert_eq!(schema.variant_name("subject", VariantKind::Exact), "subject.exact");
        assert_eq!(schema.variant_name("subject", VariantKind::Present), "subject.present");
        assert_eq!(schema.variant_name("subject", VariantKind::Stored), "subject.stored");
    }

    #[test]
    fn test_variant_name_is_idempotent() {
        let schema = FieldSchema::default();
        for kind in VariantKind::ALL {
            let once = schema.variant_name("dc.title", kind);
            assert_eq!(schema.variant_name(&once, kind), once);
        }
    }

    #[test]
    fn test_variant_name_replaces_other_suffix() {
        let schema = FieldSchema::default();
        assert_eq!(
            schema.variant_name("subject.exact", VariantKind::Sort),
            "subject.sort"
        );
    }

    #[test]
    fn test_unconfigured_suffix_collapses_to_base() {
        let schema = FieldSchema::new(&SchemaConfig::new().with_suffixes(SuffixConfig {
            stemmed: None,
            ..SuffixConfig::default()
        }));
        assert_eq!(schema.variant_name("subject", VariantKind::Stemmed), "subject");
        assert_eq!(schema.suffix(VariantKind::Stemmed), None);
    }

    #[test]
    fn test_strip_variant() {
        let schema = FieldSchema::default();
        assert_eq!(schema.strip_variant("subject.facet"), "subject");
        assert_eq!(schema.strip_variant("subject"), "subject");
        // a bare suffix is not a variant of anything
        assert_eq!(schema.strip_variant(".exact"), ".exact");
        // at most one suffix
        assert_eq!(schema.strip_variant("a.exact.sort"), "a.exact");
    }

    #[test]
    fn test_strip_prefers_longest_suffix() {
        let schema = FieldSchema::new(&SchemaConfig::new().with_suffixes(SuffixConfig {
            exact: Some("_x".to_string()),
            sort: Some("_sort_x".to_string()),
            ..SuffixConfig::none()
        }));
        assert_eq!(schema.strip_variant("name_sort_x"), "name");
        assert_eq!(schema.variant_kind("name_sort_x"), Some(VariantKind::Sort));
    }

    #[test]
    fn test_invalid_suffixes_are_disabled() {
        let schema = FieldSchema::new(&SchemaConfig::new().with_suffixes(SuffixConfig {
            exact: Some("_x".to_string()),
            facet: Some("_x".to_string()),
            sort: Some(String::new()),
            ..SuffixConfig::none()
        }));
        assert_eq!(schema.suffix(VariantKind::Exact), Some("_x"));
        assert_eq!(schema.suffix(VariantKind::Facet), None);
        assert_eq!(schema.suffix(VariantKind::Sort), None);
    }

    #[test]
    fn test_discovery_excludes_variants() {
        let catalog = vec![
            "title",
            "title.exact",
            "title.facet",
            "subject",
            "subject.sort",
            "subject.present",
            "abstract.stored",
            "abstract",
        ];
        let schema = FieldSchema::discover(&SchemaConfig::default(), &catalog);
        assert_eq!(schema.anywhere_fields(), &["abstract", "subject", "title"]);
        let resolved = schema.resolve_alias("cql.anywhere");
        assert!(resolved.iter().all(|f| schema.variant_kind(f).is_none()));
    }

    #[test]
    fn test_synonym_overrides_reserved_alias() {
        let schema = FieldSchema::new(
            &SchemaConfig::new()
                .field("a")
                .synonym("cql.serverChoice", ["b", "b", "c"]),
        );
        assert_eq!(schema.resolve_alias("cql.serverchoice"), vec!["b", "c"]);
        assert_eq!(schema.resolve_alias("cql.anywhere"), vec!["a"]);
    }
}

//! Catalogue data model: entries, dimension schemes, and the immutable
//! snapshot the ranker operates on.

use regex::Regex;
use serde::Serialize;

use super::index::{EmbeddingIndex, IndexError};

/// How many numeric dimensions an item has and how they combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DimensionScheme {
    /// Single outer dimension (pipes, elbows, bends).
    #[serde(rename = "OD")]
    Od,
    /// Two interchangeable outer dimensions (reducers).
    #[serde(rename = "ODxOD")]
    OdByOd,
    /// Two interchangeable length/width dimensions (sheets).
    #[serde(rename = "LxW")]
    LByW,
    /// Single characteristic dimension.
    #[serde(rename = "CS")]
    Cs,
    /// Single volume-like dimension (tanks).
    #[serde(rename = "VOL")]
    Vol,
    /// Unrecognized tag. The distance sentinel applies.
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl DimensionScheme {
    /// Parse a scheme tag. Never fails: unknown tags map to `Unknown`.
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_uppercase().as_str() {
            "OD" => DimensionScheme::Od,
            "ODXOD" => DimensionScheme::OdByOd,
            "LXW" => DimensionScheme::LByW,
            "CS" => DimensionScheme::Cs,
            "VOL" => DimensionScheme::Vol,
            _ => DimensionScheme::Unknown,
        }
    }
}

/// One purchasable catalogue item, normalized from the product source.
///
/// `dim_a`/`dim_b` are stored in canonical millimetres; `dim_b` is unused
/// for single-dimension schemes.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogueEntry {
    /// Opaque unique id, stable across reloads.
    pub id: String,
    pub sku: String,
    pub name: String,
    pub brand: String,
    pub scheme: DimensionScheme,
    /// Display string for the size, shown to the customer as-is.
    pub size_text: String,
    pub dim_a: f32,
    pub dim_b: f32,
    pub price: f32,
    pub price_unit: String,
}

impl CatalogueEntry {
    /// The text that gets embedded for this entry.
    pub fn embedding_text(&self) -> String {
        [&self.brand, &self.name, &self.size_text]
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A distinct lowercase item-type name with its plural-aware matcher.
#[derive(Debug)]
pub(crate) struct ItemType {
    name: String,
    pattern: Regex,
}

impl ItemType {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Whole-word match against a lowercased query, trailing `s` optional.
    pub(crate) fn matches(&self, query_lower: &str) -> bool {
        self.pattern.is_match(query_lower)
    }
}

/// Immutable view of the loaded catalogue: entries, their embedding matrix
/// (row *i* embeds entry *i*), and the derived item-type set.
///
/// Replaced wholesale on reload, never mutated in place.
#[derive(Debug)]
pub struct CatalogueSnapshot {
    entries: Vec<CatalogueEntry>,
    index: EmbeddingIndex,
    item_types: Vec<ItemType>,
}

impl CatalogueSnapshot {
    /// Build a snapshot from normalized entries and their embeddings.
    ///
    /// The embedding matrix must be parallel to `entries`.
    pub fn new(
        entries: Vec<CatalogueEntry>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<Self, IndexError> {
        if entries.len() != embeddings.len() {
            return Err(IndexError::RowCountMismatch {
                entries: entries.len(),
                rows: embeddings.len(),
            });
        }

        let index = EmbeddingIndex::new(embeddings)?;
        let item_types = derive_item_types(&entries);

        Ok(Self {
            entries,
            index,
            item_types,
        })
    }

    pub fn entries(&self) -> &[CatalogueEntry] {
        &self.entries
    }

    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }

    pub(crate) fn item_types(&self) -> &[ItemType] {
        &self.item_types
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Distinct lowercase entry names, each with a compiled `\b<name>s?\b`
/// pattern so "2 bends" matches an item named "bend".
fn derive_item_types(entries: &[CatalogueEntry]) -> Vec<ItemType> {
    let mut names: Vec<String> = entries
        .iter()
        .map(|e| e.name.trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .collect();
    names.sort();
    names.dedup();

    names
        .into_iter()
        .filter_map(|name| {
            let pattern = format!(r"\b{}s?\b", regex::escape(&name));
            match Regex::new(&pattern) {
                Ok(pattern) => Some(ItemType { name, pattern }),
                Err(err) => {
                    log::warn!("skipping unmatchable item type {name:?}: {err}");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> CatalogueEntry {
        CatalogueEntry {
            id: "e1".into(),
            sku: "SKU1".into(),
            name: name.into(),
            brand: "Acme".into(),
            scheme: DimensionScheme::Od,
            size_text: "110 mm".into(),
            dim_a: 110.0,
            dim_b: 0.0,
            price: 120.0,
            price_unit: "PCS".into(),
        }
    }

    #[test]
    fn test_scheme_parse() {
        assert_eq!(DimensionScheme::parse("OD"), DimensionScheme::Od);
        assert_eq!(DimensionScheme::parse(" odxod "), DimensionScheme::OdByOd);
        assert_eq!(DimensionScheme::parse("LxW"), DimensionScheme::LByW);
        assert_eq!(DimensionScheme::parse("cs"), DimensionScheme::Cs);
        assert_eq!(DimensionScheme::parse("VOL"), DimensionScheme::Vol);
        assert_eq!(DimensionScheme::parse("???"), DimensionScheme::Unknown);
    }

    #[test]
    fn test_embedding_text_skips_blank_fields() {
        let mut e = entry("Elbow");
        e.brand = "  ".into();
        assert_eq!(e.embedding_text(), "Elbow 110 mm");
    }

    #[test]
    fn test_item_types_are_distinct_and_plural_aware() {
        let entries = vec![entry("Bend"), entry("bend"), entry("Elbow")];
        let types = derive_item_types(&entries);

        assert_eq!(types.len(), 2);
        let bend = types.iter().find(|t| t.name() == "bend").unwrap();
        assert!(bend.matches("2 bends please"));
        assert!(bend.matches("one bend"));
        assert!(!bend.matches("bending machine"));
    }

    #[test]
    fn test_snapshot_rejects_mismatched_matrix() {
        let result = CatalogueSnapshot::new(vec![entry("Bend")], vec![]);
        assert!(matches!(result, Err(IndexError::RowCountMismatch { .. })));
    }
}

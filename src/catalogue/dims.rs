//! Dimension parsing and scheme-aware distance.
//!
//! Queries like "110 mm elbow" or "8 x 4 ft sheet" carry numeric evidence
//! about the size the customer wants. This module extracts that evidence and
//! scores how far a catalogue entry's stored dimensions are from it.

use once_cell::sync::Lazy;
use regex::Regex;

use super::entry::{CatalogueEntry, DimensionScheme};

/// Distance returned when an entry and a query are not comparable: no
/// numbers in the query, an unrecognized scheme, or too few numbers for a
/// two-dimension scheme. Combined additively with semantic similarity, so
/// the ranker scales it down rather than treating it as a hard reject.
pub const INCOMPATIBLE_DISTANCE: f32 = 999.0;

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("static regex"));

/// Unit of the numbers found in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Mm,
    Inch,
    Ft,
}

impl Unit {
    /// Convert a value in this unit to millimetres.
    pub fn to_mm(self, value: f32) -> f32 {
        match self {
            Unit::Mm => value,
            Unit::Inch => value * 25.4,
            Unit::Ft => value * 304.8,
        }
    }
}

/// Extract all numeric tokens (left-to-right) and the unit from a query.
///
/// Multiplication glyphs (`×`, `*`) are normalized to `x`. Unit detection is
/// by substring: `"` or `inch` means inches, then `ft`/`feet` overrides.
/// Everything else defaults to millimetres. Empty input yields no numbers.
pub fn parse_query_dims(query: &str) -> (Vec<f32>, Unit) {
    let cleaned = query.to_lowercase().replace(['×', '*'], "x");

    let mut unit = Unit::Mm;
    if cleaned.contains('"') || cleaned.contains("inch") {
        unit = Unit::Inch;
    }
    if cleaned.contains("ft") || cleaned.contains("feet") {
        unit = Unit::Ft;
    }

    let numbers = NUMBER_RE
        .find_iter(&cleaned)
        .filter_map(|m| m.as_str().parse::<f32>().ok())
        .collect();

    (numbers, unit)
}

/// Non-negative incompatibility between an entry and the query numbers.
/// Larger means less compatible. Entry dimensions are already in mm.
pub fn scheme_distance(entry: &CatalogueEntry, numbers: &[f32], unit: Unit) -> f32 {
    if numbers.is_empty() {
        return INCOMPATIBLE_DISTANCE;
    }

    let mm: Vec<f32> = numbers.iter().map(|n| unit.to_mm(*n)).collect();
    let (a, b) = (entry.dim_a, entry.dim_b);

    match entry.scheme {
        DimensionScheme::Od | DimensionScheme::Cs | DimensionScheme::Vol => (a - mm[0]).abs(),
        DimensionScheme::OdByOd | DimensionScheme::LByW if mm.len() >= 2 => {
            // Customers state two dimensions in either order; take the
            // better of the two pairings.
            let direct = (a - mm[0]).abs() + (b - mm[1]).abs();
            let swapped = (a - mm[1]).abs() + (b - mm[0]).abs();
            direct.min(swapped)
        }
        _ => INCOMPATIBLE_DISTANCE,
    }
}

//! Score fusion and ranking.
//!
//! Semantic similarity dominates; the dimension distance only breaks
//! near-ties among semantically similar items (similarity lives in [-1, 1],
//! a typical distance of 0-500 mm contributes 0-5 after scaling).

use std::collections::HashSet;

use crate::embedder::Embedder;

use super::dims::{parse_query_dims, scheme_distance};
use super::entry::{CatalogueEntry, CatalogueSnapshot};
use super::store::CatalogueError;

/// Weight of the dimension distance in the fused score. Keeps the
/// incompatibility sentinel small enough not to overwhelm legitimate
/// semantic differences.
pub const DIM_PENALTY_WEIGHT: f32 = 0.01;

/// Rank catalogue entries against a free-text query.
///
/// Applies the item-type pre-filter, then scores every candidate with
/// `similarity - DIM_PENALTY_WEIGHT * scheme_distance` and returns the top
/// `top_n` in descending order. Ties keep catalogue order. An empty
/// catalogue or candidate set yields an empty list, not an error.
pub fn rank(
    snapshot: &CatalogueSnapshot,
    embedder: &dyn Embedder,
    query: &str,
    top_n: usize,
) -> Result<Vec<CatalogueEntry>, CatalogueError> {
    if snapshot.is_empty() || top_n == 0 {
        return Ok(Vec::new());
    }

    let query_lower = query.to_lowercase();

    let matched_types: HashSet<&str> = snapshot
        .item_types()
        .iter()
        .filter(|t| t.matches(&query_lower))
        .map(|t| t.name())
        .collect();

    let candidates: Vec<usize> = if matched_types.is_empty() {
        (0..snapshot.len()).collect()
    } else {
        snapshot
            .entries()
            .iter()
            .enumerate()
            .filter(|(_, e)| matched_types.contains(e.name.trim().to_lowercase().as_str()))
            .map(|(i, _)| i)
            .collect()
    };
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let (numbers, unit) = parse_query_dims(query);
    let query_embedding = embedder.embed(query)?;
    let similarities = snapshot.index().similarity(&query_embedding, Some(&candidates))?;

    let entries = snapshot.entries();
    let mut scored: Vec<(f32, usize)> = similarities
        .into_iter()
        .map(|(i, sem)| {
            let dist = scheme_distance(&entries[i], &numbers, unit);
            (sem - DIM_PENALTY_WEIGHT * dist, i)
        })
        .collect();

    // stable sort: ties keep catalogue order
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_n);

    Ok(scored.into_iter().map(|(_, i)| entries[i].clone()).collect())
}

//! Catalogue matching engine.
//!
//! Given a free-text customer query, returns the best-matching catalogue
//! entries ranked by a fusion of semantic similarity and a
//! dimension-scheme-aware distance penalty.
//!
//! # Architecture
//!
//! - `entry`: catalogue data model and immutable snapshot
//! - `dims`: dimension parsing and scheme distance
//! - `index`: in-memory embedding matrix with cosine similarity
//! - `store`: load-once snapshot cache over the external product source
//! - `ranker`: score fusion and ranking

pub mod dims;
mod entry;
mod index;
mod ranker;
mod store;

pub use entry::{CatalogueEntry, CatalogueSnapshot, DimensionScheme};
pub use index::{EmbeddingIndex, IndexError};
pub use ranker::{rank, DIM_PENALTY_WEIGHT};
pub use store::{CatalogueError, CatalogueStore, REQUIRED_COLUMNS};

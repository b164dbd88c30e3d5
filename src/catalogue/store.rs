//! Load-once catalogue snapshot cache.
//!
//! The first query triggers a full load: column validation, SKU id
//! back-fill, row normalization, one batch embedding pass. After that the
//! snapshot is reused for the process lifetime unless explicitly reloaded.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use rand::Rng;

use crate::embedder::{Embedder, EmbedderError};
use crate::store::{ProductSource, RawTable, StoreError};

use super::entry::{CatalogueEntry, CatalogueSnapshot, DimensionScheme};
use super::index::IndexError;

/// Columns the product source must provide. Absence of any of these is an
/// operator-side structural problem and fails the load outright.
pub const REQUIRED_COLUMNS: [&str; 11] = [
    "SKU_ID",
    "SKU",
    "ProductName",
    "Brand",
    "DimScheme",
    "SizeText",
    "DimA",
    "DimB",
    "DimUnit",
    "PriceUnit",
    "SellingPrice",
];

const ID_COLUMN: &str = "SKU_ID";

#[derive(Debug, thiserror::Error)]
pub enum CatalogueError {
    /// Structural mismatch in the source. Fatal, not retried.
    #[error("catalogue is missing required columns: {0:?}")]
    MissingColumns(Vec<String>),

    #[error("catalogue row {row}: invalid SellingPrice {value:?}")]
    InvalidPrice { row: usize, value: String },

    #[error("catalogue row {row}: invalid {column} value {value:?}")]
    InvalidDimension {
        row: usize,
        column: String,
        value: String,
    },

    #[error("product source error: {0}")]
    Source(#[from] StoreError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbedderError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Owns the product source and embedder, and caches the live snapshot.
pub struct CatalogueStore {
    source: Box<dyn ProductSource>,
    embedder: Arc<dyn Embedder>,
    snapshot: Mutex<Option<Arc<CatalogueSnapshot>>>,
}

impl CatalogueStore {
    pub fn new(source: Box<dyn ProductSource>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            source,
            embedder,
            snapshot: Mutex::new(None),
        }
    }

    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Return the cached snapshot, loading it first if necessary.
    ///
    /// The single lock acquisition serializes concurrent first queries, so
    /// the expensive embedding pass and the id write-backs run once.
    pub fn ensure_loaded(&self) -> Result<Arc<CatalogueSnapshot>, CatalogueError> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|e| CatalogueError::Internal(format!("lock poisoned: {e}")))?;

        if let Some(snapshot) = guard.as_ref() {
            return Ok(snapshot.clone());
        }

        let snapshot = Arc::new(self.build_snapshot()?);
        *guard = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Rebuild the snapshot from the source unconditionally.
    pub fn reload(&self) -> Result<Arc<CatalogueSnapshot>, CatalogueError> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|e| CatalogueError::Internal(format!("lock poisoned: {e}")))?;

        let snapshot = Arc::new(self.build_snapshot()?);
        *guard = Some(snapshot.clone());
        Ok(snapshot)
    }

    fn build_snapshot(&self) -> Result<CatalogueSnapshot, CatalogueError> {
        log::info!("loading catalogue");
        let table = self.source.load()?;

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !table.has_column(c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(CatalogueError::MissingColumns(missing));
        }

        let ids = self.backfill_ids(&table)?;

        let mut entries = Vec::with_capacity(table.len());
        for row in 0..table.len() {
            entries.push(self.build_entry(&table, row, ids[row].clone())?);
        }

        let texts: Vec<String> = entries.iter().map(|e| e.embedding_text()).collect();
        let embeddings = self.embedder.embed_batch(&texts)?;

        let snapshot = CatalogueSnapshot::new(entries, embeddings)?;
        log::info!("catalogue loaded: {} entries", snapshot.len());
        Ok(snapshot)
    }

    /// Assign fresh unique ids to rows with a blank SKU_ID and persist each
    /// back to the source. Returns the full id column.
    fn backfill_ids(&self, table: &RawTable) -> Result<Vec<String>, CatalogueError> {
        let mut seen: HashSet<String> = (0..table.len())
            .filter_map(|row| table.get(row, ID_COLUMN))
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();

        let mut ids = Vec::with_capacity(table.len());
        for row in 0..table.len() {
            let raw = table.get(row, ID_COLUMN).unwrap_or("").trim().to_string();
            if raw.is_empty() {
                let id = generate_unique_id(&seen);
                log::info!("assigning generated id {id} to catalogue row {row}");
                self.source.write_back(row, ID_COLUMN, &id)?;
                seen.insert(id.clone());
                ids.push(id);
            } else {
                ids.push(raw);
            }
        }
        Ok(ids)
    }

    fn build_entry(
        &self,
        table: &RawTable,
        row: usize,
        id: String,
    ) -> Result<CatalogueEntry, CatalogueError> {
        let cell = |column: &str| table.get(row, column).unwrap_or("").trim().to_string();

        let price_raw = cell("SellingPrice");
        let price: f32 = price_raw
            .parse()
            .map_err(|_| CatalogueError::InvalidPrice {
                row,
                value: price_raw.clone(),
            })?;

        let price_unit = {
            let raw = cell("PriceUnit");
            if raw.is_empty() {
                "PCS".to_string()
            } else {
                raw
            }
        };

        Ok(CatalogueEntry {
            id,
            sku: cell("SKU"),
            name: cell("ProductName"),
            brand: cell("Brand"),
            scheme: DimensionScheme::parse(&cell("DimScheme")),
            size_text: cell("SizeText"),
            dim_a: parse_dim(table, row, "DimA")?,
            dim_b: parse_dim(table, row, "DimB")?,
            price,
            price_unit,
        })
    }
}

/// Blank dimensions coerce to 0.0; anything non-numeric is malformed data.
fn parse_dim(table: &RawTable, row: usize, column: &str) -> Result<f32, CatalogueError> {
    let raw = table.get(row, column).unwrap_or("").trim();
    if raw.is_empty() {
        return Ok(0.0);
    }
    raw.parse().map_err(|_| CatalogueError::InvalidDimension {
        row,
        column: column.to_string(),
        value: raw.to_string(),
    })
}

const ID_LEN: usize = 8;
const HEX: &[u8] = b"0123456789abcdef";

/// 8-char lowercase hex id that does not collide with `existing`.
fn generate_unique_id(existing: &HashSet<String>) -> String {
    let mut rng = rand::rng();
    loop {
        let id: String = (0..ID_LEN)
            .map(|_| HEX[rng.random_range(0..HEX.len())] as char)
            .collect();
        if !existing.contains(&id) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_hex_and_unique() {
        let mut existing = HashSet::new();
        for _ in 0..100 {
            let id = generate_unique_id(&existing);
            assert_eq!(id.len(), 8);
            assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
            assert!(!existing.contains(&id));
            existing.insert(id);
        }
    }

    #[test]
    fn test_parse_dim_blank_is_zero() {
        let table = RawTable::new(
            vec!["DimA".into()],
            vec![vec!["".into()], vec!["110.5".into()], vec!["x".into()]],
        );
        assert_eq!(parse_dim(&table, 0, "DimA").unwrap(), 0.0);
        assert_eq!(parse_dim(&table, 1, "DimA").unwrap(), 110.5);
        assert!(matches!(
            parse_dim(&table, 2, "DimA"),
            Err(CatalogueError::InvalidDimension { .. })
        ));
    }
}

//! In-memory embedding matrix with cosine similarity.
//!
//! Row *i* of the matrix embeds entry *i* of the catalogue snapshot, so the
//! index is positional rather than keyed.

/// Embedding matrix over the catalogue entries.
#[derive(Debug)]
pub struct EmbeddingIndex {
    rows: Vec<Vec<f32>>,
    dimensions: usize,
}

impl EmbeddingIndex {
    /// Build an index from an embedding matrix.
    ///
    /// All rows must share the same dimensionality. An empty matrix is
    /// valid (empty catalogue) and has dimensionality 0.
    pub fn new(rows: Vec<Vec<f32>>) -> Result<Self, IndexError> {
        let dimensions = rows.first().map(|r| r.len()).unwrap_or(0);
        for row in &rows {
            if row.len() != dimensions {
                return Err(IndexError::DimensionMismatch {
                    expected: dimensions,
                    got: row.len(),
                });
            }
        }
        Ok(Self { rows, dimensions })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Cosine similarity of the query against every stored row, or against
    /// the given subset of row indices.
    ///
    /// Returns `(row_index, similarity)` pairs in the order the candidates
    /// were given (catalogue order when `None`). A zero-norm query or row
    /// yields similarity 0.0 rather than dividing by zero.
    pub fn similarity(
        &self,
        query: &[f32],
        candidates: Option<&[usize]>,
    ) -> Result<Vec<(usize, f32)>, IndexError> {
        if query.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                got: query.len(),
            });
        }

        let query_norm = l2_norm(query);

        let score = |i: usize| -> Result<(usize, f32), IndexError> {
            let row = self.rows.get(i).ok_or(IndexError::RowOutOfBounds {
                index: i,
                len: self.rows.len(),
            })?;
            Ok((i, cosine_similarity(query, row, query_norm)))
        };

        match candidates {
            Some(ids) => ids.iter().map(|&i| score(i)).collect(),
            None => (0..self.rows.len()).map(score).collect(),
        }
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn cosine_similarity(query: &[f32], row: &[f32], query_norm: f32) -> f32 {
    let row_norm = l2_norm(row);
    if query_norm < f32::EPSILON || row_norm < f32::EPSILON {
        return 0.0;
    }

    let dot: f32 = query.iter().zip(row.iter()).map(|(a, b)| a * b).sum();
    dot / (query_norm * row_norm)
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("row index {index} out of bounds (len {len})")]
    RowOutOfBounds { index: usize, len: usize },

    #[error("entry/embedding count mismatch: {entries} entries, {rows} rows")]
    RowCountMismatch { entries: usize, rows: usize },
}

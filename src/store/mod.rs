//! External store interfaces: the spreadsheet-like product table and the
//! order log. The core only sees the traits; CSV-file implementations live
//! in `csv.rs`.

pub mod csv;

pub use csv::{CsvOrderStore, CsvProductSource};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("unknown column {0:?}")]
    UnknownColumn(String),

    #[error("row index {index} out of bounds (len {len})")]
    RowOutOfBounds { index: usize, len: usize },
}

/// A header-addressed table of string cells, as loaded from the product
/// source. Cells are accessed by `(row, column name)`; a missing column is
/// distinct from a blank cell.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell value, or `None` if the column does not exist. Rows shorter
    /// than the header yield `""` for their missing cells.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        Some(
            self.rows
                .get(row)
                .and_then(|r| r.get(col))
                .map(|s| s.as_str())
                .unwrap_or(""),
        )
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The external product table.
pub trait ProductSource: Send + Sync {
    fn load(&self) -> Result<RawTable, StoreError>;

    /// Persist a single generated value back into the source, used to
    /// back-fill ids for rows that were missing one.
    fn write_back(&self, row: usize, column: &str, value: &str) -> Result<(), StoreError>;
}

/// Order statuses written to the order store.
pub mod status {
    pub const AWAITING_CONFIRM: &str = "Awaiting Confirm";
    pub const CONFIRMED: &str = "Confirmed";
    pub const AWAITING_UPI_PAYMENT: &str = "Awaiting UPI Payment";
    pub const AWAITING_PAYMENT: &str = "Awaiting Payment";
}

/// One row of the order log.
///
/// `qty: None` means the customer did not state a quantity; it renders as
/// `"?"` rather than a fake count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub timestamp: String,
    pub phone: String,
    pub query: String,
    pub sku_id: String,
    pub qty: Option<u32>,
    pub status: String,
}

impl OrderRecord {
    pub fn qty_display(&self) -> String {
        self.qty
            .map(|q| q.to_string())
            .unwrap_or_else(|| "?".to_string())
    }
}

/// The external order log.
pub trait OrderStore: Send + Sync {
    fn append(&self, record: &OrderRecord) -> Result<(), StoreError>;

    /// Update the status of the first order matching `(phone, sku_id)`.
    /// Returns whether a matching order was found.
    fn find_and_update_status(
        &self,
        phone: &str,
        sku_id: &str,
        new_status: &str,
    ) -> Result<bool, StoreError>;
}

//! CSV-file implementations of the product source and order store.
//!
//! These stand in for the hosted spreadsheet: one file per tab, first row
//! is the header. Rewrites go through a temp file + rename so a crash never
//! leaves a half-written table.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use csv::{ReaderBuilder, WriterBuilder};

use super::{OrderRecord, OrderStore, ProductSource, RawTable, StoreError};

/// Column order of the orders file.
pub const ORDER_HEADERS: [&str; 6] = ["Timestamp", "Phone", "Query", "SKU_ID", "Qty", "Status"];

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

fn read_table(path: &Path) -> Result<RawTable, StoreError> {
    let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }

    Ok(RawTable::new(headers, rows))
}

fn write_table(path: &Path, headers: &[String], rows: &[Vec<String>]) -> Result<(), StoreError> {
    let temp_path = temp_sibling(path);

    {
        let mut writer = WriterBuilder::new().flexible(true).from_path(&temp_path)?;
        writer.write_record(headers)?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush().map_err(StoreError::Io)?;
    }

    std::fs::rename(&temp_path, path)?;
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let counter = TEMP_COUNTER.fetch_add(1, Ordering::SeqCst);
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("table.csv");
    path.with_file_name(format!(
        ".{}-{}-{}.tmp",
        name,
        std::process::id(),
        counter
    ))
}

/// Product catalogue backed by a local CSV file.
pub struct CsvProductSource {
    path: PathBuf,
}

impl CsvProductSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ProductSource for CsvProductSource {
    fn load(&self) -> Result<RawTable, StoreError> {
        read_table(&self.path)
    }

    fn write_back(&self, row: usize, column: &str, value: &str) -> Result<(), StoreError> {
        let table = read_table(&self.path)?;

        let col = table
            .column_index(column)
            .ok_or_else(|| StoreError::UnknownColumn(column.to_string()))?;
        if row >= table.len() {
            return Err(StoreError::RowOutOfBounds {
                index: row,
                len: table.len(),
            });
        }

        let headers = table.headers().to_vec();
        let mut rows: Vec<Vec<String>> = (0..table.len())
            .map(|r| {
                headers
                    .iter()
                    .map(|h| table.get(r, h).unwrap_or("").to_string())
                    .collect()
            })
            .collect();
        rows[row][col] = value.to_string();

        write_table(&self.path, &headers, &rows)
    }
}

/// Order log backed by a local CSV file. Created with a header row on
/// first append.
pub struct CsvOrderStore {
    path: PathBuf,
}

impl CsvOrderStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ensure_header(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            return Ok(());
        }
        let headers: Vec<String> = ORDER_HEADERS.iter().map(|h| h.to_string()).collect();
        write_table(&self.path, &headers, &[])
    }

    fn record_row(record: &OrderRecord) -> Vec<String> {
        vec![
            record.timestamp.clone(),
            record.phone.clone(),
            record.query.clone(),
            record.sku_id.clone(),
            record.qty_display(),
            record.status.clone(),
        ]
    }
}

impl OrderStore for CsvOrderStore {
    fn append(&self, record: &OrderRecord) -> Result<(), StoreError> {
        self.ensure_header()?;

        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(Self::record_row(record))?;
        writer.flush().map_err(StoreError::Io)?;
        Ok(())
    }

    fn find_and_update_status(
        &self,
        phone: &str,
        sku_id: &str,
        new_status: &str,
    ) -> Result<bool, StoreError> {
        if !self.path.exists() {
            return Ok(false);
        }

        let table = read_table(&self.path)?;
        let phone_col = table
            .column_index("Phone")
            .ok_or_else(|| StoreError::UnknownColumn("Phone".to_string()))?;
        let sku_col = table
            .column_index("SKU_ID")
            .ok_or_else(|| StoreError::UnknownColumn("SKU_ID".to_string()))?;
        let status_col = table
            .column_index("Status")
            .ok_or_else(|| StoreError::UnknownColumn("Status".to_string()))?;

        let headers = table.headers().to_vec();
        let mut rows: Vec<Vec<String>> = (0..table.len())
            .map(|r| {
                headers
                    .iter()
                    .map(|h| table.get(r, h).unwrap_or("").to_string())
                    .collect()
            })
            .collect();

        // first matching row wins
        let hit = rows
            .iter()
            .position(|row| row.get(phone_col).map(|s| s.as_str()) == Some(phone)
                && row.get(sku_col).map(|s| s.as_str()) == Some(sku_id));

        match hit {
            Some(r) => {
                rows[r][status_col] = new_status.to_string();
                write_table(&self.path, &headers, &rows)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

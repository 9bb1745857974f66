use csv::ReaderBuilder;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// error types for tabular input; a missing required column is structural
/// misuse and fails the whole call, unlike per-row problems which the
/// adapters absorb
#[derive(Debug, Error)]
pub enum TableError {
    #[error("File '{0}' does not exist")]
    FileNotFound(String),
    #[error("Failed to read delimited file: {0}")]
    Csv(#[from] csv::Error),
    #[error("Required column '{column}' not found; available columns: {available:?}")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },
}

/// One fully-loaded delimited table: header row plus string cells. All
/// inputs are experimental exports small enough to read in full before
/// processing, so there is no streaming path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Reads a delimited file with a header row. The delimiter is a single
    /// byte (`b','` for csv exports, `b'\t'` for the tab-separated reports
    /// some tools produce).
    pub fn from_delimited_file<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Self, TableError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TableError::FileNotFound(path.display().to_string()));
        }
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .has_headers(true)
            .from_path(path)?;
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|cell| cell.to_string()).collect());
        }
        info!(
            "loaded {} rows x {} columns from '{}'",
            rows.len(),
            headers.len(),
            path.display()
        );
        Ok(RawTable { headers, rows })
    }

    /// In-memory construction, mostly for tests and example pipelines.
    pub fn from_rows(headers: Vec<&str>, rows: Vec<Vec<&str>>) -> Self {
        RawTable {
            headers: headers.into_iter().map(|h| h.to_string()).collect(),
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|cell| cell.to_string()).collect())
                .collect(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Result<usize, TableError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| TableError::MissingColumn {
                column: name.to_string(),
                available: self.headers.clone(),
            })
    }

    pub fn require_columns(&self, names: &[&str]) -> Result<Vec<usize>, TableError> {
        names.iter().map(|name| self.column_index(name)).collect()
    }

    /// Cell accessor tolerant of short rows; absent cells read as "".
    pub fn value(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(|s| s.as_str())
            .unwrap_or("")
    }
}

/// Thin handle bundling a file path with its delimiter, for callers that
/// load the same export repeatedly.
pub struct TableSource {
    pub file_name: String,
    pub delimiter: u8,
}

impl TableSource {
    pub fn new(file_name: String, delimiter: u8) -> Self {
        TableSource {
            file_name,
            delimiter,
        }
    }
    pub fn load(&self) -> Result<RawTable, TableError> {
        RawTable::from_delimited_file(&self.file_name, self.delimiter)
    }
}

//! CSV reading for source extracts.
//!
//! Extracts are semicolon-separated with one header row. Rows are kept as
//! header-addressed string cells; all typing happens later in
//! normalization, which also decides what a missing column means.

use std::collections::HashMap;
use std::path::Path;

use super::IngestError;

/// Default cell separator in both source extracts.
pub const DEFAULT_DELIMITER: u8 = b';';

/// One data row addressed by header name.
#[derive(Debug, Clone)]
pub struct SourceRow {
    /// Zero-based position among the file's data rows.
    pub index: usize,
    fields: HashMap<String, String>,
}

impl SourceRow {
    /// Build a row from (column, cell) pairs, for sources that are not
    /// file-backed.
    pub fn from_pairs(index: usize, pairs: &[(&str, &str)]) -> Self {
        let fields = pairs
            .iter()
            .map(|(column, cell)| (column.to_string(), cell.to_string()))
            .collect();
        Self { index, fields }
    }

    /// Raw cell under `column`, `None` when the row has no such cell.
    ///
    /// A short row can lack cells for trailing columns even though the
    /// file-level header declares them.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }
}

/// A parsed extract: the declared columns plus every data row.
#[derive(Debug, Clone)]
pub struct SourceTable {
    columns: Vec<String>,
    pub rows: Vec<SourceRow>,
}

impl SourceTable {
    pub fn new(columns: Vec<String>, rows: Vec<SourceRow>) -> Self {
        Self { columns, rows }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Read a source extract from disk.
///
/// Ragged rows are tolerated: extra cells are dropped, missing trailing
/// cells simply leave those columns unset for the row.
pub fn read_table(path: &Path, delimiter: u8) -> Result<SourceTable, IngestError> {
    let display_path = path.display().to_string();

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .map_err(|source| IngestError::Open {
            path: display_path.clone(),
            source,
        })?;

    let columns: Vec<String> = reader
        .headers()
        .map_err(|source| IngestError::Parse {
            path: display_path.clone(),
            source,
        })?
        .iter()
        .map(str::to_string)
        .collect();

    if columns.is_empty() {
        return Err(IngestError::MissingHeader { path: display_path });
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|source| IngestError::Parse {
            path: display_path.clone(),
            source,
        })?;
        let fields = columns
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        rows.push(SourceRow { index, fields });
    }

    tracing::debug!(
        file = %display_path,
        columns = columns.len(),
        rows = rows.len(),
        "Source extract loaded"
    );

    Ok(SourceTable { columns, rows })
}

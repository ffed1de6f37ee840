//! Row-level ingestion: header resolution, per-row validation, CSV decoding.

use csv::ReaderBuilder;
use tracing::debug;

use demandiq_core::{ColumnLayout, InventoryRecord};

use crate::dataset::Dataset;
use crate::error::IngestError;

/// Rows as handed over by a generated source, plus the header naming their columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }
}

/// Validate a raw table into a dataset. Fails on the first invalid row.
pub fn ingest(table: &RawTable) -> Result<Dataset, IngestError> {
    if table.headers.is_empty() {
        return Err(IngestError::MissingHeader);
    }
    let layout = ColumnLayout::from_headers(&table.headers).map_err(IngestError::Header)?;

    let records = table
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            InventoryRecord::from_row(&layout, row)
                .map_err(|source| IngestError::Record { row: idx + 1, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Dataset::from_validated(records))
}

/// Decode and validate an inventory CSV file (UTF-8, header row first).
///
/// Required columns are located by name; extra columns are ignored. A file with
/// a header and no data rows yields an empty record set.
pub fn read_records(bytes: &[u8]) -> Result<Vec<InventoryRecord>, IngestError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = rdr.headers()?.clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(IngestError::MissingHeader);
    }
    let header_cells: Vec<&str> = headers.iter().collect();
    let layout = ColumnLayout::from_headers(&header_cells).map_err(IngestError::Header)?;

    let mut records = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let row = result?;
        let cells: Vec<&str> = row.iter().collect();
        let record = InventoryRecord::from_row(&layout, &cells)
            .map_err(|source| IngestError::Record { row: idx + 1, source })?;
        records.push(record);
    }

    debug!(records = records.len(), "decoded inventory csv");
    Ok(records)
}

/// [`read_records`] followed by summarization.
pub fn read_csv(bytes: &[u8]) -> Result<Dataset, IngestError> {
    read_records(bytes).map(Dataset::from_validated)
}

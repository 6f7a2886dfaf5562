use std::collections::BTreeSet;
use std::error::Error;
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::controller::ListController;
use crate::domain::series::{Document, FIELD_NAMES, NUMERIC_FIELDS, STATUS};
use crate::domain::status::WatchStatus;
use crate::store::{DocumentStore, StoreError};

pub const DEFAULT_EXPORT_FILE_NAME: &str = "series_data.csv";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImportSummary {
    pub status: String,
    pub rows_read: u64,
    pub created: u64,
    pub skipped: u64,
    pub failed_row: Option<u64>,
    pub last_error: Option<String>,
}

impl ImportSummary {
    fn new() -> Self {
        Self {
            status: "completed".to_string(),
            rows_read: 0,
            created: 0,
            skipped: 0,
            failed_row: None,
            last_error: None,
        }
    }

    pub fn stopped(&self) -> bool {
        self.failed_row.is_some()
    }

    fn stop(&mut self, row: u64, message: String) {
        error!(row, error = %message, "import stopped");
        self.status = "stopped".to_string();
        self.failed_row = Some(row);
        self.last_error = Some(message);
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExportSummary {
    pub rows: u64,
    pub columns: Vec<String>,
}

/// Creates one document per CSV row, strictly in file order, waiting for
/// each create before the next. The first failing row ends the import; rows
/// created before it stay. The visible list is fetched once at the end.
pub fn import_csv<S, R>(controller: &mut ListController<S>, input: R) -> ImportSummary
where
    S: DocumentStore,
    R: Read,
{
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(input);
    let mut summary = ImportSummary::new();

    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(err) => {
            summary.stop(1, format!("unreadable header row: {}", err));
            controller.refresh();
            return summary;
        }
    };

    for (index, row) in reader.records().enumerate() {
        // header is line 1
        let line = index as u64 + 2;
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                summary.stop(line, format!("malformed CSV: {}", err));
                break;
            }
        };
        summary.rows_read += 1;

        let document = row_to_document(&headers, &row);
        if document.is_empty() {
            summary.skipped += 1;
            continue;
        }

        match controller.store().create(&document) {
            Ok(id) => {
                summary.created += 1;
                info!(row = line, id = %id, "imported series");
            }
            Err(err) => {
                summary.stop(line, err.to_string());
                break;
            }
        }
    }

    info!(
        created = summary.created,
        skipped = summary.skipped,
        stopped = summary.stopped(),
        "import finished"
    );
    controller.refresh();
    summary
}

/// Writes the full, unfiltered collection in store order. Identifiers are
/// never written. Cells are plain text, so an extra column holding a
/// non-string value comes back as a string on import.
pub fn export_csv<S, W>(store: &S, output: W) -> Result<ExportSummary, TransferError>
where
    S: DocumentStore,
    W: Write,
{
    let documents = store.query(None).inspect_err(|err| {
        error!(operation = "query", error = %err, "store call failed");
    })?;
    let data: Vec<&Document> = documents.iter().map(|doc| &doc.data).collect();
    let columns = export_columns(&data);

    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(&columns)?;
    for document in &data {
        let cells: Vec<String> = columns
            .iter()
            .map(|column| cell_text(document.get(column.as_str())))
            .collect();
        writer.write_record(&cells)?;
    }
    writer.flush()?;

    info!(rows = data.len(), "exported series");
    Ok(ExportSummary {
        rows: data.len() as u64,
        columns,
    })
}

/// Known fields first in their canonical order, then any extra document
/// keys alphabetically.
fn export_columns(documents: &[&Document]) -> Vec<String> {
    let extras: BTreeSet<&str> = documents
        .iter()
        .flat_map(|doc| doc.keys())
        .map(String::as_str)
        .filter(|key| *key != "id" && !FIELD_NAMES.iter().any(|field| field == key))
        .collect();
    FIELD_NAMES
        .iter()
        .map(|field| field.to_string())
        .chain(extras.into_iter().map(str::to_string))
        .collect()
}

fn row_to_document(headers: &csv::StringRecord, row: &csv::StringRecord) -> Document {
    let mut document = Document::new();
    for (column, cell) in headers.iter().zip(row.iter()) {
        if column.is_empty() || cell.is_empty() {
            continue;
        }
        if column == "id" {
            warn!("ignoring id column in imported row");
            continue;
        }
        let value = if NUMERIC_FIELDS.iter().any(|field| *field == column) {
            cell.trim()
                .parse::<u64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::from(cell))
        } else if column == STATUS {
            Value::from(status_cell(cell).as_str())
        } else {
            Value::from(cell)
        };
        document.insert(column.to_string(), value);
    }
    document
}

/// Status cells are stored under their canonical name so the store's
/// equality filter finds every record that reads as that status.
fn status_cell(cell: &str) -> WatchStatus {
    WatchStatus::from_str(cell).unwrap_or_else(|err| {
        warn!(value = cell, error = %err, "unknown status in imported row");
        WatchStatus::default()
    })
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(other) => other.to_string(),
    }
}

#[derive(Debug)]
pub enum TransferError {
    Io(std::io::Error),
    Csv(csv::Error),
    Store(StoreError),
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::Io(err) => write!(f, "I/O error: {}", err),
            TransferError::Csv(err) => write!(f, "CSV error: {}", err),
            TransferError::Store(err) => write!(f, "{}", err),
        }
    }
}

impl Error for TransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TransferError::Io(err) => Some(err),
            TransferError::Csv(err) => Some(err),
            TransferError::Store(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for TransferError {
    fn from(value: std::io::Error) -> Self {
        TransferError::Io(value)
    }
}

impl From<csv::Error> for TransferError {
    fn from(value: csv::Error) -> Self {
        TransferError::Csv(value)
    }
}

impl From<StoreError> for TransferError {
    fn from(value: StoreError) -> Self {
        TransferError::Store(value)
    }
}

#[cfg(test)]
mod tests;

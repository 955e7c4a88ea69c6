//! The run-details CSV: one row per extracted test execution.

use std::path::Path;

use tracing::{debug, warn};

use super::{column_index, TableError};
use crate::config::ColumnConfig;
use crate::summary::RawRecord;

fn csv_err(path: &Path) -> impl FnOnce(csv::Error) -> TableError + '_ {
    move |source| TableError::Csv {
        path: path.display().to_string(),
        source,
    }
}

fn cell(row: &csv::StringRecord, index: Option<usize>) -> Option<String> {
    index
        .and_then(|i| row.get(i))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Read run records from a CSV with a header row.
///
/// Name, start and end columns must exist; status and report are optional.
/// Rows that cannot be decoded are skipped with a warning.
pub fn read_records(path: &Path, columns: &ColumnConfig) -> Result<Vec<RawRecord>, TableError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_err(path))?;

    let headers = reader.headers().map_err(csv_err(path))?.clone();
    let require = |column: &str| {
        column_index(&headers, column).ok_or_else(|| TableError::MissingColumn {
            column: column.to_string(),
            path: path.display().to_string(),
        })
    };
    let name_idx = require(&columns.name)?;
    let start_idx = require(&columns.start)?;
    let end_idx = require(&columns.end)?;
    let status_idx = column_index(&headers, &columns.status);
    let report_idx = column_index(&headers, &columns.report);

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!(path = %path.display(), row = line + 1, error = %e, "skipping unreadable row");
                continue;
            }
        };

        records.push(RawRecord {
            test_name: cell(&row, Some(name_idx)).unwrap_or_default(),
            status: cell(&row, status_idx).unwrap_or_default(),
            start_time: cell(&row, Some(start_idx)),
            end_time: cell(&row, Some(end_idx)),
            step_timestamps: Vec::new(),
            source: cell(&row, report_idx),
        });
    }

    debug!(path = %path.display(), records = records.len(), "read run details");
    Ok(records)
}

/// Write run records, rendering the effective end time (explicit or derived
/// from the last step) so the file stands on its own.
pub fn write_records(path: &Path, records: &[RawRecord], columns: &ColumnConfig) -> Result<(), TableError> {
    let mut writer = csv::Writer::from_path(path).map_err(csv_err(path))?;

    writer
        .write_record([
            columns.report.as_str(),
            columns.name.as_str(),
            columns.status.as_str(),
            columns.start.as_str(),
            columns.end.as_str(),
        ])
        .map_err(csv_err(path))?;

    for record in records {
        let end = record.effective_end_time().unwrap_or_default();
        writer
            .write_record([
                record.source.as_deref().unwrap_or(""),
                record.test_name.as_str(),
                record.status.as_str(),
                record.start_time.as_deref().unwrap_or(""),
                end.as_str(),
            ])
            .map_err(csv_err(path))?;
    }

    writer.flush().map_err(|source| TableError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(())
}

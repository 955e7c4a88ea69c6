//! CSV input and output for run details and summaries.

pub mod output;
pub mod records;

use thiserror::Error;

pub use output::{write_stats, write_status_counts, write_wide};
pub use records::{read_records, write_records};

#[derive(Debug, Error)]
pub enum TableError {
    #[error("column '{column}' not found in {path}")]
    MissingColumn { column: String, path: String },

    #[error("csv error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Index of `name` in a header row, compared after trimming.
pub(crate) fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name.trim())
}

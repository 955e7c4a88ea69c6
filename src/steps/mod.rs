//! Split pipe-delimited design steps into description and expected columns.
//!
//! A cell such as `Step-1|Open app|App opens|Step-2|Login|Dashboard` becomes
//! `Step-1: Open app\nStep-2: Login` and `Step-1: App opens\nStep-2: Dashboard`.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::StepsConfig;

#[derive(Debug, Error)]
pub enum StepsError {
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

/// The two derived columns for one cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepColumns {
    pub description: String,
    pub expected: String,
}

impl StepColumns {
    pub fn is_empty(&self) -> bool {
        self.description.is_empty() && self.expected.is_empty()
    }
}

/// How [`split_table`] shapes its output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SplitMode {
    /// Keep every row and add (or fill) the two step columns.
    #[default]
    PerRow,
    /// Fold the steps of every row into a single two-column row.
    Consolidate,
}

/// Header lines look like `Step No | Description | Expected Result`.
fn is_header(parts: &[&str]) -> bool {
    parts.len() >= 3 && parts[1].contains("Description") && parts[2].contains("Expected")
}

/// Walk `step|description|expected` triplets on one line.
fn split_line(line: &str, description: &mut Vec<String>, expected: &mut Vec<String>) {
    let line = line.trim().trim_matches('|');
    if line.is_empty() || line.contains("Step No") {
        return;
    }

    let parts: Vec<&str> = line.split('|').collect();
    if is_header(&parts) {
        return;
    }

    for triple in parts.chunks_exact(3) {
        if !triple[0].contains("Step") {
            continue;
        }
        let step = triple[0].trim();
        description.push(format!("{step}: {}", triple[1].trim()));
        expected.push(format!("{step}: {}", triple[2].trim()));
    }
}

/// Split one cell. Multi-line cells are split line by line.
pub fn split_cell(text: &str) -> StepColumns {
    let mut description = Vec::new();
    let mut expected = Vec::new();

    for line in text.lines() {
        split_line(line, &mut description, &mut expected);
    }

    StepColumns {
        description: description.join("\n"),
        expected: expected.join("\n"),
    }
}

/// Rewrite the CSV at `input` into `output` with the step columns filled in.
///
/// Returns the number of rows that received step text.
pub fn split_table(input: &Path, output: &Path, config: &StepsConfig, mode: SplitMode) -> Result<usize, StepsError> {
    let csv_err = |path: &Path| {
        let path = path.display().to_string();
        move |source| StepsError::Csv { path, source }
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(input)
        .map_err(csv_err(input))?;
    let headers = reader.headers().map_err(csv_err(input))?.clone();

    let find = |name: &str| headers.iter().position(|h| h.trim() == name);
    let input_idx = find(&config.input_column).ok_or_else(|| StepsError::MissingColumn {
        column: config.input_column.clone(),
        path: input.display().to_string(),
    })?;

    let mut rows = Vec::new();
    for row in reader.records() {
        rows.push(row.map_err(csv_err(input))?);
    }

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(output)
        .map_err(csv_err(output))?;
    let mut filled = 0;

    match mode {
        SplitMode::PerRow => {
            let mut out_headers: Vec<String> = headers.iter().map(str::to_string).collect();
            let mut column_for = |name: &str| match find(name) {
                Some(i) => i,
                None => {
                    out_headers.push(name.to_string());
                    out_headers.len() - 1
                }
            };
            let desc_idx = column_for(&config.description_column);
            let exp_idx = column_for(&config.expected_column);
            writer.write_record(&out_headers).map_err(csv_err(output))?;

            for row in &rows {
                let mut cells: Vec<String> = row.iter().map(str::to_string).collect();
                cells.resize(out_headers.len().max(cells.len()), String::new());

                let split = split_cell(row.get(input_idx).unwrap_or(""));
                if !split.is_empty() {
                    filled += 1;
                }
                // Only fill cells that are still empty.
                if cells[desc_idx].trim().is_empty() {
                    cells[desc_idx] = split.description;
                }
                if cells[exp_idx].trim().is_empty() {
                    cells[exp_idx] = split.expected;
                }
                writer.write_record(&cells).map_err(csv_err(output))?;
            }
        }
        SplitMode::Consolidate => {
            let mut description = Vec::new();
            let mut expected = Vec::new();
            for row in &rows {
                let split = split_cell(row.get(input_idx).unwrap_or(""));
                if split.is_empty() {
                    continue;
                }
                filled += 1;
                description.push(split.description);
                expected.push(split.expected);
            }
            writer
                .write_record([config.description_column.as_str(), config.expected_column.as_str()])
                .map_err(csv_err(output))?;
            writer
                .write_record([description.join("\n"), expected.join("\n")])
                .map_err(csv_err(output))?;
        }
    }

    writer.flush().map_err(|source| StepsError::Io {
        path: output.display().to_string(),
        source,
    })?;

    debug!(?mode, rows = rows.len(), "split step table");
    info!(input = %input.display(), output = %output.display(), filled, "wrote step columns");
    Ok(filled)
}
